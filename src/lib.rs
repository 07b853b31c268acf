pub mod augment;
pub mod config;
pub mod discovery;
pub mod loader;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod publish;
