use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

use crate::models::{Contact, Info};

const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Static settings for one build of the combined API description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub info: Info,
    pub host: String,
    pub schemes: Vec<String>,
    pub path_prefix: String,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    /// Root directory scanned for `*.swagger.json` fragments
    pub fragments_dir: PathBuf,
    /// Where the merged document is written
    pub output: PathBuf,
    pub inject_authorization: bool,
    pub render: Option<RenderConfig>,
}

/// External HTML renderer invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub program: String,
    /// Arguments placed before the input file and target directory
    pub args: Vec<String>,
    pub target_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            program: "bootprint".to_string(),
            args: vec!["openapi".to_string()],
            target_dir: PathBuf::from("./protobufs/gen/swagger-ui"),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            info: Info {
                title: "Centrifuge OS Node API".to_string(),
                version: "0.0.5".to_string(),
                description: Some("\n".to_string()),
                contact: Some(Contact {
                    name: Some("Centrifuge".to_string()),
                    url: Some("https://github.com/centrifuge/go-centrifuge".to_string()),
                    email: Some("hello@centrifuge.io".to_string()),
                }),
            },
            host: "localhost:8082".to_string(),
            schemes: vec!["http".to_string()],
            path_prefix: "/".to_string(),
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
            fragments_dir: PathBuf::from("./protobufs/gen/swagger"),
            output: PathBuf::from("./protobufs/gen/swagger.json"),
            inject_authorization: true,
            render: None,
        }
    }
}

impl BuildConfig {
    /// Load a config file, YAML or JSON by extension, on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Check the settings before any work is done
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.info.title.trim().is_empty() {
            return Err(ConfigError::Invalid("API title must not be empty".to_string()));
        }
        if self.info.version.trim().is_empty() {
            return Err(ConfigError::Invalid("API version must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.schemes.is_empty() {
            return Err(ConfigError::Invalid("at least one scheme is required".to_string()));
        }
        if let Some(scheme) = self
            .schemes
            .iter()
            .find(|s| !SUPPORTED_SCHEMES.contains(&s.as_str()))
        {
            return Err(ConfigError::Invalid(format!("unsupported scheme: {}", scheme)));
        }
        if !self.path_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "path prefix must start with '/': {}",
                self.path_prefix
            )));
        }
        if let Some(url) = self.info.contact.as_ref().and_then(|c| c.url.as_deref()) {
            Url::parse(url)
                .map_err(|e| ConfigError::Invalid(format!("contact url {}: {}", url, e)))?;
        }
        if let Some(render) = &self.render {
            if render.program.trim().is_empty() {
                return Err(ConfigError::Invalid("renderer program must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
