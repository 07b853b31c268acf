use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use std::path::PathBuf;

use swagger_gather::{
    config::{BuildConfig, RenderConfig},
    discovery::discover_fragments,
    merge::SwaggerMerger,
    pipeline,
    publish::{CommandRenderer, Renderer},
};

/// Merge per-service Swagger fragments into one API description
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML or JSON file overriding the built-in settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge all fragments and write the combined document
    Build {
        /// Directory scanned for *.swagger.json fragments
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Path of the combined document
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not add the authorization header to operations
        #[arg(long = "no-auth")]
        no_auth: bool,

        /// Render HTML documentation from the combined document
        #[arg(long)]
        render: bool,

        /// Target directory for the rendered HTML (implies --render)
        #[arg(long = "render-dir")]
        render_dir: Option<PathBuf>,
    },

    /// List discovered fragments in merge order
    List {
        /// Directory scanned for *.swagger.json fragments
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = Env::default().filter_or("RUST_LOG", if cli.verbose { "debug" } else { "info" });
    env_logger::init_from_env(env);

    let mut config = match &cli.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };

    match cli.command {
        Commands::Build {
            dir,
            output,
            no_auth,
            render,
            render_dir,
        } => {
            if let Some(dir) = dir {
                config.fragments_dir = dir;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if no_auth {
                config.inject_authorization = false;
            }
            if render || render_dir.is_some() {
                let render_config = config.render.get_or_insert_with(RenderConfig::default);
                if let Some(target) = render_dir {
                    render_config.target_dir = target;
                }
            }
            debug!("Build configuration: {:?}", config);

            let renderer = config.render.as_ref().map(CommandRenderer::from);
            let report = pipeline::run(
                &config,
                &SwaggerMerger,
                renderer.as_ref().map(|r| r as &dyn Renderer),
            )
            .context("Failed to build the combined API description")?;

            info!(
                "Merged {} fragments, {} operations, {} warnings",
                report.fragments.len(),
                report.operations,
                report.warnings.len()
            );
            match &report.rendered_to {
                Some(target) => println!("Documentation generated at {}", target.display()),
                None => println!("API description written to {}", report.output.display()),
            }
        }
        Commands::List { dir } => {
            let root = dir.unwrap_or(config.fragments_dir);
            for path in discover_fragments(&root)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
