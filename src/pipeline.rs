use log::{info, warn};
use std::path::PathBuf;
use thiserror::Error;

use crate::{
    augment::add_authorization_header,
    config::{BuildConfig, ConfigError},
    discovery::{discover_fragments, DiscoveryError},
    loader::{load_merge_inputs, LoadError},
    merge::{DocumentMerger, MergeError, MergeOptions, MergeWarning},
    models::FragmentDocument,
    publish::{write_document, PublishError, RenderError, Renderer},
};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filesystem(#[from] DiscoveryError),

    #[error(transparent)]
    Parse(#[from] LoadError),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Rendering {output:?} failed: {source}")]
    Render {
        output: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub fragments: Vec<PathBuf>,
    pub operations: usize,
    pub warnings: Vec<MergeWarning>,
    pub output: PathBuf,
    pub rendered_to: Option<PathBuf>,
}

impl From<&BuildConfig> for MergeOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            info: config.info.clone(),
            path_prefix: config.path_prefix.clone(),
            host: config.host.clone(),
            schemes: config.schemes.clone(),
        }
    }
}

/// Discover, load, merge, augment and write the combined API description.
///
/// Each stage completes before the next one starts and the first error ends
/// the run. Nothing is written unless the merge succeeds; a renderer failure
/// leaves the written document in place.
pub fn run(
    config: &BuildConfig,
    merger: &dyn DocumentMerger,
    renderer: Option<&dyn Renderer>,
) -> Result<BuildReport, BuildError> {
    config.validate()?;

    let fragments = discover_fragments(&config.fragments_dir)?;
    info!(
        "Found {} fragments under {:?}",
        fragments.len(),
        config.fragments_dir
    );

    let stub = FragmentDocument::default_stub(&config.consumes, &config.produces);
    let documents = load_merge_inputs(stub, &fragments)?;

    let outcome = merger.merge(&documents, &MergeOptions::from(config))?;
    for warning in &outcome.warnings {
        warn!("{} ({})", warning, document_origin(warning, &fragments));
    }
    let mut document = outcome.document;

    if config.inject_authorization {
        let touched = add_authorization_header(&mut document);
        info!("Added authorization header to {} operations", touched);
    }

    write_document(&document, &config.output)?;

    let rendered_to = match (renderer, &config.render) {
        (Some(renderer), Some(render)) => {
            info!("Rendering HTML documentation into {:?}", render.target_dir);
            renderer
                .render(&config.output, &render.target_dir)
                .map_err(|source| BuildError::Render {
                    output: config.output.clone(),
                    source,
                })?;
            Some(render.target_dir.clone())
        }
        (None, Some(render)) => {
            warn!(
                "Rendering into {:?} is configured but no renderer was given, skipping",
                render.target_dir
            );
            None
        }
        _ => None,
    };

    Ok(BuildReport {
        fragments,
        operations: document.operation_count(),
        warnings: outcome.warnings,
        output: config.output.clone(),
        rendered_to,
    })
}

// Document #0 is the default stub, the rest follow discovery order
fn document_origin(warning: &MergeWarning, fragments: &[PathBuf]) -> String {
    let index = match warning {
        MergeWarning::OperationOverridden { document, .. } => *document,
        MergeWarning::ComponentOverridden { document, .. } => *document,
    };
    match index {
        0 => "default stub".to_string(),
        n => fragments
            .get(n - 1)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("document #{}", n)),
    }
}
