use log::{debug, info};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};
use thiserror::Error;

use crate::config::RenderConfig;
use crate::models::MergedDocument;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to serialize merged document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer '{0}' was not found")]
    NotFound(String),

    #[error("Failed to run renderer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer '{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Serialize the merged document and replace the file at `path`.
///
/// The JSON goes to a hidden sibling file first and is then renamed over the
/// target, so readers never see a half-written document.
pub fn write_document(
    document: &MergedDocument,
    path: impl AsRef<Path>,
) -> Result<(), PublishError> {
    let path = path.as_ref();
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');

    let write_err = |source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("swagger.json");
    let tmp_path = parent.join(format!(".{}.tmp", file_name));

    fs::write(&tmp_path, json.as_bytes()).map_err(write_err)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(err));
    }

    info!("Generated file: {:?}", path);
    Ok(())
}

/// Turns the written document into a static HTML site
pub trait Renderer {
    fn render(&self, input: &Path, target_dir: &Path) -> Result<(), RenderError>;
}

/// Runs an external program as `<program> <args...> <input> <target_dir>` and waits for it
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl From<&RenderConfig> for CommandRenderer {
    fn from(config: &RenderConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, input: &Path, target_dir: &Path) -> Result<(), RenderError> {
        debug!(
            "Running renderer: {} {:?} {:?} {:?}",
            self.program, self.args, input, target_dir
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(target_dir)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => RenderError::NotFound(self.program.clone()),
                _ => RenderError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;

        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(RenderError::Failed {
                program: self.program.clone(),
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Info;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> MergedDocument {
        MergedDocument {
            swagger: Some("2.0".to_string()),
            info: Some(Info {
                title: "Test API".to_string(),
                version: "1.0".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_write_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gen/out/swagger.json");

        write_document(&MergedDocument::default(), &path).unwrap();
        write_document(&sample(), &path).unwrap();

        let written: MergedDocument =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample());
        assert!(!dir.path().join("gen/out/.swagger.json.tmp").exists());
    }

    #[test]
    fn test_output_is_deterministic() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        write_document(&sample(), &first).unwrap();
        write_document(&sample(), &second).unwrap();

        let first = fs::read_to_string(first).unwrap();
        assert_eq!(first, fs::read_to_string(second).unwrap());
        assert!(first.ends_with('\n'));
    }

    #[test]
    fn test_missing_renderer() {
        let dir = tempdir().unwrap();
        let renderer = CommandRenderer::new("definitely-not-a-real-renderer-binary", vec![]);
        let err = renderer
            .render(&dir.path().join("swagger.json"), dir.path())
            .unwrap_err();
        assert!(matches!(err, RenderError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_renderer_receives_input_and_target() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("swagger.json");
        let target = dir.path().join("site");
        fs::write(&input, "{}").unwrap();

        // cp -r <input> <target> stands in for a real renderer
        let renderer = CommandRenderer::new("cp", vec!["-r".to_string()]);
        renderer.render(&input, &target).unwrap();
        assert!(target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_renderer_failure_carries_status() {
        let dir = tempdir().unwrap();
        let renderer = CommandRenderer::new("false", vec![]);
        let err = renderer
            .render(&dir.path().join("swagger.json"), dir.path())
            .unwrap_err();
        match err {
            RenderError::Failed { status, .. } => assert_eq!(status, "exit code 1"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
