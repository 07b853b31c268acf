use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Marker every generated fragment carries in its file name
pub const FRAGMENT_MARKER: &str = ".swagger.json";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Fragment root {0:?} does not exist or is not a directory")]
    MissingRoot(PathBuf),

    #[error("Failed to walk fragment tree under {root:?}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Symbolic link in fragment tree is not supported: {0:?}")]
    Symlink(PathBuf),
}

/// Whether a file name looks like a generated fragment.
///
/// The marker has to appear after at least one character, so a file named
/// exactly `.swagger.json` is not a fragment.
pub fn is_fragment_name(name: &str) -> bool {
    matches!(name.find(FRAGMENT_MARKER), Some(idx) if idx > 0)
}

/// Recursively collect fragment files under `root`, in directory listing order.
///
/// The order is left as the filesystem yields it because later fragments win
/// on path collisions during the merge. Any error inside the tree aborts the
/// whole discovery; there are no partial results.
pub fn discover_fragments(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }
    let root = root
        .canonicalize()
        .map_err(|_| DiscoveryError::MissingRoot(root.to_path_buf()))?;

    let mut fragments = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            root: root.clone(),
            source,
        })?;

        if entry.depth() > 0 && entry.path_is_symlink() {
            return Err(DiscoveryError::Symlink(entry.path().to_path_buf()));
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if is_fragment_name(&name) {
            debug!("Found fragment: {:?}", entry.path());
            fragments.push(entry.into_path());
        }
    }

    Ok(fragments)
}
