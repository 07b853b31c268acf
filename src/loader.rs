use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::models::FragmentDocument;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read fragment {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fragment {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse a single fragment file
pub fn load_fragment(path: impl AsRef<Path>) -> Result<FragmentDocument, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the merge input: the default stub first, then every fragment in the given order
pub fn load_merge_inputs(
    stub: FragmentDocument,
    paths: &[PathBuf],
) -> Result<Vec<FragmentDocument>, LoadError> {
    let mut documents = Vec::with_capacity(paths.len() + 1);
    documents.push(stub);

    for path in paths {
        let doc = load_fragment(path)?;
        debug!("Loaded fragment {:?} with {} paths", path, doc.paths.len());
        documents.push(doc);
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_stub_comes_first() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("b.swagger.json");
        let second = dir.path().join("a.swagger.json");
        fs::write(&first, r#"{"paths":{"/b":{"get":{}}}}"#).unwrap();
        fs::write(&second, r#"{"paths":{"/a":{"post":{}}}}"#).unwrap();

        let stub = FragmentDocument::default_stub(
            &["application/json".to_string()],
            &["application/json".to_string()],
        );
        let docs = load_merge_inputs(stub.clone(), &[first, second]).unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0], stub);
        assert!(docs[1].paths.contains_key("/b"));
        assert!(docs[2].paths.contains_key("/a"));
    }

    #[test]
    fn test_no_fragments_yields_only_stub() {
        let docs = load_merge_inputs(FragmentDocument::default(), &[]).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.swagger.json");
        let mut file = File::create(&path).unwrap();
        write!(file, "{{\"paths\": ").unwrap();

        let err = load_merge_inputs(FragmentDocument::default(), &[path.clone()]).unwrap_err();
        match err {
            LoadError::Parse { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_object_document_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.swagger.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(load_fragment(&path), Err(LoadError::Parse { .. })));
    }
}
