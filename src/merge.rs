use log::debug;
use serde_json::Value;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

use crate::models::{FragmentDocument, Info, MergedDocument, Tag, SWAGGER_VERSION};

/// Top-level settings the merged document takes from configuration, never from fragments
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub info: Info,
    pub path_prefix: String,
    pub host: String,
    pub schemes: Vec<String>,
}

/// Non-fatal condition found while merging; processing continues
#[derive(Debug, Clone, PartialEq)]
pub enum MergeWarning {
    /// A later document redeclared an operation; the later one was kept
    OperationOverridden {
        document: usize,
        path: String,
        method: String,
    },
    /// A later document redefined a named component with different content
    ComponentOverridden {
        document: usize,
        section: &'static str,
        name: String,
    },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::OperationOverridden {
                document,
                path,
                method,
            } => write!(
                f,
                "{} {} redeclared by document #{}, keeping the later one",
                method.to_uppercase(),
                path,
                document
            ),
            MergeWarning::ComponentOverridden {
                document,
                section,
                name,
            } => write!(
                f,
                "{} '{}' redefined by document #{}, keeping the later one",
                section, name, document
            ),
        }
    }
}

/// Fatal merge condition; nothing gets written
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Document #{document} declares unsupported swagger version {version}")]
    UnsupportedVersion { document: usize, version: String },

    #[error("Document #{document} declares invalid path '{path}': paths must start with '/'")]
    InvalidPath { document: usize, path: String },
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: MergedDocument,
    pub warnings: Vec<MergeWarning>,
}

/// Combines an ordered list of fragment documents into one description.
///
/// Implementations must give later documents precedence on collisions and
/// take info, host and schemes from the options.
pub trait DocumentMerger {
    fn merge(
        &self,
        documents: &[FragmentDocument],
        options: &MergeOptions,
    ) -> Result<MergeOutcome, MergeError>;
}

/// Swagger 2.0 merger with last-write-wins semantics
#[derive(Debug, Default, Clone, Copy)]
pub struct SwaggerMerger;

impl DocumentMerger for SwaggerMerger {
    fn merge(
        &self,
        documents: &[FragmentDocument],
        options: &MergeOptions,
    ) -> Result<MergeOutcome, MergeError> {
        let mut merged = MergedDocument {
            swagger: Some(SWAGGER_VERSION.to_string()),
            info: Some(options.info.clone()),
            host: Some(options.host.clone()),
            schemes: options.schemes.clone(),
            ..Default::default()
        };
        let mut warnings = Vec::new();

        for (index, doc) in documents.iter().enumerate() {
            if let Some(version) = doc.swagger.as_deref() {
                if version != SWAGGER_VERSION {
                    return Err(MergeError::UnsupportedVersion {
                        document: index,
                        version: version.to_string(),
                    });
                }
            }

            extend_unique(&mut merged.consumes, &doc.consumes);
            extend_unique(&mut merged.produces, &doc.produces);

            for (path, item) in &doc.paths {
                if !path.starts_with('/') {
                    return Err(MergeError::InvalidPath {
                        document: index,
                        path: path.clone(),
                    });
                }

                let key = join_path(&options.path_prefix, doc.basePath.as_deref(), path);
                let target = merged.paths.entry(key.clone()).or_default();

                for (method, op) in item.operations() {
                    if let Some(slot) = target.operation_slot(method) {
                        if slot.is_some() {
                            warnings.push(MergeWarning::OperationOverridden {
                                document: index,
                                path: key.clone(),
                                method: method.to_string(),
                            });
                        }
                        *slot = Some(op.clone());
                    }
                }

                if !item.parameters.is_empty() {
                    target.parameters = item.parameters.clone();
                }
                target.extensions.extend(item.extensions.clone());
            }

            merge_named(
                &mut merged.definitions,
                &doc.definitions,
                "definition",
                index,
                &mut warnings,
            );
            merge_named(
                &mut merged.parameters,
                &doc.parameters,
                "parameter",
                index,
                &mut warnings,
            );
            merge_named(
                &mut merged.responses,
                &doc.responses,
                "response",
                index,
                &mut warnings,
            );
            merge_named(
                &mut merged.securityDefinitions,
                &doc.securityDefinitions,
                "security definition",
                index,
                &mut warnings,
            );

            for requirement in &doc.security {
                if !merged.security.contains(requirement) {
                    merged.security.push(requirement.clone());
                }
            }
            merge_tags(&mut merged.tags, &doc.tags);
            merged.extensions.extend(doc.extensions.clone());
        }

        debug!(
            "Merged {} documents into {} paths",
            documents.len(),
            merged.paths.len()
        );

        Ok(MergeOutcome {
            document: merged,
            warnings,
        })
    }
}

/// Join prefix, base path and path into one absolute path.
///
/// Only the slashes where two parts meet are collapsed; the path itself is
/// kept as declared, trailing slash included.
pub fn join_path(prefix: &str, base_path: Option<&str>, path: &str) -> String {
    let mut joined = prefix.trim_end_matches('/').to_string();

    let base = base_path.unwrap_or("").trim_matches('/');
    if !base.is_empty() {
        joined.push('/');
        joined.push_str(base);
    }

    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    joined
}

fn extend_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

fn merge_named(
    target: &mut BTreeMap<String, Value>,
    incoming: &BTreeMap<String, Value>,
    section: &'static str,
    document: usize,
    warnings: &mut Vec<MergeWarning>,
) {
    for (name, value) in incoming {
        if let Some(previous) = target.insert(name.clone(), value.clone()) {
            if &previous != value {
                warnings.push(MergeWarning::ComponentOverridden {
                    document,
                    section,
                    name: name.clone(),
                });
            }
        }
    }
}

fn merge_tags(target: &mut Vec<Tag>, incoming: &[Tag]) {
    for tag in incoming {
        if !target.iter().any(|t| t.name == tag.name) {
            target.push(tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contact;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options(prefix: &str) -> MergeOptions {
        MergeOptions {
            info: Info {
                title: "Test API".to_string(),
                version: "1.0".to_string(),
                description: None,
                contact: Some(Contact {
                    name: Some("Team".to_string()),
                    url: None,
                    email: None,
                }),
            },
            path_prefix: prefix.to_string(),
            host: "localhost:9".to_string(),
            schemes: vec!["http".to_string()],
        }
    }

    fn doc(value: Value) -> FragmentDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_metadata_comes_from_options() {
        let fragment = doc(json!({
            "swagger": "2.0",
            "info": {"title": "svc.proto", "version": "version not set"},
            "host": "elsewhere:1",
            "schemes": ["https"],
            "paths": {"/ping": {"get": {}}}
        }));

        let outcome = SwaggerMerger.merge(&[fragment], &options("/")).unwrap();
        let merged = outcome.document;
        assert_eq!(merged.info.as_ref().unwrap().title, "Test API");
        assert_eq!(merged.host.as_deref(), Some("localhost:9"));
        assert_eq!(merged.schemes, vec!["http"]);
        assert_eq!(merged.swagger.as_deref(), Some("2.0"));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_paths_are_prefixed() {
        let first = doc(json!({"paths": {"/ping": {"get": {}}}}));
        let second = doc(json!({"basePath": "/svc/", "paths": {"/pong": {"post": {}}}}));

        let merged = SwaggerMerger
            .merge(&[first, second], &options("/api"))
            .unwrap()
            .document;
        let keys: Vec<&String> = merged.paths.keys().collect();
        assert_eq!(keys, vec!["/api/ping", "/api/svc/pong"]);
    }

    #[test]
    fn test_later_document_wins_on_collision() {
        let first = doc(json!({"paths": {"/x": {"get": {"summary": "first"}, "put": {}}}}));
        let second = doc(json!({"paths": {"/x": {"get": {"summary": "second"}}}}));

        let outcome = SwaggerMerger.merge(&[first, second], &options("/")).unwrap();
        let item = &outcome.document.paths["/x"];
        assert_eq!(item.get.as_ref().unwrap().summary.as_deref(), Some("second"));
        // Methods not redeclared survive
        assert!(item.put.is_some());
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::OperationOverridden {
                document: 1,
                path: "/x".to_string(),
                method: "get".to_string(),
            }]
        );
    }

    #[test]
    fn test_media_types_and_definitions() {
        let stub = FragmentDocument::default_stub(
            &["application/json".to_string()],
            &["application/json".to_string()],
        );
        let first = doc(json!({
            "produces": ["application/json", "text/plain"],
            "definitions": {"A": {"type": "object"}, "B": {"type": "string"}},
            "tags": [{"name": "Docs", "description": "first"}]
        }));
        let second = doc(json!({
            "definitions": {"A": {"type": "object"}, "B": {"type": "integer"}},
            "tags": [{"name": "Docs", "description": "second"}, {"name": "Nft"}]
        }));

        let outcome = SwaggerMerger
            .merge(&[stub, first, second], &options("/"))
            .unwrap();
        let merged = outcome.document;
        assert_eq!(merged.consumes, vec!["application/json"]);
        assert_eq!(merged.produces, vec!["application/json", "text/plain"]);
        assert_eq!(merged.definitions["B"], json!({"type": "integer"}));
        assert_eq!(merged.tags.len(), 2);
        assert_eq!(merged.tags[0].description.as_deref(), Some("first"));

        // An identical redefinition of A is silent
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::ComponentOverridden {
                document: 2,
                section: "definition",
                name: "B".to_string(),
            }]
        );
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        let fragment = doc(json!({"swagger": "3.0", "paths": {}}));
        let err = SwaggerMerger.merge(&[fragment], &options("/")).unwrap_err();
        assert_eq!(
            err,
            MergeError::UnsupportedVersion {
                document: 0,
                version: "3.0".to_string()
            }
        );
    }

    #[test]
    fn test_relative_path_is_fatal() {
        let fragment = doc(json!({"paths": {"ping": {"get": {}}}}));
        assert!(matches!(
            SwaggerMerger.merge(&[fragment], &options("/")),
            Err(MergeError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", None, "/ping"), "/ping");
        assert_eq!(join_path("/", None, "/"), "/");
        assert_eq!(join_path("/v1/", Some("/svc"), "/a/{id}"), "/v1/svc/a/{id}");
        assert_eq!(join_path("/", Some("/"), "/x/"), "/x/");
        assert_eq!(join_path("/api", None, "//x"), "/api//x");
    }

    #[test]
    fn test_trailing_slash_paths_stay_distinct() {
        let fragment = doc(json!({"paths": {"/x": {"get": {}}, "/x/": {"get": {}}}}));

        let outcome = SwaggerMerger.merge(&[fragment], &options("/")).unwrap();
        let keys: Vec<&String> = outcome.document.paths.keys().collect();
        assert_eq!(keys, vec!["/x", "/x/"]);
        assert_eq!(outcome.document.operation_count(), 2);
        assert!(outcome.warnings.is_empty());
    }
}
