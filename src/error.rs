//! Build error taxonomy.
//!
//! Every variant carries enough identity (file, service, method, parameter,
//! scope) to locate the offending declaration or annotation.

use crate::model::{Binding, TransportKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("duplicate service `{name}` declared in {} and {}", .first.display(), .second.display())]
    Duplicate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("include and exclude cannot be set at the same time")]
    IncludeExclude,
    #[error("{service}.{method}: invalid {key} value `{value}`")]
    InvalidTag {
        service: String,
        method: String,
        key: &'static str,
        value: String,
    },
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// A method whose wire bindings cannot be resolved unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service}.{method} ({transport}): {kind}")]
pub struct BindingError {
    pub service: String,
    pub method: String,
    pub transport: TransportKind,
    pub kind: BindingErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingErrorKind {
    #[error("more than one parameter would travel in the request body: {}", .0.join(", "))]
    MultipleBody(Vec<String>),
    #[error("path parameter `{param}` has no placeholder in route `{route}`")]
    MissingPlaceholder { param: String, route: String },
    #[error("route placeholder `{0}` has no matching path parameter")]
    UnmatchedPlaceholder(String),
    #[error("`{0}` is bound more than once")]
    BoundTwice(String),
    #[error("`{key}` names unknown argument `{name}`")]
    UnknownArgument { key: &'static str, name: String },
    #[error("`{name}` has unknown location `{location}`")]
    UnknownLocation { name: String, location: String },
    #[error("result `{name}` cannot travel in the {location}")]
    ResultLocation { name: String, location: Binding },
    #[error("no HTTP route was derived")]
    NoRoute,
}

/// A documentation block or declaration that could not be turned into a
/// structural record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {context}: {message}", .file.display())]
pub struct ParseError {
    pub file: PathBuf,
    /// What was being read, e.g. `method Catalog.GetItem (method scope)`.
    pub context: String,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<PathBuf>, context: impl Into<String>, message: impl ToString) -> Self {
        ParseError {
            file: file.into(),
            context: context.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_both_files() {
        let err = BuildError::Duplicate {
            name: "Catalog".to_string(),
            first: PathBuf::from("a/catalog.go"),
            second: PathBuf::from("b/catalog.go"),
        };
        let msg = err.to_string();
        assert!(msg.contains("a/catalog.go") && msg.contains("b/catalog.go"), "{msg}");
    }

    #[test]
    fn binding_error_carries_identity() {
        let err = BindingError {
            service: "Catalog".to_string(),
            method: "PutItem".to_string(),
            transport: TransportKind::Rest,
            kind: BindingErrorKind::MultipleBody(vec!["a".to_string(), "b".to_string()]),
        };
        assert_eq!(
            err.to_string(),
            "Catalog.PutItem (REST): more than one parameter would travel in the request body: a, b"
        );
    }
}
