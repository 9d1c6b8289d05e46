//! Parser module: dispatch by file extension.

pub mod go;
pub mod json;

use crate::decl::FileDecl;
use crate::error::ParseError;
use std::path::Path;

/// File extensions recognized as declaration sources.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["go", "json"];

/// Parse a source file into a declaration record based on its extension.
pub fn parse_file(path: &Path, content: &str) -> Result<FileDecl, ParseError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("go") => go::parse(content, path),
        Some("json") => json::parse(content, path),
        _ => Err(ParseError::new(path, "file", "unsupported file type")),
    }
}
