//! Declaration records serialized as JSON: one [`FileDecl`] per file.

use crate::decl::FileDecl;
use crate::error::ParseError;
use std::path::Path;

/// Parse a JSON declaration record. A missing `path` is taken from the file.
pub fn parse(input: &str, path: &Path) -> Result<FileDecl, ParseError> {
    let mut file: FileDecl = serde_json::from_str(input)
        .map_err(|e| ParseError::new(path, format!("line {}", e.line()), e))?;
    if file.path.as_os_str().is_empty() {
        file.path = path.to_path_buf();
    }
    Ok(file)
}
