//! Declaration records: the structural input handed over by source parsers.
//!
//! One [`FileDecl`] per source file: its documentation block, the interfaces
//! it declares and the struct/alias types it declares. Documentation blocks
//! stay raw text; the tag resolver owns their interpretation.

use crate::types::TypeExpr;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDecl {
    /// Source path. Filled in by the loader when the record omits it.
    #[serde(default)]
    pub path: PathBuf,
    /// File/package documentation block.
    #[serde(default)]
    pub docs: String,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub docs: String,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub docs: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<ParamDecl>,
}

/// One argument or result. An empty name means the source left it unnamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub docs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub docs: String,
    #[serde(flatten)]
    pub kind: TypeDeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDeclKind {
    Struct {
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    Alias {
        target: TypeExpr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub docs: String,
}

impl ParamDecl {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        ParamDecl {
            name: name.to_string(),
            ty,
            docs: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_record() {
        let json = r#"{
            "docs": "@tg version=1.2.0",
            "interfaces": [{
                "name": "Catalog",
                "docs": "@tg http-server",
                "methods": [{
                    "name": "GetItem",
                    "params": [{"name": "ctx", "type": "context.Context"}, {"name": "id", "type": "string"}],
                    "results": [{"name": "item", "type": "Item"}, {"name": "err", "type": "error"}]
                }]
            }],
            "types": [
                {"name": "Item", "kind": "struct", "fields": [{"name": "ID", "type": "string"}]},
                {"name": "Items", "kind": "alias", "target": "[]Item"}
            ]
        }"#;
        let file: FileDecl = serde_json::from_str(json).unwrap();
        assert_eq!(file.path, PathBuf::new());
        assert_eq!(file.interfaces[0].methods[0].params[1].ty, TypeExpr::named("string"));
        assert!(file.interfaces[0].methods[0].results[1].ty.is_error());
        assert!(matches!(file.types[1].kind, TypeDeclKind::Alias { .. }));
    }

    #[test]
    fn rejects_bad_type_expression() {
        let json = r#"{"name": "x", "type": "chan int"}"#;
        let err = serde_json::from_str::<ParamDecl>(json).unwrap_err();
        assert!(err.to_string().contains("not supported"), "{err}");
    }
}
