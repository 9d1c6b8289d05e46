//! Type graph registry.
//!
//! Every type reference in a signature is canonicalized into an arena of
//! [`TypeDescriptor`]s addressed by [`TypeId`]. Named types are registered
//! before their fields are visited, so self-referential and mutually
//! referential structs resolve to the in-progress descriptor instead of
//! recursing. Anonymous shapes always get a fresh descriptor.

mod expr;

pub use expr::{TypeExpr, TypeExprError};

use crate::decl::FieldDecl;
use crate::tags::{self, DocTags, TagSyntaxError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;
use thiserror::Error;

const BUILTINS: &[&str] = &[
    "bool", "string", "byte", "rune", "error", "int", "int8", "int16", "int32", "int64", "uint",
    "uint8", "uint16", "uint32", "uint64", "uintptr", "float32", "float64", "complex64",
    "complex128",
];

/// Stable handle to a canonical descriptor. Equal handles mean the same type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeKind {
    Primitive,
    Struct { fields: Vec<Field> },
    Slice { elem: TypeId },
    Map { key: TypeId, value: TypeId },
    Optional { elem: TypeId },
    Interface,
    Alias { target: TypeId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(skip_serializing_if = "DocTags::is_empty")]
    pub tags: DocTags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    /// Declared or built-in name; `None` for anonymous shapes.
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: TypeKind,
}

/// A type declared somewhere in the source tree.
#[derive(Debug, Clone, Copy)]
pub enum Declared<'d> {
    Struct(&'d [FieldDecl]),
    Alias(&'d TypeExpr),
    Interface,
}

/// Name → declaration lookup for one compilation.
#[derive(Debug, Default)]
pub struct TypeIndex<'d> {
    entries: HashMap<&'d str, Declared<'d>>,
}

impl<'d> TypeIndex<'d> {
    /// Returns `false` if `name` was already declared.
    pub fn insert(&mut self, name: &'d str, decl: Declared<'d>) -> bool {
        self.entries.insert(name, decl).is_none()
    }

    pub fn get(&self, name: &str) -> Option<Declared<'d>> {
        self.entries.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unresolved type `{0}`")]
    Unresolved(String),
    #[error("field `{owner}.{field}`: {source}")]
    FieldTags {
        owner: String,
        field: String,
        #[source]
        source: TagSyntaxError,
    },
}

/// Arena of canonical descriptors. Immutable once the build finishes.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TypeRegistry {
    nodes: Vec<TypeDescriptor>,
    #[serde(skip)]
    named: BTreeMap<String, TypeId>,
    #[serde(skip)]
    primitives: BTreeMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.nodes[id.index()]
    }

    /// Canonical handle for a declared or built-in name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.named
            .get(name)
            .or_else(|| self.primitives.get(name))
            .copied()
    }

    /// Declared named types in name order.
    pub fn named(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.named.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render a handle back to reference syntax, naming named types.
    pub fn display(&self, id: TypeId) -> String {
        let desc = self.get(id);
        if let Some(name) = &desc.name {
            return name.clone();
        }
        match &desc.kind {
            TypeKind::Slice { elem } => format!("[]{}", self.display(*elem)),
            TypeKind::Optional { elem } => format!("*{}", self.display(*elem)),
            TypeKind::Map { key, value } => {
                format!("map[{}]{}", self.display(*key), self.display(*value))
            }
            TypeKind::Struct { fields } => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, self.display(f.ty)))
                    .collect();
                format!("struct{{ {} }}", inner.join("; "))
            }
            TypeKind::Interface => "interface{}".to_string(),
            TypeKind::Primitive | TypeKind::Alias { .. } => "?".to_string(),
        }
    }

    /// Resolve `expr` to its canonical descriptor, registering what is new.
    pub fn canonicalize(&mut self, expr: &TypeExpr, index: &TypeIndex<'_>) -> Result<TypeId, TypeError> {
        match expr {
            TypeExpr::Named(name) => self.canonicalize_named(name, index),
            TypeExpr::Pointer(inner) => {
                let elem = self.canonicalize(inner, index)?;
                Ok(self.push(None, TypeKind::Optional { elem }))
            }
            TypeExpr::Slice(inner) => {
                let elem = self.canonicalize(inner, index)?;
                Ok(self.push(None, TypeKind::Slice { elem }))
            }
            TypeExpr::Map(key, value) => {
                let key = self.canonicalize(key, index)?;
                let value = self.canonicalize(value, index)?;
                Ok(self.push(None, TypeKind::Map { key, value }))
            }
            TypeExpr::Struct(members) => {
                let mut fields = Vec::with_capacity(members.len());
                for (name, ty) in members {
                    fields.push(Field {
                        name: name.clone(),
                        ty: self.canonicalize(ty, index)?,
                        tags: DocTags::default(),
                    });
                }
                Ok(self.push(None, TypeKind::Struct { fields }))
            }
            TypeExpr::Interface => Ok(self.push(None, TypeKind::Interface)),
        }
    }

    fn canonicalize_named(&mut self, name: &str, index: &TypeIndex<'_>) -> Result<TypeId, TypeError> {
        if let Some(id) = self.named.get(name) {
            return Ok(*id);
        }

        let Some(decl) = index.get(name) else {
            if BUILTINS.contains(&name) || name.contains('.') {
                return Ok(self.primitive(name));
            }
            return Err(TypeError::Unresolved(name.to_string()));
        };

        match decl {
            Declared::Interface => {
                let id = self.push(Some(name), TypeKind::Interface);
                self.named.insert(name.to_string(), id);
                Ok(id)
            }
            Declared::Alias(target) => {
                let id = self.push(Some(name), TypeKind::Alias { target: TypeId(u32::MAX) });
                self.named.insert(name.to_string(), id);
                let target = self.canonicalize(target, index)?;
                self.nodes[id.index()].kind = TypeKind::Alias { target };
                Ok(id)
            }
            Declared::Struct(members) => {
                let id = self.push(Some(name), TypeKind::Struct { fields: Vec::new() });
                self.named.insert(name.to_string(), id);
                let mut fields = Vec::with_capacity(members.len());
                for member in members {
                    let tags = tags::parse(&member.docs).map_err(|source| TypeError::FieldTags {
                        owner: name.to_string(),
                        field: member.name.clone(),
                        source,
                    })?;
                    fields.push(Field {
                        name: member.name.clone(),
                        ty: self.canonicalize(&member.ty, index)?,
                        tags,
                    });
                }
                self.nodes[id.index()].kind = TypeKind::Struct { fields };
                Ok(id)
            }
        }
    }

    fn primitive(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.primitives.get(name) {
            return *id;
        }
        let id = self.push(Some(name), TypeKind::Primitive);
        self.primitives.insert(name.to_string(), id);
        id
    }

    fn push(&mut self, name: Option<&str>, kind: TypeKind) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeDescriptor {
            name: name.map(str::to_string),
            kind,
        });
        id
    }
}

impl Index<TypeId> for TypeRegistry {
    type Output = TypeDescriptor;

    fn index(&self, id: TypeId) -> &TypeDescriptor {
        self.get(id)
    }
}
