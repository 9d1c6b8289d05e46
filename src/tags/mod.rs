//! Tag resolver: parse scoped `@tg` annotation blocks and fold them into one
//! ordered multi-map.
//!
//! Folding runs outer-to-inner in [`Scope`] order. Singular keys take the
//! innermost value; list keys (see [`keys::is_list`]) concatenate outer-first.
//! The fold is associative, so batching fragments never changes the result.

pub mod keys;
mod parse;

pub use parse::{parse, TagSyntaxError};

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// Declaration scope a documentation block belongs to, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    File,
    Interface,
    Method,
    Parameter,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::File => "file",
            Scope::Interface => "interface",
            Scope::Method => "method",
            Scope::Parameter => "parameter",
        };
        f.write_str(name)
    }
}

/// A syntax error in one scope of a [`resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed annotation in {scope} scope at {source}")]
pub struct ScopedTagError {
    pub scope: Scope,
    /// Position of the failing block in the `resolve` input.
    pub index: usize,
    #[source]
    pub source: TagSyntaxError,
}

/// Ordered multi-map of annotation key to values.
///
/// A key with no values is a flag. Keys keep the position of their first
/// insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTags {
    entries: Vec<(String, Vec<String>)>,
}

impl DocTags {
    /// Assign `values` to `key` under the fold rule for that key.
    pub fn insert(&mut self, key: &str, values: Vec<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) if keys::is_list(key) => existing.extend(values),
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key.to_string(), values)),
        }
    }

    /// Fold `inner` over `self`: `self` is the outer scope.
    pub fn merge(mut self, inner: &DocTags) -> DocTags {
        for (key, values) in &inner.entries {
            self.insert(key, values.clone());
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// True if `key` is present and not explicitly `false`.
    pub fn is_set(&self, key: &str) -> bool {
        self.contains(key) && self.get(key) != Some("false")
    }

    /// Last value of `key`, if it has one.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).last().map(String::as_str)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// True if any key belongs to the recognized vocabulary.
    pub fn has_known(&self) -> bool {
        self.entries.iter().any(|(k, _)| keys::is_known(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DocTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            if keys::is_list(key) {
                map.serialize_entry(key, values)?;
            } else if let Some(last) = values.last() {
                map.serialize_entry(key, last)?;
            } else {
                map.serialize_entry(key, &true)?;
            }
        }
        map.end()
    }
}

/// Fold already-parsed fragments in scope precedence order.
///
/// Fragments are stably sorted by scope, so precedence comes from the scope
/// each fragment carries. Fragments sharing a scope fold in the given order.
pub fn fold<'a>(fragments: impl IntoIterator<Item = (Scope, &'a DocTags)>) -> DocTags {
    let mut ordered: Vec<(Scope, &DocTags)> = fragments.into_iter().collect();
    ordered.sort_by_key(|(scope, _)| *scope);
    ordered
        .into_iter()
        .fold(DocTags::default(), |acc, (_, fragment)| acc.merge(fragment))
}

/// Parse every scope's raw text independently, then fold.
pub fn resolve<'a>(
    scopes: impl IntoIterator<Item = (Scope, &'a str)>,
) -> Result<DocTags, ScopedTagError> {
    let mut fragments = Vec::new();
    for (index, (scope, text)) in scopes.into_iter().enumerate() {
        let fragment = parse(text).map_err(|source| ScopedTagError {
            scope,
            index,
            source,
        })?;
        fragments.push((scope, fragment));
    }
    Ok(fold(fragments.iter().map(|(scope, tags)| (*scope, tags))))
}
