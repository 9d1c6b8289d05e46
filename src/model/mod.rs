//! The resolved transport model handed to emitters.
//!
//! Everything here is built once by [`builder::build`] and never mutated
//! afterwards, so emitters may read it from several threads at once.
//! Services and methods iterate in name order.

pub mod builder;

use crate::tags::{keys, DocTags};
use crate::types::{TypeId, TypeRegistry};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Wire protocol family a service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TransportKind {
    #[serde(rename = "rest")]
    Rest,
    #[serde(rename = "json-rpc")]
    JsonRpc,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Rest => f.write_str("REST"),
            TransportKind::JsonRpc => f.write_str("JSON-RPC"),
        }
    }
}

/// Where a parameter or result travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    RpcParams,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Binding::Path => "path",
            Binding::Query => "query",
            Binding::Header => "header",
            Binding::Cookie => "cookie",
            Binding::Body => "body",
            Binding::RpcParams => "rpc-params",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    pub fn permits_body(self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch)
    }
}

impl FromStr for HttpVerb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpVerb::Get),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "PATCH" => Ok(HttpVerb::Patch),
            "DELETE" => Ok(HttpVerb::Delete),
            "HEAD" => Ok(HttpVerb::Head),
            "OPTIONS" => Ok(HttpVerb::Options),
            _ => Err(()),
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// Base import path of the compiled source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Module {
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Argument(usize),
    Result(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
    /// The parameter's own documentation scope.
    #[serde(skip_serializing_if = "DocTags::is_empty")]
    pub tags: DocTags,
    pub position: Position,
}

/// Resolved location of one parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireBinding {
    /// Parameter name in the signature.
    pub param: String,
    pub binding: Binding,
    /// Name on the wire: placeholder, query key, header, cookie or field.
    pub wire_name: String,
}

/// Bindings of one method under one transport kind, in signature order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bindings {
    pub params: Vec<WireBinding>,
    pub results: Vec<WireBinding>,
}

impl Bindings {
    pub fn param(&self, name: &str) -> Option<&WireBinding> {
        self.params.iter().find(|b| b.param == name)
    }

    pub fn result(&self, name: &str) -> Option<&WireBinding> {
        self.results.iter().find(|b| b.param == name)
    }

    /// The request body parameter, if any.
    pub fn body(&self) -> Option<&WireBinding> {
        self.params.iter().find(|b| b.binding == Binding::Body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRoute {
    pub verb: HttpVerb,
    pub path: String,
    pub success: u16,
    pub request_content_type: String,
    pub response_content_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub service: String,
    pub name: String,
    /// All declared inputs; index 0 is the call context.
    pub params: Vec<Parameter>,
    /// All declared outputs, including a trailing error result.
    pub results: Vec<Parameter>,
    pub tags: DocTags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_name: Option<String>,
    pub bindings: BTreeMap<TransportKind, Bindings>,
    pub deprecated: bool,
    pub experimental: bool,
    pub returns_error: bool,
}

impl Method {
    /// Inputs that travel on the wire: everything after the call context.
    pub fn arguments(&self) -> &[Parameter] {
        self.params.get(1..).unwrap_or(&[])
    }

    /// Outputs that travel on the wire: everything before the error result.
    pub fn outputs(&self) -> &[Parameter] {
        if self.returns_error {
            &self.results[..self.results.len() - 1]
        } else {
            &self.results
        }
    }

    pub fn bindings(&self, kind: TransportKind) -> Option<&Bindings> {
        self.bindings.get(&kind)
    }

    pub fn summary(&self) -> Option<&str> {
        self.tags.get(keys::SUMMARY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub name: String,
    pub file: PathBuf,
    pub tags: DocTags,
    pub transports: BTreeSet<TransportKind>,
    /// Sorted by name.
    pub methods: Vec<Method>,
}

impl Service {
    pub fn speaks(&self, kind: TransportKind) -> bool {
        self.transports.contains(&kind)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// The compiled model: the only surface emitters read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transport {
    pub version: String,
    pub module: Module,
    /// Package scope: every file's documentation block folded in file order.
    pub tags: DocTags,
    pub services: BTreeMap<String, Service>,
    pub types: TypeRegistry,
}

impl Transport {
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn has_json_rpc(&self) -> bool {
        self.services().any(|s| s.speaks(TransportKind::JsonRpc))
    }

    pub fn has_trace(&self) -> bool {
        self.services().any(|s| s.tags.is_set(keys::TRACE))
    }

    pub fn has_metrics(&self) -> bool {
        self.services().any(|s| s.tags.is_set(keys::METRICS))
    }

    /// Source file a service was declared in.
    pub fn source_of(&self, service: &str) -> Option<&Path> {
        self.services.get(service).map(|s| s.file.as_path())
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }
}
