//! Model builder: declarations plus resolved tags in, [`Transport`] out.
//!
//! One sequential pass. The package scope is folded first from every file's
//! documentation block, then each annotated interface becomes a [`Service`].
//! The build is atomic: the first error aborts it and no partial model is
//! returned.

use super::{Method, Module, Parameter, Position, Service, Transport, TransportKind};
use crate::binding;
use crate::decl::{FileDecl, InterfaceDecl, MethodDecl, ParamDecl, TypeDeclKind};
use crate::error::{BuildError, ConfigError, ParseError};
use crate::tags::{self, keys, DocTags, Scope};
use crate::types::{Declared, TypeIndex, TypeRegistry};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Only model these interfaces. Mutually exclusive with `exclude`.
    pub include: Vec<String>,
    /// Model every annotated interface except these.
    pub exclude: Vec<String>,
    pub module: Module,
    pub version: String,
}

impl BuildOptions {
    /// Split one selection list into include/exclude: `!Name` excludes.
    pub fn from_selection<I, S>(selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = BuildOptions::default();
        for entry in selection {
            let entry = entry.as_ref().trim();
            match entry.strip_prefix('!') {
                Some(name) => options.exclude.push(name.to_string()),
                None if !entry.is_empty() => options.include.push(entry.to_string()),
                None => {}
            }
        }
        options
    }

    fn selects(&self, name: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|n| n == name);
        }
        !self.exclude.iter().any(|n| n == name)
    }
}

/// Build the transport model from per-file declaration records.
pub fn build(mut files: Vec<FileDecl>, options: &BuildOptions) -> Result<Transport, BuildError> {
    if !options.include.is_empty() && !options.exclude.is_empty() {
        return Err(ConfigError::IncludeExclude.into());
    }

    files.sort_by(|a, b| {
        a.path
            .file_name()
            .cmp(&b.path.file_name())
            .then_with(|| a.path.cmp(&b.path))
    });

    let package = package_tags(&files)?;
    let index = type_index(&files)?;
    let mut types = TypeRegistry::default();
    let mut services: BTreeMap<String, Service> = BTreeMap::new();

    for file in &files {
        for iface in &file.interfaces {
            if !options.selects(&iface.name) {
                tracing::info!(iface = %iface.name, "skip: not selected");
                continue;
            }

            let own = tags::parse(&iface.docs).map_err(|e| {
                ParseError::new(&file.path, format!("interface {} ({} scope)", iface.name, Scope::Interface), e)
            })?;
            if !own.has_known() {
                tracing::debug!(iface = %iface.name, "skip: no annotations");
                continue;
            }

            if let Some(first) = services.get(&iface.name) {
                return Err(BuildError::Duplicate {
                    name: iface.name.clone(),
                    first: first.file.clone(),
                    second: file.path.clone(),
                });
            }

            let service_tags = tags::fold([(Scope::File, &package), (Scope::Interface, &own)]);
            let service = build_service(&file.path, iface, service_tags, &index, &mut types)?;
            tracing::debug!(
                service = %service.name,
                methods = service.methods.len(),
                transports = ?service.transports,
                "modeled service"
            );
            services.insert(service.name.clone(), service);
        }
    }

    Ok(Transport {
        version: options.version.clone(),
        module: options.module.clone(),
        tags: package,
        services,
        types,
    })
}

/// Every file's own documentation block, folded in file order.
fn package_tags(files: &[FileDecl]) -> Result<DocTags, ParseError> {
    let mut fragments = Vec::with_capacity(files.len());
    for file in files {
        let fragment = tags::parse(&file.docs).map_err(|e| {
            ParseError::new(&file.path, format!("package documentation ({} scope)", Scope::File), e)
        })?;
        fragments.push(fragment);
    }
    Ok(tags::fold(fragments.iter().map(|t| (Scope::File, t))))
}

/// One type namespace across all files.
fn type_index(files: &[FileDecl]) -> Result<TypeIndex<'_>, ParseError> {
    let mut index = TypeIndex::default();
    for file in files {
        for decl in &file.types {
            let declared = match &decl.kind {
                TypeDeclKind::Struct { fields } => Declared::Struct(fields),
                TypeDeclKind::Alias { target } => Declared::Alias(target),
            };
            if !index.insert(&decl.name, declared) {
                return Err(ParseError::new(
                    &file.path,
                    format!("type {}", decl.name),
                    "type declared more than once",
                ));
            }
        }
    }
    // Interfaces are usable as types too. Duplicate interfaces surface later
    // as duplicate services, so they do not fail here.
    for file in files {
        for iface in &file.interfaces {
            match index.get(&iface.name) {
                None => {
                    index.insert(&iface.name, Declared::Interface);
                }
                Some(Declared::Interface) => {}
                Some(_) => {
                    return Err(ParseError::new(
                        &file.path,
                        format!("interface {}", iface.name),
                        "type declared more than once",
                    ))
                }
            }
        }
    }
    Ok(index)
}

fn build_service(
    file: &Path,
    iface: &InterfaceDecl,
    tags: DocTags,
    index: &TypeIndex<'_>,
    types: &mut TypeRegistry,
) -> Result<Service, BuildError> {
    let mut transports = BTreeSet::new();
    if tags.is_set(keys::HTTP_SERVER) {
        transports.insert(TransportKind::Rest);
    }
    if tags.is_set(keys::JSON_RPC_SERVER) {
        transports.insert(TransportKind::JsonRpc);
    }

    let mut seen = HashSet::new();
    let mut methods = Vec::with_capacity(iface.methods.len());
    for decl in &iface.methods {
        if !seen.insert(decl.name.as_str()) {
            return Err(ParseError::new(
                file,
                format!("method {}.{}", iface.name, decl.name),
                "method declared more than once",
            )
            .into());
        }
        let ctx = MethodContext {
            file,
            service: &iface.name,
            tags: &tags,
            transports: &transports,
        };
        methods.push(ctx.build(decl, index, types)?);
    }
    methods.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Service {
        name: iface.name.clone(),
        file: file.to_path_buf(),
        tags,
        transports,
        methods,
    })
}

/// What a method inherits from its service.
struct MethodContext<'a> {
    file: &'a Path,
    service: &'a str,
    tags: &'a DocTags,
    transports: &'a BTreeSet<TransportKind>,
}

impl MethodContext<'_> {
    fn build(&self, decl: &MethodDecl, index: &TypeIndex<'_>, types: &mut TypeRegistry) -> Result<Method, BuildError> {
        let context = format!("method {}.{}", self.service, decl.name);
        let own = tags::parse(&decl.docs)
            .map_err(|e| ParseError::new(self.file, format!("{context} ({} scope)", Scope::Method), e))?;
        let tags = tags::fold([(Scope::Interface, self.tags), (Scope::Method, &own)]);

        if decl.params.is_empty() {
            return Err(ParseError::new(self.file, context, "no context parameter").into());
        }

        let returns_error = decl.results.last().is_some_and(|r| r.ty.is_error());
        let last = decl.results.len().saturating_sub(1);

        let mut params = Vec::with_capacity(decl.params.len());
        for (i, p) in decl.params.iter().enumerate() {
            let name = if p.name.is_empty() { format!("arg{i}") } else { p.name.clone() };
            params.push(self.parameter(&context, name, p, Position::Argument(i), index, types)?);
        }
        let mut results = Vec::with_capacity(decl.results.len());
        for (i, p) in decl.results.iter().enumerate() {
            let name = match p.name.as_str() {
                "" if returns_error && i == last => "err".to_string(),
                "" => format!("result{i}"),
                named => named.to_string(),
            };
            results.push(self.parameter(&context, name, p, Position::Result(i), index, types)?);
        }

        let http = if self.transports.contains(&TransportKind::Rest) {
            Some(binding::http_route(self.service, &decl.name, &tags)?)
        } else {
            None
        };
        let rpc_name = self
            .transports
            .contains(&TransportKind::JsonRpc)
            .then(|| binding::rpc_method_name(self.service, &decl.name));

        let mut method = Method {
            service: self.service.to_string(),
            name: decl.name.clone(),
            params,
            results,
            deprecated: tags.is_set(keys::DEPRECATED),
            experimental: tags.is_set(keys::EXPERIMENTAL),
            tags,
            http,
            rpc_name,
            bindings: BTreeMap::new(),
            returns_error,
        };
        for &kind in self.transports {
            let resolved = binding::resolve(&method, kind).map_err(ConfigError::from)?;
            method.bindings.insert(kind, resolved);
        }
        tracing::debug!(service = %self.service, method = %method.name, "modeled method");
        Ok(method)
    }

    fn parameter(
        &self,
        context: &str,
        name: String,
        decl: &ParamDecl,
        position: Position,
        index: &TypeIndex<'_>,
        types: &mut TypeRegistry,
    ) -> Result<Parameter, ParseError> {
        let where_ = format!("{context} parameter {name}");
        let tags = tags::parse(&decl.docs)
            .map_err(|e| ParseError::new(self.file, format!("{where_} ({} scope)", Scope::Parameter), e))?;
        let ty = types
            .canonicalize(&decl.ty, index)
            .map_err(|e| ParseError::new(self.file, &where_, e))?;
        Ok(Parameter {
            name,
            ty,
            tags,
            position,
        })
    }
}
