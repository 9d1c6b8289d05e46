//! GitHub-flavored markdown renderer: a route and method reference.
//!
//! One section per service with a method table, then one block per method
//! with its parameter bindings, then every named type exactly once.

use crate::model::{Method, Parameter, Service, Transport, TransportKind, WireBinding};
use crate::render::{RenderError, Renderer};
use crate::tags::keys;
use crate::types::{TypeKind, TypeRegistry};
use std::fmt::Write as _;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn name(&self) -> &str {
        "markdown"
    }

    fn render(&self, transport: &Transport) -> Result<String, RenderError> {
        let mut out = String::new();
        write_document(&mut out, transport).map_err(|e| RenderError::new(self.name(), e))?;
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn write_document(out: &mut String, transport: &Transport) -> std::fmt::Result {
    let title = transport.tags.get(keys::TITLE).unwrap_or("Services");
    writeln!(out, "# {title}\n")?;

    let version = transport.tags.get(keys::VERSION).unwrap_or(&transport.version);
    if !version.is_empty() {
        writeln!(out, "Version: {version}\n")?;
    }
    if let Some(desc) = transport.tags.get(keys::DESC) {
        writeln!(out, "{desc}\n")?;
    }

    if transport.services.is_empty() {
        return Ok(());
    }

    writeln!(out, "## Index\n")?;
    for name in transport.service_names() {
        writeln!(out, "* [{name}](#{})", anchor(name))?;
    }
    writeln!(out)?;

    for service in transport.services() {
        write_service(out, service, &transport.types)?;
    }

    let named: Vec<_> = transport.types.named().collect();
    if !named.is_empty() {
        writeln!(out, "## Types\n")?;
        for (name, id) in named {
            write_type(out, name, &transport.types[id].kind, &transport.types)?;
        }
    }
    Ok(())
}

fn write_service(out: &mut String, service: &Service, types: &TypeRegistry) -> std::fmt::Result {
    writeln!(out, "## {}\n", service.name)?;

    let transports: Vec<String> = service.transports.iter().map(ToString::to_string).collect();
    writeln!(out, "Transports: {}  ", transports.join(", "))?;
    writeln!(out, "Source: `{}`\n", service.file.display())?;
    if let Some(desc) = service.tags.get(keys::DESC) {
        writeln!(out, "{desc}\n")?;
    }

    writeln!(out, "| Method | HTTP | Route | JSON-RPC | Summary |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for method in &service.methods {
        let (verb, path) = match &method.http {
            Some(route) => (route.verb.to_string(), format!("`{}`", route.path)),
            None => (String::new(), String::new()),
        };
        let rpc = method.rpc_name.as_deref().map(|n| format!("`{n}`")).unwrap_or_default();
        writeln!(
            out,
            "| [{name}](#{slug}) | {verb} | {path} | {rpc} | {summary} |",
            name = method.name,
            slug = anchor(&format!("{}.{}", service.name, method.name)),
            summary = cell(method.summary().unwrap_or("")),
        )?;
    }
    writeln!(out)?;

    for method in &service.methods {
        write_method(out, method, types)?;
    }
    Ok(())
}

fn write_method(out: &mut String, method: &Method, types: &TypeRegistry) -> std::fmt::Result {
    writeln!(out, "### {}.{}\n", method.service, method.name)?;

    let mut badges = Vec::new();
    if method.deprecated {
        badges.push("**deprecated**");
    }
    if method.experimental {
        badges.push("**experimental**");
    }
    if !badges.is_empty() {
        writeln!(out, "{}\n", badges.join(" "))?;
    }
    if let Some(desc) = method.tags.get(keys::DESC) {
        writeln!(out, "{desc}\n")?;
    }
    if let Some(route) = &method.http {
        writeln!(
            out,
            "`{} {}` → {} ({} → {})\n",
            route.verb, route.path, route.success, route.request_content_type, route.response_content_type
        )?;
    }

    let kinds: Vec<TransportKind> = method.bindings.keys().copied().collect();
    write_table(out, "Parameter", method.arguments(), &kinds, types, |kind, name| {
        method.bindings(kind).and_then(|b| b.param(name))
    })?;
    write_table(out, "Result", method.outputs(), &kinds, types, |kind, name| {
        method.bindings(kind).and_then(|b| b.result(name))
    })?;
    Ok(())
}

fn write_table<'m>(
    out: &mut String,
    heading: &str,
    params: &[Parameter],
    kinds: &[TransportKind],
    types: &TypeRegistry,
    lookup: impl Fn(TransportKind, &str) -> Option<&'m WireBinding>,
) -> std::fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    write!(out, "| {heading} | Type |")?;
    for kind in kinds {
        write!(out, " {kind} |")?;
    }
    writeln!(out)?;
    writeln!(out, "|---|---|{}", "---|".repeat(kinds.len()))?;

    for param in params {
        write!(out, "| {} | `{}` |", param.name, cell(&types.display(param.ty)))?;
        for &kind in kinds {
            match lookup(kind, &param.name) {
                Some(b) => write!(out, " {} `{}` |", b.binding, b.wire_name)?,
                None => write!(out, " |")?,
            }
        }
        writeln!(out)?;
    }
    writeln!(out)
}

fn write_type(out: &mut String, name: &str, kind: &TypeKind, types: &TypeRegistry) -> std::fmt::Result {
    writeln!(out, "### {name}\n")?;
    match kind {
        TypeKind::Struct { fields } => {
            if fields.is_empty() {
                return writeln!(out, "Empty struct.\n");
            }
            writeln!(out, "| Field | Type | Description |")?;
            writeln!(out, "|---|---|---|")?;
            for field in fields {
                writeln!(
                    out,
                    "| {} | `{}` | {} |",
                    field.name,
                    cell(&types.display(field.ty)),
                    cell(field.tags.get(keys::DESC).unwrap_or(""))
                )?;
            }
            writeln!(out)
        }
        TypeKind::Alias { target } => writeln!(out, "Alias of `{}`.\n", types.display(*target)),
        TypeKind::Interface => writeln!(out, "Interface.\n"),
        _ => writeln!(out, "`{}`\n", name),
    }
}

/// Escape text for a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Anchor GitHub generates for a heading made of identifiers.
fn anchor(heading: &str) -> String {
    heading
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::go;
    use crate::model::builder::{build, BuildOptions};
    use std::path::Path;

    const SRC: &str = r#"// @tg title=`Shop API` version=2.1.0
package shop

// @tg http-server jsonRPC-server
// @tg desc=`Item catalog.`
type Catalog interface {
	// @tg http-method=GET http-path=/items/{id} summary=`Fetch | one item`
	GetItem(ctx context.Context, id string) (item Item, err error)
	// @tg deprecated http-method=DELETE http-path=/items/{id}
	DropItem(ctx context.Context, id string) error
}

type Item struct {
	ID   string // @tg desc=`primary key`
	Next *Item
}
"#;

    fn render() -> String {
        let file = go::parse(SRC, Path::new("shop.go")).unwrap();
        let transport = build(vec![file], &BuildOptions::default()).unwrap();
        MarkdownRenderer.render(&transport).unwrap()
    }

    #[test]
    fn header_and_index() {
        let md = render();
        assert!(md.starts_with("# Shop API\n\nVersion: 2.1.0\n"), "{md}");
        assert!(md.contains("* [Catalog](#catalog)"));
        assert!(md.contains("Transports: REST, JSON-RPC"));
    }

    #[test]
    fn method_table_sorted_and_escaped() {
        let md = render();
        let drop = md.find("| [DropItem](#catalogdropitem) | DELETE |").unwrap();
        let get = md.find("| [GetItem](#cataloggetitem) | GET | `/items/{id}` | `catalog.getItem` | Fetch \\| one item |").unwrap();
        assert!(drop < get);
        assert!(md.contains("**deprecated**"));
    }

    #[test]
    fn binding_tables() {
        let md = render();
        assert!(md.contains("| Parameter | Type | REST | JSON-RPC |"), "{md}");
        assert!(md.contains("| id | `string` | path `id` | rpc-params `id` |"), "{md}");
        assert!(md.contains("| item | `Item` | body `item` | body `item` |"), "{md}");
    }

    #[test]
    fn named_types_once() {
        let md = render();
        assert_eq!(md.matches("### Item\n").count(), 1);
        assert!(md.contains("| ID | `string` | primary key |"));
        assert!(md.contains("| Next | `*Item` |  |"));
    }

    #[test]
    fn anchors_drop_dots_and_lowercase() {
        assert_eq!(anchor("Catalog.GetItem"), "cataloggetitem");
        assert_eq!(anchor("Item list_v2"), "item-list_v2");
    }
}
