//! JSON renderer: structured IR dump for tooling integration.
//!
//! Serializes the Transport model directly. Services and methods come out in
//! name order; named types appear once in `types.nodes` and are referenced
//! everywhere else by index.

use crate::model::Transport;
use crate::render::{RenderError, Renderer};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, transport: &Transport) -> Result<String, RenderError> {
        let mut out = serde_json::to_string_pretty(transport).map_err(|e| RenderError::new(self.name(), e))?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::FileDecl;
    use crate::model::builder::{build, BuildOptions};
    use serde_json::Value;

    fn render(json: &str) -> Value {
        let file: FileDecl = serde_json::from_str(json).unwrap();
        let transport = build(vec![file], &BuildOptions::default()).unwrap();
        serde_json::from_str(&JsonRenderer.render(&transport).unwrap()).unwrap()
    }

    #[test]
    fn dumps_routes_and_bindings() {
        let v = render(
            r#"{
            "path": "catalog.json",
            "interfaces": [{
                "name": "Catalog",
                "docs": "@tg http-server",
                "methods": [{
                    "name": "GetItem",
                    "docs": "@tg http-method=GET http-path=/items/{id}",
                    "params": [{"name": "ctx", "type": "context.Context"}, {"name": "id", "type": "string"}],
                    "results": [{"name": "item", "type": "Item"}, {"type": "error"}]
                }]
            }],
            "types": [{"name": "Item", "kind": "struct", "fields": [{"name": "Next", "type": "*Item"}]}]
        }"#,
        );
        let method = &v["services"]["Catalog"]["methods"][0];
        assert_eq!(method["http"]["verb"], "GET");
        assert_eq!(method["http"]["path"], "/items/{id}");
        assert_eq!(method["bindings"]["rest"]["params"][0]["binding"], "path");
        assert_eq!(method["bindings"]["rest"]["results"][0]["binding"], "body");
        assert_eq!(method["tags"]["http-method"], "GET");
        assert_eq!(v["services"]["Catalog"]["transports"][0], "rest");

        let item = method["results"][0]["type"].as_u64().unwrap() as usize;
        assert_eq!(v["types"]["nodes"][item]["name"], "Item");
        assert_eq!(v["types"]["nodes"][item]["kind"], "struct");
    }
}
