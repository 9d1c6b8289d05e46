//! Binding resolver: decide where every parameter and result travels.
//!
//! Resolution is a pure function of the method signature, its resolved tags
//! and the transport kind. The call context (first argument) and a trailing
//! error result never receive a binding.
//!
//! REST precedence, first match wins per parameter:
//!
//! 1. explicit `in` on the parameter's own tags
//! 2. `http-headers` / `http-cookies` entries (`param` or `param|Wire-Name`)
//! 3. `http-args` entries: path when the route has a matching placeholder,
//!    query otherwise
//! 4. the rest: path on a placeholder match, body when the verb permits one,
//!    query otherwise
//!
//! Binding the same parameter from two sources is an error, not a tie-break.

use crate::error::{BindingError, BindingErrorKind, ConfigError};
use crate::model::{
    Binding, Bindings, HttpRoute, HttpVerb, Method, Parameter, TransportKind, WireBinding,
};
use crate::tags::{keys, DocTags};
use regex::Regex;
use std::sync::LazyLock;

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}|:([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Derive the REST route of `method` from its resolved tags.
pub fn http_route(service: &str, method: &str, tags: &DocTags) -> Result<HttpRoute, ConfigError> {
    let invalid = |key: &'static str, value: &str| ConfigError::InvalidTag {
        service: service.to_string(),
        method: method.to_string(),
        key,
        value: value.to_string(),
    };

    let verb = match tags.get(keys::HTTP_METHOD) {
        Some(raw) => raw
            .parse::<HttpVerb>()
            .map_err(|_| invalid(keys::HTTP_METHOD, raw))?,
        None => HttpVerb::Post,
    };

    let path = match tags.get(keys::HTTP_PATH) {
        Some(path) => path.to_string(),
        None => format!("/{}/{}", lower_first(service), lower_first(method)),
    };
    let path = join_path(tags.get(keys::HTTP_PREFIX).unwrap_or(""), &path);

    let success = match tags.get(keys::HTTP_SUCCESS) {
        Some(raw) => raw
            .parse::<u16>()
            .ok()
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| invalid(keys::HTTP_SUCCESS, raw))?,
        None => 200,
    };

    let content_type = |key| tags.get(key).unwrap_or(DEFAULT_CONTENT_TYPE).to_string();

    Ok(HttpRoute {
        verb,
        path,
        success,
        request_content_type: content_type(keys::REQUEST_CONTENT_TYPE),
        response_content_type: content_type(keys::RESPONSE_CONTENT_TYPE),
    })
}

/// JSON-RPC method name: `service.method`, first letters lowered.
pub fn rpc_method_name(service: &str, method: &str) -> String {
    format!("{}.{}", lower_first(service), lower_first(method))
}

/// Placeholder names in a route template, in order of appearance.
pub fn placeholders(path: &str) -> Vec<String> {
    RE_PLACEHOLDER
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolve every wire binding of `method` under `kind`.
pub fn resolve(method: &Method, kind: TransportKind) -> Result<Bindings, BindingError> {
    let fail = |kind_err: BindingErrorKind| BindingError {
        service: method.service.clone(),
        method: method.name.clone(),
        transport: kind,
        kind: kind_err,
    };
    match kind {
        TransportKind::JsonRpc => Ok(resolve_json_rpc(method)),
        TransportKind::Rest => {
            let route = method.http.as_ref().ok_or_else(|| fail(BindingErrorKind::NoRoute))?;
            resolve_rest(method, route).map_err(fail)
        }
    }
}

fn resolve_json_rpc(method: &Method) -> Bindings {
    Bindings {
        params: method
            .arguments()
            .iter()
            .map(|p| bind(p, Binding::RpcParams, p.name.clone()))
            .collect(),
        results: method
            .outputs()
            .iter()
            .map(|p| bind(p, Binding::Body, p.name.clone()))
            .collect(),
    }
}

/// Per-parameter slot while REST resolution is in progress.
type Slot = Option<(Binding, String)>;

fn resolve_rest(method: &Method, route: &HttpRoute) -> Result<Bindings, BindingErrorKind> {
    let args = method.arguments();
    let outputs = method.outputs();
    let holes = placeholders(&route.path);
    let mut arg_slots: Vec<Slot> = vec![None; args.len()];
    let mut out_slots: Vec<Slot> = vec![None; outputs.len()];

    // 1. explicit locations
    for (slot, param) in arg_slots.iter_mut().zip(args) {
        if let Some(location) = explicit_location(param)? {
            *slot = Some((location, wire_name(param)));
        }
    }
    for (slot, param) in out_slots.iter_mut().zip(outputs) {
        if let Some(location) = explicit_location(param)? {
            if matches!(location, Binding::Path | Binding::Query) {
                return Err(BindingErrorKind::ResultLocation {
                    name: param.name.clone(),
                    location,
                });
            }
            *slot = Some((location, wire_name(param)));
        }
    }

    // 2. header and cookie lists
    for (key, location) in [
        (keys::HTTP_HEADERS, Binding::Header),
        (keys::HTTP_COOKIES, Binding::Cookie),
    ] {
        for entry in method.tags.values(key) {
            let (name, wire) = split_entry(entry);
            if let Some(i) = args.iter().position(|p| p.name == name) {
                let wire = wire.map(str::to_string).unwrap_or_else(|| wire_name(&args[i]));
                assign(&mut arg_slots[i], name, location, wire)?;
            } else if let Some(i) = outputs.iter().position(|p| p.name == name) {
                let wire = wire.map(str::to_string).unwrap_or_else(|| wire_name(&outputs[i]));
                assign(&mut out_slots[i], name, location, wire)?;
            }
            // Entries naming neither may be inherited from the interface
            // scope for a sibling method; they do not apply here.
        }
    }

    // 3. explicit path/query arguments
    for entry in method.tags.values(keys::HTTP_ARGS) {
        let (name, wire) = split_entry(entry);
        let Some(i) = args.iter().position(|p| p.name == name) else {
            return Err(BindingErrorKind::UnknownArgument {
                key: keys::HTTP_ARGS,
                name: name.to_string(),
            });
        };
        let wire = wire.map(str::to_string).unwrap_or_else(|| wire_name(&args[i]));
        let (location, wire) = match matching_hole(&holes, &args[i], &wire) {
            Some(hole) => (Binding::Path, hole.to_string()),
            None => (Binding::Query, wire),
        };
        assign(&mut arg_slots[i], name, location, wire)?;
    }

    // 4. defaults
    for (slot, param) in arg_slots.iter_mut().zip(args) {
        if slot.is_some() {
            continue;
        }
        let wire = wire_name(param);
        *slot = Some(match matching_hole(&holes, param, &wire) {
            Some(hole) => (Binding::Path, hole.to_string()),
            None if route.verb.permits_body() => (Binding::Body, wire),
            None => (Binding::Query, wire),
        });
    }
    for (slot, param) in out_slots.iter_mut().zip(outputs) {
        if slot.is_none() {
            *slot = Some((Binding::Body, wire_name(param)));
        }
    }

    let params = collect(args, arg_slots);
    let results = collect(outputs, out_slots);

    let body: Vec<String> = params
        .iter()
        .filter(|b| b.binding == Binding::Body)
        .map(|b| b.param.clone())
        .collect();
    if body.len() > 1 {
        return Err(BindingErrorKind::MultipleBody(body));
    }

    for b in params.iter().filter(|b| b.binding == Binding::Path) {
        if !holes.contains(&b.wire_name) {
            return Err(BindingErrorKind::MissingPlaceholder {
                param: b.param.clone(),
                route: route.path.clone(),
            });
        }
    }
    for hole in &holes {
        let bound = params
            .iter()
            .any(|b| b.binding == Binding::Path && &b.wire_name == hole);
        if !bound {
            return Err(BindingErrorKind::UnmatchedPlaceholder(hole.clone()));
        }
    }

    Ok(Bindings { params, results })
}

fn explicit_location(param: &Parameter) -> Result<Option<Binding>, BindingErrorKind> {
    let Some(raw) = param.tags.get(keys::IN) else {
        return Ok(None);
    };
    let location = match raw {
        "path" => Binding::Path,
        "query" => Binding::Query,
        "header" => Binding::Header,
        "cookie" => Binding::Cookie,
        "body" => Binding::Body,
        _ => {
            return Err(BindingErrorKind::UnknownLocation {
                name: param.name.clone(),
                location: raw.to_string(),
            })
        }
    };
    Ok(Some(location))
}

fn assign(slot: &mut Slot, name: &str, location: Binding, wire: String) -> Result<(), BindingErrorKind> {
    if slot.is_some() {
        return Err(BindingErrorKind::BoundTwice(name.to_string()));
    }
    *slot = Some((location, wire));
    Ok(())
}

/// The placeholder a parameter fills, matched by wire name or declared name.
fn matching_hole<'h>(holes: &'h [String], param: &Parameter, wire: &str) -> Option<&'h str> {
    holes
        .iter()
        .find(|h| h.as_str() == wire || h.as_str() == param.name)
        .map(String::as_str)
}

fn collect(params: &[Parameter], slots: Vec<Slot>) -> Vec<WireBinding> {
    params
        .iter()
        .zip(slots)
        .filter_map(|(p, slot)| slot.map(|(binding, wire)| bind(p, binding, wire)))
        .collect()
}

fn bind(param: &Parameter, binding: Binding, wire_name: String) -> WireBinding {
    WireBinding {
        param: param.name.clone(),
        binding,
        wire_name,
    }
}

fn wire_name(param: &Parameter) -> String {
    param
        .tags
        .get(keys::NAME)
        .unwrap_or(&param.name)
        .to_string()
}

/// `param|Wire-Name` → (`param`, Some(`Wire-Name`)).
fn split_entry(entry: &str) -> (&str, Option<&str>) {
    match entry.split_once('|') {
        Some((name, wire)) if !wire.trim().is_empty() => (name.trim(), Some(wire.trim())),
        Some((name, _)) => (name.trim(), None),
        None => (entry.trim(), None),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        format!("/{path}")
    } else {
        format!("/{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use crate::tags::parse;
    use crate::types::TypeId;
    use std::collections::BTreeMap;

    fn param(name: &str, position: Position, docs: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            ty: TypeId::default(),
            tags: parse(docs).unwrap(),
            position,
        }
    }

    /// `ctx` plus `args`, results plus a trailing `err`.
    fn method(tags: &str, args: &[(&str, &str)], results: &[&str]) -> Method {
        let tags = parse(tags).unwrap();
        let mut params = vec![param("ctx", Position::Argument(0), "")];
        for (i, (name, docs)) in args.iter().enumerate() {
            params.push(param(name, Position::Argument(i + 1), docs));
        }
        let mut outs: Vec<Parameter> = results
            .iter()
            .enumerate()
            .map(|(i, name)| param(name, Position::Result(i), ""))
            .collect();
        outs.push(param("err", Position::Result(results.len()), ""));
        let http = http_route("Catalog", "GetItem", &tags).ok();
        Method {
            service: "Catalog".to_string(),
            name: "GetItem".to_string(),
            params,
            results: outs,
            tags,
            http,
            rpc_name: None,
            bindings: BTreeMap::new(),
            deprecated: false,
            experimental: false,
            returns_error: true,
        }
    }

    fn rest(m: &Method) -> Result<Bindings, BindingErrorKind> {
        resolve(m, TransportKind::Rest).map_err(|e| e.kind)
    }

    #[test]
    fn get_item_binds_id_to_path_and_item_to_body() {
        let m = method("@tg http-method=GET http-path=/items/{id}", &[("id", "")], &["item"]);
        let b = rest(&m).unwrap();
        assert_eq!(b.param("id").unwrap().binding, Binding::Path);
        assert_eq!(b.result("item").unwrap().binding, Binding::Body);
        assert!(b.param("ctx").is_none());
        assert!(b.result("err").is_none());
    }

    #[test]
    fn post_without_placeholder_sends_single_argument_as_body() {
        let m = method("@tg http-method=POST http-path=/items", &[("id", "")], &["item"]);
        let b = rest(&m).unwrap();
        assert_eq!(b.param("id").unwrap().binding, Binding::Body);
        assert_eq!(b.body().unwrap().param, "id");
    }

    #[test]
    fn post_with_two_body_candidates_fails() {
        let m = method(
            "@tg http-method=POST http-path=/items",
            &[("id", ""), ("item", "")],
            &[],
        );
        assert_eq!(
            rest(&m).unwrap_err(),
            BindingErrorKind::MultipleBody(vec!["id".to_string(), "item".to_string()])
        );
    }

    #[test]
    fn get_sends_leftovers_as_query() {
        let m = method("@tg http-method=GET http-path=/items", &[("page", ""), ("size", "")], &["items"]);
        let b = rest(&m).unwrap();
        assert_eq!(b.param("page").unwrap().binding, Binding::Query);
        assert_eq!(b.param("size").unwrap().binding, Binding::Query);
    }

    #[test]
    fn http_args_disambiguate_body() {
        let m = method(
            "@tg http-method=PUT http-path=/items/:id http-args=id,version",
            &[("id", ""), ("version", ""), ("item", "")],
            &[],
        );
        let b = rest(&m).unwrap();
        assert_eq!(b.param("id").unwrap().binding, Binding::Path);
        assert_eq!(b.param("version").unwrap().binding, Binding::Query);
        assert_eq!(b.param("item").unwrap().binding, Binding::Body);
    }

    #[test]
    fn headers_and_cookies_apply_to_args_and_results() {
        let m = method(
            "@tg http-method=GET http-path=/me http-headers=token|X-Auth-Token,etag|ETag http-cookies=session",
            &[("token", ""), ("session", "")],
            &["profile", "etag"],
        );
        let b = rest(&m).unwrap();
        let token = b.param("token").unwrap();
        assert_eq!((token.binding, token.wire_name.as_str()), (Binding::Header, "X-Auth-Token"));
        assert_eq!(b.param("session").unwrap().binding, Binding::Cookie);
        assert_eq!(b.result("etag").unwrap().binding, Binding::Header);
        assert_eq!(b.result("profile").unwrap().binding, Binding::Body);
    }

    #[test]
    fn explicit_parameter_location_and_wire_name() {
        let m = method(
            "@tg http-method=POST http-path=/items",
            &[("trace", "@tg in=header name=X-Trace-Id"), ("item", "")],
            &[],
        );
        let b = rest(&m).unwrap();
        let trace = b.param("trace").unwrap();
        assert_eq!((trace.binding, trace.wire_name.as_str()), (Binding::Header, "X-Trace-Id"));
        assert_eq!(b.param("item").unwrap().binding, Binding::Body);
    }

    #[test]
    fn explicit_path_without_placeholder_fails() {
        let m = method("@tg http-method=GET http-path=/items", &[("id", "@tg in=path")], &[]);
        assert!(matches!(
            rest(&m).unwrap_err(),
            BindingErrorKind::MissingPlaceholder { ref param, .. } if param == "id"
        ));
    }

    #[test]
    fn placeholder_without_parameter_fails() {
        let m = method("@tg http-method=GET http-path=/items/{sku}", &[("id", "")], &[]);
        assert_eq!(
            rest(&m).unwrap_err(),
            BindingErrorKind::UnmatchedPlaceholder("sku".to_string())
        );
    }

    #[test]
    fn placeholder_taken_by_query_binding_fails() {
        let m = method("@tg http-method=GET http-path=/items/{id}", &[("id", "@tg in=query")], &[]);
        assert_eq!(
            rest(&m).unwrap_err(),
            BindingErrorKind::UnmatchedPlaceholder("id".to_string())
        );
    }

    #[test]
    fn double_binding_fails() {
        let m = method(
            "@tg http-method=GET http-path=/items http-headers=id",
            &[("id", "@tg in=query")],
            &[],
        );
        assert_eq!(rest(&m).unwrap_err(), BindingErrorKind::BoundTwice("id".to_string()));
    }

    #[test]
    fn unknown_http_arg_fails() {
        let m = method("@tg http-method=GET http-path=/items http-args=nope", &[("id", "")], &[]);
        assert!(matches!(
            rest(&m).unwrap_err(),
            BindingErrorKind::UnknownArgument { ref name, .. } if name == "nope"
        ));
    }

    #[test]
    fn inherited_header_for_sibling_method_is_ignored() {
        let m = method("@tg http-method=GET http-path=/items http-headers=requestID", &[("id", "")], &[]);
        assert_eq!(rest(&m).unwrap().param("id").unwrap().binding, Binding::Query);
    }

    #[test]
    fn results_cannot_travel_in_query() {
        let mut m = method("@tg http-method=GET http-path=/items", &[], &["item"]);
        m.results[0].tags = parse("@tg in=query").unwrap();
        assert!(matches!(
            rest(&m).unwrap_err(),
            BindingErrorKind::ResultLocation { location: Binding::Query, .. }
        ));
    }

    #[test]
    fn unknown_location_fails() {
        let m = method("@tg http-method=GET http-path=/items", &[("id", "@tg in=matrix")], &[]);
        assert!(matches!(rest(&m).unwrap_err(), BindingErrorKind::UnknownLocation { .. }));
    }

    #[test]
    fn json_rpc_binds_everything_to_params() {
        let m = method("@tg http-method=GET http-path=/items/{id}", &[("id", ""), ("page", "@tg in=query")], &["item"]);
        let b = resolve(&m, TransportKind::JsonRpc).unwrap();
        assert!(b.params.iter().all(|p| p.binding == Binding::RpcParams));
        assert_eq!(b.params.len(), 2);
        assert_eq!(b.result("item").unwrap().binding, Binding::Body);
    }

    #[test]
    fn json_rpc_ignores_rest_wire_names() {
        let mut m = method(
            "@tg http-method=POST http-path=/items",
            &[("trace", "@tg in=header name=X-Trace-Id"), ("item", "")],
            &["etag"],
        );
        m.results[0].tags = parse("@tg in=header name=ETag").unwrap();
        let b = resolve(&m, TransportKind::JsonRpc).unwrap();
        assert_eq!(b.param("trace").unwrap().wire_name, "trace");
        assert_eq!(b.result("etag").unwrap().wire_name, "etag");
    }

    #[test]
    fn http_arg_with_wire_name_fills_placeholder_by_declared_name() {
        let m = method(
            "@tg http-method=GET http-path=/items/{id} http-args=id|ident,page|p",
            &[("id", ""), ("page", "")],
            &[],
        );
        let b = rest(&m).unwrap();
        let id = b.param("id").unwrap();
        assert_eq!((id.binding, id.wire_name.as_str()), (Binding::Path, "id"));
        let page = b.param("page").unwrap();
        assert_eq!((page.binding, page.wire_name.as_str()), (Binding::Query, "p"));
    }

    #[test]
    fn every_argument_bound_exactly_once() {
        let m = method(
            "@tg http-method=PATCH http-path=/items/{id} http-headers=etag|If-Match",
            &[("id", ""), ("etag", ""), ("patch", "")],
            &["item"],
        );
        let b = rest(&m).unwrap();
        let names: Vec<&str> = b.params.iter().map(|p| p.param.as_str()).collect();
        assert_eq!(names, ["id", "etag", "patch"]);
        assert_eq!(b.params.iter().filter(|p| p.binding == Binding::Body).count(), 1);
    }

    #[test]
    fn missing_route_is_reported() {
        let mut m = method("", &[], &[]);
        m.http = None;
        assert_eq!(rest(&m).unwrap_err(), BindingErrorKind::NoRoute);
    }

    #[test]
    fn route_defaults_and_prefix() {
        let route = http_route("Catalog", "GetItem", &parse("@tg http-prefix=/api/v1/").unwrap()).unwrap();
        assert_eq!(route.verb, HttpVerb::Post);
        assert_eq!(route.path, "/api/v1/catalog/getItem");
        assert_eq!(route.success, 200);
        assert_eq!(route.request_content_type, "application/json");
    }

    #[test]
    fn invalid_verb_and_status_are_config_errors() {
        let bad_verb = http_route("Catalog", "GetItem", &parse("@tg http-method=FETCH").unwrap());
        assert!(matches!(bad_verb, Err(ConfigError::InvalidTag { key: keys::HTTP_METHOD, .. })));
        let bad_code = http_route("Catalog", "GetItem", &parse("@tg http-success=42").unwrap());
        assert!(matches!(bad_code, Err(ConfigError::InvalidTag { key: keys::HTTP_SUCCESS, .. })));
    }

    #[test]
    fn placeholder_styles() {
        assert_eq!(placeholders("/a/{id}/b/:name"), ["id", "name"]);
        assert!(placeholders("/plain").is_empty());
    }

    #[test]
    fn rpc_names_lower_first_letters() {
        assert_eq!(rpc_method_name("Catalog", "GetItem"), "catalog.getItem");
    }
}
