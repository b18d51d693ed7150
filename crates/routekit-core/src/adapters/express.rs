//! Express: `app._router.stack`
//!
//! Route layers carry `route.path` and `route.methods`; router layers carry a
//! nested `handle.stack` and a mount `regexp` (Express 4) or `path`.

use serde_json::Value;
use slog::{Logger, debug, warn};

use super::{Framework, RouteSource, str_field, string_or_list};
use crate::model::{Endpoint, Method};
use crate::path::join_paths;

/// Marker produced by Express 4 for a mounted router's path regexp.
const MOUNT_SUFFIX: &str = "\\/?(?=\\/|$)";

/// Express 4 capture group for one `:param` in a mount path.
const PARAM_GROUP: &str = "(?:([^\\/]+?))";

pub struct ExpressSource;

impl RouteSource for ExpressSource {
    fn framework(&self) -> Framework {
        Framework::Express
    }

    fn probe(&self, host: &Value) -> bool {
        host.get("_router").is_some()
    }

    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint> {
        let Some(stack) = host
            .get("_router")
            .and_then(|r| r.get("stack"))
            .and_then(Value::as_array)
        else {
            warn!(logger, "Express router stack not found, no routes extracted");
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        walk_stack(stack, "", logger, &mut endpoints);
        endpoints
    }
}

fn walk_stack(stack: &[Value], base: &str, logger: &Logger, out: &mut Vec<Endpoint>) {
    for layer in stack {
        if let Some(route) = layer.get("route") {
            push_route(route, base, logger, out);
        } else if let Some(inner) = layer
            .get("handle")
            .and_then(|h| h.get("stack"))
            .and_then(Value::as_array)
        {
            match mount_path(layer) {
                Some(mount) => walk_stack(inner, &join_paths(base, &mount), logger, out),
                None => debug!(
                    logger,
                    "Skipping router with underivable mount path";
                    "base" => base
                ),
            }
        }
    }
}

fn push_route(route: &Value, base: &str, logger: &Logger, out: &mut Vec<Endpoint>) {
    let paths = string_or_list(route.get("path"));
    if paths.is_empty() {
        debug!(logger, "Skipping route without a string path"; "base" => base);
        return;
    }

    // `methods` is `{ "get": true, "_all": true, ... }`
    let methods: Vec<Method> = route
        .get("methods")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter(|(_, enabled)| enabled.as_bool().unwrap_or(false))
                .filter_map(|(name, _)| name.parse().ok())
                .collect()
        })
        .unwrap_or_default();

    for raw in &paths {
        let full = join_paths(base, raw);
        for &method in &methods {
            out.push(
                Endpoint::new(method, &full)
                    .with_path_parameters()
                    .with_default_responses(),
            );
        }
    }
}

/// Mount path of a router layer: explicit `path`, else derived from `regexp`.
fn mount_path(layer: &Value) -> Option<String> {
    if let Some(path) = str_field(layer, "path") {
        return Some(path.to_string());
    }
    match layer.get("regexp") {
        Some(Value::String(source)) => {
            let keys: Vec<&str> = layer
                .get("keys")
                .and_then(Value::as_array)
                .map(|k| k.iter().filter_map(|key| str_field(key, "name")).collect())
                .unwrap_or_default();
            path_from_regexp(source, &keys)
        }
        // `{ "fast_slash": true }` is Express's root mount
        Some(Value::Object(obj)) if obj.get("fast_slash").and_then(Value::as_bool) == Some(true) => {
            Some(String::new())
        }
        None => Some(String::new()),
        _ => None,
    }
}

/// Reverse an Express 4 mount regexp such as `/^\/api\/?(?=\/|$)/i` into `/api`.
///
/// Capture groups are replaced by `:name` from `keys`, in order. Returns
/// `None` for anything that still contains regex syntax afterwards.
fn path_from_regexp(source: &str, keys: &[&str]) -> Option<String> {
    let mut body = source;
    if let Some(stripped) = body.strip_prefix('/') {
        // literal form: strip the closing delimiter and flags
        body = stripped.rfind('/').map_or(stripped, |end| &stripped[..end]);
    }
    body = body.strip_prefix('^').unwrap_or(body);
    body = body.split(MOUNT_SUFFIX).next().unwrap_or(body);
    body = body.strip_suffix("\\/?$").unwrap_or(body);

    let mut path = String::new();
    let mut rest = body;
    let mut key_iter = keys.iter();
    while let Some(pos) = rest.find(PARAM_GROUP) {
        path.push_str(&rest[..pos]);
        path.push(':');
        path.push_str(key_iter.next()?);
        rest = &rest[pos + PARAM_GROUP.len()..];
    }
    path.push_str(rest);

    let path = path.replace("\\/", "/").replace("\\.", ".").replace("\\-", "-");
    if path.contains(['(', ')', '[', ']', '*', '+', '?', '$', '^', '|', '\\']) {
        return None;
    }
    Some(path)
}
