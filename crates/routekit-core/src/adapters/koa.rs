//! Koa (`@koa/router`): `app.router.stack`
//!
//! Layers carry `path` and an upper-case `methods` array; the router adds an
//! implicit HEAD to every GET layer, which is dropped here.

use serde_json::Value;
use slog::{Logger, debug, warn};

use super::{Framework, RouteSource, str_field, string_or_list};
use crate::model::{Endpoint, Method};
use crate::path::join_paths;

pub struct KoaSource;

impl RouteSource for KoaSource {
    fn framework(&self) -> Framework {
        Framework::Koa
    }

    fn probe(&self, host: &Value) -> bool {
        host.get("middleware").is_some_and(Value::is_array)
            && host.get("router").and_then(|r| r.get("stack")).is_some()
    }

    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint> {
        let router = host.get("router").unwrap_or(host);
        let Some(stack) = router.get("stack").and_then(Value::as_array) else {
            warn!(logger, "Koa router stack not found, no routes extracted");
            return Vec::new();
        };

        let prefix = router
            .get("opts")
            .and_then(|o| str_field(o, "prefix"))
            .unwrap_or("");

        let mut endpoints = Vec::new();
        walk_stack(stack, prefix, logger, &mut endpoints);
        endpoints
    }
}

fn walk_stack(stack: &[Value], base: &str, logger: &Logger, out: &mut Vec<Endpoint>) {
    for layer in stack {
        let Some(path) = str_field(layer, "path") else {
            debug!(logger, "Skipping Koa layer without path"; "base" => base);
            continue;
        };
        let full = join_paths(base, path);

        // Nested router mounted via `router.use(path, other.routes())`
        if let Some(inner) = layer
            .get("router")
            .and_then(|r| r.get("stack"))
            .or_else(|| layer.get("stack").filter(|s| s.is_array() && layer.get("methods").is_none()))
            .and_then(Value::as_array)
        {
            walk_stack(inner, &full, logger, out);
            continue;
        }

        let names = string_or_list(layer.get("methods"));
        let mut methods: Vec<Method> = names.iter().filter_map(|m| m.parse().ok()).collect();
        if methods.contains(&Method::Get) {
            methods.retain(|m| *m != Method::Head);
        }
        if methods.is_empty() {
            // router-level middleware (`router.use(fn)`)
            continue;
        }

        for method in methods {
            let mut endpoint = Endpoint::new(method, &full)
                .with_path_parameters()
                .with_default_responses();
            if let Some(name) = str_field(layer, "name") {
                endpoint.summary = name.to_string();
            }
            out.push(endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn extracts_layers_and_drops_implicit_head() {
        let host = json!({"middleware": [], "router": {"stack": [
            {"path": "/users/:id", "methods": ["HEAD", "GET"], "name": "get-user"},
            {"path": "/users", "methods": ["POST"]},
            {"path": "/ping", "methods": ["HEAD"]},
            {"path": "(.*)", "methods": []}
        ]}});
        let eps = KoaSource.extract(&host, &logger());
        let labels: Vec<String> = eps.iter().map(Endpoint::label).collect();
        assert_eq!(labels, vec!["GET /users/:id", "POST /users", "HEAD /ping"]);
        assert_eq!(eps[0].summary, "get-user");
        assert_eq!(eps[0].parameters[0].name, "id");
    }

    #[test]
    fn applies_router_prefix_and_nesting() {
        let host = json!({"middleware": [], "router": {
            "opts": {"prefix": "/api/"},
            "stack": [
                {"path": "/admin", "router": {"stack": [
                    {"path": "/stats", "methods": ["GET"]}
                ]}}
            ]
        }});
        let eps = KoaSource.extract(&host, &logger());
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].path, "/api/admin/stats");
    }

    #[test]
    fn missing_stack_yields_empty() {
        assert!(KoaSource.extract(&json!({"middleware": []}), &logger()).is_empty());
    }
}
