//! OpenAPI 3 / Swagger 2 documents as a route source

use serde_json::Value;
use slog::{Logger, debug, warn};

use super::{Framework, RouteSource, body_parameter, parse_parameter, str_field, string_or_list};
use crate::model::{ContentFormat, Endpoint, Method, ResponseSpec};

/// Maximum `$ref` nesting followed while resolving response schemas.
const MAX_REF_DEPTH: u32 = 20;

const METHODS: [(&str, Method); 7] = [
    ("get", Method::Get),
    ("post", Method::Post),
    ("put", Method::Put),
    ("delete", Method::Delete),
    ("patch", Method::Patch),
    ("head", Method::Head),
    ("options", Method::Options),
];

pub struct OpenApiSource;

impl RouteSource for OpenApiSource {
    fn framework(&self) -> Framework {
        Framework::OpenApi
    }

    fn probe(&self, host: &Value) -> bool {
        host.get("openapi").is_some() || host.get("swagger").is_some()
    }

    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint> {
        let Some(paths) = host.get("paths").and_then(Value::as_object) else {
            warn!(logger, "OpenAPI document has no paths object, no routes extracted");
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        for (path, path_item) in paths {
            for (key, method) in METHODS {
                let Some(operation) = path_item.get(key) else {
                    continue;
                };
                debug!(logger, "Reading operation"; "method" => key, "path" => path);
                endpoints.push(operation_endpoint(host, path, method, path_item, operation));
            }
        }
        endpoints
    }
}

fn operation_endpoint(
    doc: &Value,
    path: &str,
    method: Method,
    path_item: &Value,
    operation: &Value,
) -> Endpoint {
    let mut endpoint = Endpoint::new(method, path).with_path_parameters();
    endpoint.summary = str_field(operation, "summary").unwrap_or_default().to_string();
    endpoint.description = str_field(operation, "description")
        .unwrap_or_default()
        .to_string();
    endpoint.add_tags(string_or_list(operation.get("tags")));
    endpoint.deprecated = operation
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // path-level first so operation-level entries override them
    for source in [path_item.get("parameters"), operation.get("parameters")]
        .into_iter()
        .flatten()
    {
        let Some(params) = source.as_array() else {
            continue;
        };
        for param in params {
            if let Some(p) = parse_parameter(deref(param, doc)) {
                endpoint.push_parameter(p);
            }
        }
    }

    if let Some(body) = operation.get("requestBody").map(|b| deref(b, doc)) {
        // body schemas stay as declared; the value generator treats any
        // `$ref` inside them as an empty mapping
        if let Some(schema) = body
            .get("content")
            .and_then(|c| c.get("application/json"))
            .and_then(|ct| ct.get("schema"))
        {
            let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
            endpoint.push_parameter(body_parameter(schema, required));
        }
    }

    if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
        for (status, response) in responses {
            let Ok(code) = status.parse::<u16>() else {
                continue;
            };
            let response = resolve_refs(response, doc);
            endpoint.set_response(response_spec(code, &response));
        }
    }

    if endpoint.responses.is_empty() {
        endpoint = endpoint.with_default_responses();
    }
    endpoint
}

fn response_spec(code: u16, response: &Value) -> ResponseSpec {
    let description = str_field(response, "description").unwrap_or_default();
    let mut spec = ResponseSpec::new(code, description);

    if let Some(content) = response.get("content").and_then(Value::as_object) {
        if let Some(media) = content.keys().next() {
            spec = spec.with_format(ContentFormat::from_media_type(media));
        }
        if let Some(schema) = content
            .get("application/json")
            .or_else(|| content.values().next())
            .and_then(|ct| ct.get("schema"))
        {
            spec = spec.with_schema(schema.clone());
        }
    } else if let Some(schema) = response.get("schema") {
        // Swagger 2
        spec = spec.with_schema(schema.clone());
    }
    spec
}

/// Follow a top-level `$ref` of a parameter or request body object.
fn deref<'a>(node: &'a Value, doc: &'a Value) -> &'a Value {
    str_field(node, "$ref")
        .and_then(|target| target.strip_prefix('#'))
        .and_then(|ptr| doc.pointer(ptr))
        .unwrap_or(node)
}

/// Recursively inline `$ref` pointers (`#/components/...`, `#/definitions/...`).
///
/// Unresolvable refs are left in place; depth is capped to survive cycles.
fn resolve_refs(node: &Value, doc: &Value) -> Value {
    resolve_refs_inner(node, doc, 0)
}

fn resolve_refs_inner(node: &Value, doc: &Value, depth: u32) -> Value {
    if depth > MAX_REF_DEPTH {
        return node.clone();
    }
    match node {
        Value::Object(obj) => {
            if let Some(target) = obj.get("$ref").and_then(Value::as_str) {
                return match target.strip_prefix('#').and_then(|ptr| doc.pointer(ptr)) {
                    Some(resolved) => resolve_refs_inner(resolved, doc, depth + 1),
                    None => node.clone(),
                };
            }
            Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), resolve_refs_inner(v, doc, depth + 1)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_refs_inner(v, doc, depth + 1))
                .collect(),
        ),
        _ => node.clone(),
    }
}
