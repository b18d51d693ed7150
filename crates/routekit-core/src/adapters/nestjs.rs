//! NestJS: controller and handler metadata from the module container
//!
//! Snapshot shape:
//!
//! ```json
//! { "globalPrefix": "api", "container": {}, "controllers": [
//!     { "name": "UsersController",
//!       "metadata": { "path": "users", "swagger/apiUseTags": ["users"] },
//!       "handlers": [
//!         { "name": "findOne",
//!           "metadata": { "path": ":id", "method": 0,
//!                         "swagger/apiOperation": { "summary": "Find one" } } } ] } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::{Logger, debug, warn};

use super::{Framework, RouteSource, parse_parameter, str_field, string_or_list};
use crate::model::{Endpoint, Method, ResponseSpec};
use crate::path::join_paths;

/// Reflect-metadata keys read from controllers and handlers.
///
/// These are constants of `@nestjs/common` and `@nestjs/swagger`; older
/// swagger releases used `swagger/apiUseTags`, newer ones `swagger/apiTags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestMetadataKeys {
    pub path: String,
    pub method: String,
    pub operation: String,
    pub parameters: String,
    pub responses: String,
    pub tags: String,
}

impl Default for NestMetadataKeys {
    fn default() -> Self {
        Self {
            path: "path".to_string(),
            method: "method".to_string(),
            operation: "swagger/apiOperation".to_string(),
            parameters: "swagger/apiParameters".to_string(),
            responses: "swagger/apiResponse".to_string(),
            tags: "swagger/apiUseTags".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NestSource {
    keys: NestMetadataKeys,
}

impl NestSource {
    #[must_use]
    pub fn new(keys: NestMetadataKeys) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &NestMetadataKeys {
        &self.keys
    }

    fn handler_endpoints(
        &self,
        base: &str,
        controller_tags: &[String],
        handler: &Value,
        logger: &Logger,
    ) -> Vec<Endpoint> {
        let Some(meta) = handler.get("metadata") else {
            return Vec::new();
        };
        let Some(method) = meta.get(&self.keys.method).and_then(request_method) else {
            debug!(
                logger, "Skipping handler without a routable method";
                "handler" => str_field(handler, "name").unwrap_or("?")
            );
            return Vec::new();
        };

        let mut paths = string_or_list(meta.get(&self.keys.path));
        if paths.is_empty() {
            paths.push(String::new());
        }

        paths
            .iter()
            .map(|sub| {
                let mut endpoint = Endpoint::new(method, &join_paths(base, sub)).with_path_parameters();
                self.apply_metadata(&mut endpoint, controller_tags, meta);
                if endpoint.responses.is_empty() {
                    endpoint = endpoint.with_default_responses();
                }
                endpoint
            })
            .collect()
    }

    fn apply_metadata(&self, endpoint: &mut Endpoint, controller_tags: &[String], meta: &Value) {
        if let Some(op) = meta.get(&self.keys.operation) {
            endpoint.summary = str_field(op, "summary")
                .or_else(|| str_field(op, "title"))
                .unwrap_or_default()
                .to_string();
            endpoint.description = str_field(op, "description").unwrap_or_default().to_string();
            endpoint.deprecated = op.get("deprecated").and_then(Value::as_bool).unwrap_or(false);
        }

        endpoint.add_tags(controller_tags.iter().cloned());
        endpoint.add_tags(string_or_list(meta.get(&self.keys.tags)));

        if let Some(params) = meta.get(&self.keys.parameters).and_then(Value::as_array) {
            for p in params.iter().filter_map(parse_parameter) {
                endpoint.push_parameter(p);
            }
        }

        match meta.get(&self.keys.responses) {
            // `{ "200": { "description": ..., "type": ... } }`
            Some(Value::Object(by_status)) => {
                for (status, response) in by_status {
                    if let Ok(code) = status.parse::<u16>() {
                        endpoint.set_response(response_spec(code, response));
                    }
                }
            }
            // `[{ "status": 200, ... }]`
            Some(Value::Array(list)) => {
                for response in list {
                    if let Some(code) = response
                        .get("status")
                        .and_then(Value::as_u64)
                        .and_then(|c| u16::try_from(c).ok())
                    {
                        endpoint.set_response(response_spec(code, response));
                    }
                }
            }
            _ => {}
        }
    }
}

impl RouteSource for NestSource {
    fn framework(&self) -> Framework {
        Framework::NestJs
    }

    fn probe(&self, host: &Value) -> bool {
        host.get("controllers").is_some_and(Value::is_array)
            && (host.get("container").is_some() || host.get("globalPrefix").is_some())
    }

    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint> {
        let Some(controllers) = host.get("controllers").and_then(Value::as_array) else {
            warn!(logger, "NestJS controller list not found, no routes extracted");
            return Vec::new();
        };
        let prefix = str_field(host, "globalPrefix").unwrap_or("");

        let mut endpoints = Vec::new();
        for controller in controllers {
            let meta = controller.get("metadata").unwrap_or(&Value::Null);
            let mut bases = string_or_list(meta.get(&self.keys.path));
            if bases.is_empty() {
                bases.push(String::new());
            }
            let tags = string_or_list(meta.get(&self.keys.tags));

            let Some(handlers) = controller.get("handlers").and_then(Value::as_array) else {
                debug!(
                    logger, "Controller has no handlers";
                    "controller" => str_field(controller, "name").unwrap_or("?")
                );
                continue;
            };

            for base in &bases {
                let base = join_paths(prefix, base);
                for handler in handlers {
                    endpoints.extend(self.handler_endpoints(&base, &tags, handler, logger));
                }
            }
        }
        endpoints
    }
}

/// `RequestMethod` enum value (numeric) or a method name. `ALL` is skipped.
fn request_method(value: &Value) -> Option<Method> {
    match value {
        Value::Number(n) => match n.as_u64()? {
            0 => Some(Method::Get),
            1 => Some(Method::Post),
            2 => Some(Method::Put),
            3 => Some(Method::Delete),
            4 => Some(Method::Patch),
            6 => Some(Method::Options),
            7 => Some(Method::Head),
            _ => None,
        },
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn response_spec(code: u16, response: &Value) -> ResponseSpec {
    let description = str_field(response, "description").unwrap_or("Response");
    let spec = ResponseSpec::new(code, description);
    match response.get("schema").or_else(|| response.get("type").filter(|t| t.is_object())) {
        Some(schema) => spec.with_schema(schema.clone()),
        None => match str_field(response, "type") {
            Some(t) => spec.with_schema(serde_json::json!({ "type": t })),
            None => spec,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParamLocation, ParamType};
    use serde_json::json;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn host() -> Value {
        json!({
            "globalPrefix": "api",
            "container": {},
            "controllers": [{
                "name": "UsersController",
                "metadata": {"path": "users", "swagger/apiUseTags": ["users"]},
                "handlers": [
                    {"name": "findOne", "metadata": {
                        "path": ":id",
                        "method": 0,
                        "swagger/apiOperation": {"summary": "Find one", "deprecated": true},
                        "swagger/apiParameters": [
                            {"name": "id", "in": "path", "type": "integer"},
                            {"name": "expand", "in": "query", "required": false, "type": "boolean"}
                        ],
                        "swagger/apiResponse": {
                            "200": {"description": "The user", "type": "object"},
                            "404": {"description": "Not found"}
                        },
                        "swagger/apiUseTags": ["lookup"]
                    }},
                    {"name": "create", "metadata": {"path": "/", "method": "POST",
                        "swagger/apiResponse": [{"status": 201, "description": "Created"}]}},
                    {"name": "any", "metadata": {"path": "wild", "method": 5}},
                    {"name": "helper"}
                ]
            }]
        })
    }

    #[test]
    fn extracts_controllers_with_metadata() {
        let eps = NestSource::default().extract(&host(), &logger());
        let labels: Vec<String> = eps.iter().map(Endpoint::label).collect();
        assert_eq!(labels, vec!["GET /api/users/:id", "POST /api/users"]);

        let find = &eps[0];
        assert_eq!(find.summary, "Find one");
        assert!(find.deprecated);
        assert_eq!(find.tags, vec!["users", "lookup"]);
        let id = find.parameter("id", ParamLocation::Path).unwrap();
        assert_eq!(id.param_type, ParamType::Integer);
        assert!(find.parameter("expand", ParamLocation::Query).is_some());
        assert_eq!(find.responses.len(), 2);
        assert!(find.response_for(404).is_some());

        assert_eq!(eps[1].success_statuses(), vec![201]);
    }

    #[test]
    fn handlers_without_responses_get_defaults() {
        let host = json!({"controllers": [{
            "metadata": {"path": ["a", "b"]},
            "handlers": [{"metadata": {"method": 1}}]
        }], "container": {}});
        let eps = NestSource::default().extract(&host, &logger());
        let paths: Vec<&str> = eps.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        let defaults = Endpoint::new(Method::Post, "/a").with_default_responses();
        assert_eq!(eps[0].responses, defaults.responses);
        assert_eq!(eps[1].responses, defaults.responses);
    }

    #[test]
    fn custom_keys_are_honoured() {
        let keys = NestMetadataKeys {
            tags: "swagger/apiTags".to_string(),
            ..NestMetadataKeys::default()
        };
        let host = json!({"container": {}, "controllers": [{
            "metadata": {"path": "x", "swagger/apiTags": ["t"]},
            "handlers": [{"metadata": {"method": 0}}]
        }]});
        let eps = NestSource::new(keys).extract(&host, &logger());
        assert_eq!(eps[0].tags, vec!["t"]);
    }

    #[test]
    fn missing_controllers_yields_empty() {
        assert!(NestSource::default().extract(&json!({}), &logger()).is_empty());
    }
}
