//! Fastify: the route list collected from the `onRoute` hook
//!
//! Each entry has `method` (string or list), `url`, and an optional `schema`
//! whose `params`, `querystring`, `headers`, `body` and `response` parts map
//! onto endpoint parameters and responses.

use serde_json::Value;
use slog::{Logger, debug, warn};

use super::{
    Framework, RouteSource, body_parameter, parameters_from_object_schema, str_field,
    string_or_list,
};
use crate::model::{Endpoint, Method, ParamLocation, ResponseSpec};

pub struct FastifySource;

impl RouteSource for FastifySource {
    fn framework(&self) -> Framework {
        Framework::Fastify
    }

    fn probe(&self, host: &Value) -> bool {
        host.get("routes")
            .and_then(Value::as_array)
            .is_some_and(|routes| routes.iter().all(|r| r.get("url").is_some()))
    }

    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint> {
        let Some(routes) = host.get("routes").and_then(Value::as_array) else {
            warn!(logger, "Fastify route list not found, no routes extracted");
            return Vec::new();
        };

        let mut endpoints: Vec<Endpoint> = Vec::new();
        for route in routes {
            let Some(url) = str_field(route, "url").or_else(|| str_field(route, "path")) else {
                debug!(logger, "Skipping Fastify route without url");
                continue;
            };
            for name in string_or_list(route.get("method")) {
                let Ok(method) = name.parse::<Method>() else {
                    debug!(logger, "Skipping unsupported method"; "method" => &name, "url" => url);
                    continue;
                };
                endpoints.push(build_endpoint(method, url, route.get("schema")));
            }
        }

        // `exposeHeadRoutes` registers a HEAD twin for every GET
        let gets: Vec<String> = endpoints
            .iter()
            .filter(|e| e.method == Method::Get)
            .map(|e| e.path.clone())
            .collect();
        endpoints.retain(|e| e.method != Method::Head || !gets.contains(&e.path));
        endpoints
    }
}

fn build_endpoint(method: Method, url: &str, schema: Option<&Value>) -> Endpoint {
    let mut endpoint = Endpoint::new(method, url).with_path_parameters();
    let Some(schema) = schema else {
        return endpoint.with_default_responses();
    };

    endpoint.summary = str_field(schema, "summary").unwrap_or_default().to_string();
    endpoint.description = str_field(schema, "description")
        .unwrap_or_default()
        .to_string();
    endpoint.add_tags(string_or_list(schema.get("tags")));
    endpoint.deprecated = schema
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    for (key, location) in [
        ("params", ParamLocation::Path),
        ("querystring", ParamLocation::Query),
        ("headers", ParamLocation::Header),
    ] {
        if let Some(part) = schema.get(key) {
            for p in parameters_from_object_schema(part, location) {
                endpoint.push_parameter(p);
            }
        }
    }

    if let Some(body) = schema.get("body") {
        endpoint.push_parameter(body_parameter(body, true));
    }

    if let Some(responses) = schema.get("response").and_then(Value::as_object) {
        for (status, response_schema) in responses {
            // "2xx" / "default" keys have no single status code
            let Ok(code) = status.parse::<u16>() else {
                continue;
            };
            let description = str_field(response_schema, "description")
                .unwrap_or("Response")
                .to_string();
            endpoint
                .set_response(ResponseSpec::new(code, description).with_schema(response_schema.clone()));
        }
    }

    if endpoint.responses.is_empty() {
        endpoint = endpoint.with_default_responses();
    }
    endpoint
}
