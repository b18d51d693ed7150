//! Request synthesis: endpoint + test configuration → concrete HTTP request

use std::collections::BTreeMap;
use std::fmt::Write as _;

use routekit_core::{Endpoint, Method, ParamLocation, TestConfig};
use serde_json::{Map, Value};

use crate::datagen::{generate, param_value, value_to_param_string};

/// A fully synthesized request, ready to send or print.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRequest {
    pub method: Method,
    pub url: String,
    /// Header names as configured; later sources overwrite earlier ones
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl SyntheticRequest {
    /// `.http` rendering used by dry runs.
    #[must_use]
    pub fn to_http(&self, comment: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(c) = comment {
            let _ = writeln!(out, "### {c}");
        }
        let _ = writeln!(out, "{} {}", self.method, self.url);
        for (key, value) in &self.headers {
            let _ = writeln!(out, "{key}: {value}");
        }
        if let Some(body) = &self.body {
            out.push('\n');
            let text = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
            out.push_str(&text);
            out.push('\n');
        }
        out
    }
}

/// Build the request for `endpoint`. Deterministic for equal inputs.
#[must_use]
pub fn build_request(endpoint: &Endpoint, config: &TestConfig) -> SyntheticRequest {
    let overrides = &config.param_values;

    let mut path = endpoint.path.clone();
    for p in endpoint.parameters_in(ParamLocation::Path) {
        let value = value_to_param_string(&param_value(p, overrides));
        path = substitute(&path, &p.name, &urlencoding::encode(&value));
    }

    let query: Vec<String> = endpoint
        .parameters_in(ParamLocation::Query)
        .map(|p| {
            let value = value_to_param_string(&param_value(p, overrides));
            format!("{}={}", urlencoding::encode(&p.name), urlencoding::encode(&value))
        })
        .collect();
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query.join("&"));
    }

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    for (key, value) in &config.headers {
        set_header(&mut headers, key, value.clone());
    }
    for p in endpoint.parameters_in(ParamLocation::Header) {
        set_header(&mut headers, &p.name, value_to_param_string(&param_value(p, overrides)));
    }

    let body = if endpoint.method.carries_body() {
        build_body(endpoint, overrides)
    } else {
        None
    };

    SyntheticRequest {
        method: endpoint.method,
        url: join_url(&config.base_url, &path),
        headers,
        body,
    }
}

fn build_body(endpoint: &Endpoint, overrides: &BTreeMap<String, Value>) -> Option<Value> {
    let params: Vec<_> = endpoint.parameters_in(ParamLocation::Body).collect();
    if params.is_empty() {
        return None;
    }
    if let Some(schema) = params.iter().find_map(|p| p.schema.as_ref()) {
        return Some(generate(schema, overrides));
    }
    let fields: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), param_value(p, overrides)))
        .collect();
    Some(Value::Object(fields))
}

/// Header names are case-insensitive: replace an existing entry in place.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    let existing = headers
        .keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned();
    if let Some(key) = existing {
        headers.remove(&key);
    }
    headers.insert(name.to_string(), value);
}

/// Replace every `:name` segment (whole name only) with `value`.
fn substitute(path: &str, name: &str, value: &str) -> String {
    let marker = format!(":{name}");
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(pos) = rest.find(&marker) {
        let after = &rest[pos + marker.len()..];
        let whole = !after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_');
        out.push_str(&rest[..pos]);
        if whole {
            out.push_str(value);
        } else {
            out.push_str(&marker);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Join base URL and path with exactly one `/` between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) if !path.is_empty() && !path.starts_with('?') => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit_core::{ParamType, Parameter};
    use serde_json::json;

    fn config() -> TestConfig {
        TestConfig::new("http://localhost:3000/")
    }

    #[test]
    fn join_url_never_doubles_or_drops_separator() {
        assert_eq!(join_url("http://h/", "/a"), "http://h/a");
        assert_eq!(join_url("http://h", "/a"), "http://h/a");
        assert_eq!(join_url("http://h/", "a"), "http://h/a");
        assert_eq!(join_url("http://h", "a"), "http://h/a");
        assert_eq!(join_url("http://h/api/", "/v1"), "http://h/api/v1");
    }

    #[test]
    fn substitute_matches_whole_names_only() {
        assert_eq!(substitute("/u/:id/:idx", "id", "7"), "/u/7/:idx");
        assert_eq!(substitute("/u/:id.json", "id", "7"), "/u/7.json");
    }

    #[test]
    fn path_and_query_are_encoded() {
        let mut ep = Endpoint::new(Method::Get, "/users/:name").with_path_parameters();
        ep.push_parameter(Parameter::new("q", ParamLocation::Query, ParamType::String));
        ep.push_parameter(Parameter::new("page", ParamLocation::Query, ParamType::Integer));
        let cfg = config().with_param_value("name", json!("a b/c"));

        let req = build_request(&ep, &cfg);
        assert_eq!(req.url, "http://localhost:3000/users/a%20b%2Fc?q=test-q&page=123");
        assert!(req.body.is_none());
    }

    #[test]
    fn brace_paths_from_a_list_are_substituted() {
        let ep: Endpoint = serde_json::from_value(json!({
            "path": "/users/{id}",
            "method": "GET",
            "parameters": [{"name": "id", "in": "path", "type": "integer"}]
        }))
        .unwrap();
        let req = build_request(&ep.normalized(), &TestConfig::new("http://svc"));
        assert_eq!(req.url, "http://svc/users/123");
    }

    #[test]
    fn headers_layer_in_order() {
        let mut ep = Endpoint::new(Method::Get, "/h");
        ep.push_parameter(
            Parameter::new("X-Trace", ParamLocation::Header, ParamType::String)
                .with_example(json!("from-param")),
        );
        let cfg = config()
            .with_header("content-type", "text/plain")
            .with_header("x-trace", "from-config")
            .with_header("Authorization", "Bearer t");

        let req = build_request(&ep, &cfg);
        assert_eq!(req.headers.get("content-type").map(String::as_str), Some("text/plain"));
        assert!(!req.headers.contains_key("Content-Type"));
        assert_eq!(req.headers.get("X-Trace").map(String::as_str), Some("from-param"));
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer t"));
    }

    #[test]
    fn schema_body_uses_generator_with_overrides() {
        let mut ep = Endpoint::new(Method::Post, "/users");
        ep.push_parameter(
            Parameter::new("body", ParamLocation::Body, ParamType::Object).with_schema(json!({
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
            })),
        );
        let req = build_request(&ep, &config().with_param_value("name", json!("ann")));
        assert_eq!(req.body, Some(json!({"age": 123, "name": "ann"})));
    }

    #[test]
    fn schemaless_body_params_become_a_map() {
        let mut ep = Endpoint::new(Method::Put, "/users/:id").with_path_parameters();
        ep.push_parameter(Parameter::new("email", ParamLocation::Body, ParamType::String));
        ep.push_parameter(Parameter::new("admin", ParamLocation::Body, ParamType::Boolean));
        let req = build_request(&ep, &config());
        assert_eq!(req.body, Some(json!({"email": "test-email", "admin": true})));
        assert_eq!(req.url, "http://localhost:3000/users/test-id");
    }

    #[test]
    fn body_only_for_write_methods() {
        for method in [Method::Get, Method::Delete, Method::Head] {
            let mut ep = Endpoint::new(method, "/x");
            ep.push_parameter(Parameter::new("v", ParamLocation::Body, ParamType::String));
            assert!(build_request(&ep, &config()).body.is_none());
        }
        assert!(build_request(&Endpoint::new(Method::Post, "/x"), &config()).body.is_none());
    }

    #[test]
    fn synthesis_is_deterministic() {
        let mut ep = Endpoint::new(Method::Patch, "/items/:id").with_path_parameters();
        ep.push_parameter(Parameter::new("q", ParamLocation::Query, ParamType::String));
        ep.push_parameter(Parameter::new("n", ParamLocation::Body, ParamType::Number));
        assert_eq!(build_request(&ep, &config()), build_request(&ep, &config()));
    }

    #[test]
    fn http_rendering() {
        let mut ep = Endpoint::new(Method::Post, "/users");
        ep.push_parameter(Parameter::new("name", ParamLocation::Body, ParamType::String));
        let req = build_request(&ep, &TestConfig::new("http://api"));
        insta::assert_snapshot!(req.to_http(Some("POST /users")), @r#"
        ### POST /users
        POST http://api/users
        Content-Type: application/json

        {
          "name": "test-name"
        }
        "#);
    }
}
