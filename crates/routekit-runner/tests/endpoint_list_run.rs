//! Endpoint list in wire format → scripted run → report

use std::cell::Cell;
use std::time::Duration;

use routekit_core::{Endpoint, TestConfig};
use routekit_runner::{ExecutionError, HttpResponse, SyntheticRequest, TestRunner, Transport};
use serde_json::json;

/// Echoes the request body back, answering POST with 201 and the rest with 200.
struct Echo {
    calls: Cell<usize>,
}

impl Transport for Echo {
    fn send(
        &self,
        request: &SyntheticRequest,
        _timeout: Duration,
    ) -> Result<HttpResponse, ExecutionError> {
        self.calls.set(self.calls.get() + 1);
        if request.url.contains("/offline") {
            return Err(ExecutionError::Transport("connection refused".into()));
        }
        let status_code = if request.method.carries_body() { 201 } else { 200 };
        Ok(HttpResponse {
            status_code,
            body: request.body.clone().unwrap_or(json!({"ok": true})),
            elapsed: Duration::from_millis(1),
        })
    }
}

fn endpoints() -> Vec<Endpoint> {
    serde_json::from_value(json!([
        {
            "path": "/users",
            "method": "POST",
            "parameters": [{
                "name": "body", "type": "object", "required": true, "in": "body",
                "schema": {"type": "object", "properties": {
                    "name": {"type": "string", "example": "ann"},
                    "age": {"type": "integer"}
                }}
            }],
            "responses": [
                {"statusCode": 201, "description": "Created", "schema": {
                    "type": "object", "required": ["name"],
                    "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
                }},
                {"statusCode": 400, "description": "Bad request"}
            ]
        },
        {"path": "/users/:id", "method": "GET",
         "parameters": [{"name": "id", "type": "integer", "required": true, "in": "path"}],
         "responses": [{"statusCode": 200, "format": "json", "schema": {"type": "array"}}]},
        {"path": "/offline", "method": "GET"},
        {"path": "/legacy", "method": "PUT", "responses": [{"statusCode": 204}]}
    ]))
    .unwrap()
}

#[test]
fn full_run_over_endpoint_list() {
    let config = TestConfig::new("http://svc").with_validate_schema(true);
    let runner = TestRunner::with_transport(config, Echo { calls: Cell::new(0) });
    let report = runner.run(&endpoints());

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.passed, 1);

    let created = &report.results[0];
    assert!(created.success, "{:?}", created.error);
    assert_eq!(created.response_body, Some(json!({"name": "ann", "age": 123})));

    let fetched = &report.results[1];
    assert!(fetched.error.as_deref().unwrap().starts_with("Schema validation failed"));

    let offline = &report.results[2];
    assert_eq!(offline.status_code, None);

    let legacy = &report.results[3];
    assert_eq!(legacy.error.as_deref(), Some("Expected status 204, got 201"));
}

#[test]
fn dry_run_plan_matches_endpoint_order() {
    let runner = TestRunner::with_transport(TestConfig::new("http://svc"), Echo { calls: Cell::new(0) });
    let plan = runner.plan(&endpoints());
    let urls: Vec<&str> = plan.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["http://svc/users", "http://svc/users/123", "http://svc/offline", "http://svc/legacy"]
    );
    assert!(plan[0].to_http(None).contains("\"name\": \"ann\""));
}
