//! Validation results, per-endpoint test results and the run report

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Endpoint;

/// One reason a response or parameter set failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    /// Parameter the violation refers to, when it is about one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl Violation {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameter: None,
        }
    }

    #[must_use]
    pub fn for_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating a response body or a parameter set.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `"METHOD /path"` of the endpoint validated
    pub endpoint: String,
    pub valid: bool,
    pub errors: Vec<Violation>,
}

impl ValidationResult {
    #[must_use]
    pub fn pass(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.label(),
            valid: true,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_violations(endpoint: &Endpoint, errors: Vec<Violation>) -> Self {
        Self {
            endpoint: endpoint.label(),
            valid: errors.is_empty(),
            errors,
        }
    }

    /// All violation messages joined with `"; "`.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Result of testing one endpoint.
///
/// `success` implies `error` is `None`. `status_code` is `None` only when no
/// response was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub endpoint: Endpoint,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Elapsed milliseconds, measured even on failure
    pub response_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

impl TestResult {
    /// A response was received and every check passed.
    #[must_use]
    pub fn passed(endpoint: Endpoint, status_code: u16, response_time: u64, body: Value) -> Self {
        Self {
            endpoint,
            success: true,
            status_code: Some(status_code),
            response_time,
            error: None,
            response_body: Some(body),
        }
    }

    /// A response was received but a check failed.
    #[must_use]
    pub fn failed(
        endpoint: Endpoint,
        status_code: u16,
        response_time: u64,
        body: Value,
        error: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            success: false,
            status_code: Some(status_code),
            response_time,
            error: Some(error.into()),
            response_body: Some(body),
        }
    }

    /// No response: transport failure, timeout, or a request that could not be built.
    #[must_use]
    pub fn execution_failed(endpoint: Endpoint, response_time: u64, error: impl Into<String>) -> Self {
        Self {
            endpoint,
            success: false,
            status_code: None,
            response_time,
            error: Some(error.into()),
            response_body: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Ordered results of one run, one per input endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub results: Vec<TestResult>,
    pub summary: ReportSummary,
}

impl TestReport {
    #[must_use]
    pub fn new(results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        let summary = ReportSummary {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        };
        Self { results, summary }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} endpoints passed",
            self.summary.passed, self.summary.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Method;
    use serde_json::json;

    fn ep(path: &str) -> Endpoint {
        Endpoint::new(Method::Get, path)
    }

    #[test]
    fn validation_result_tracks_errors() {
        let ok = ValidationResult::pass(&ep("/a"));
        assert!(ok.valid);
        assert_eq!(ok.endpoint, "GET /a");

        let bad = ValidationResult::from_violations(
            &ep("/a"),
            vec![Violation::new("one"), Violation::for_parameter("id", "two")],
        );
        assert!(!bad.valid);
        assert_eq!(bad.error_summary(), "one; two");

        assert!(ValidationResult::from_violations(&ep("/a"), Vec::new()).valid);
    }

    #[test]
    fn summary_counts_and_display() {
        let report = TestReport::new(vec![
            TestResult::passed(ep("/a"), 200, 3, json!({})),
            TestResult::failed(ep("/b"), 500, 4, json!(null), "Expected status 200, got 500"),
            TestResult::execution_failed(ep("/c"), 5000, "Request timed out"),
        ]);
        assert_eq!(report.summary, ReportSummary { total: 3, passed: 1, failed: 2 });
        assert!(!report.all_passed());
        assert_eq!(report.to_string(), "1/3 endpoints passed");
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn test_result_wire_names() {
        let value = serde_json::to_value(TestResult::execution_failed(ep("/c"), 12, "boom")).unwrap();
        assert_eq!(value["responseTime"], 12);
        assert_eq!(value["error"], "boom");
        assert!(value.get("statusCode").is_none());
        assert!(value.get("responseBody").is_none());
        assert_eq!(value["endpoint"]["path"], "/c");
    }

    #[test]
    fn empty_report_passes() {
        let report = TestReport::new(Vec::new());
        assert!(report.all_passed());
        assert_eq!(report.to_string(), "0/0 endpoints passed");
    }
}
