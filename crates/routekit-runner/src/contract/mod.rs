//! Contract test orchestration
//!
//! Each endpoint goes through synthesize → send → classify, and optionally a
//! response schema check, before the next one starts. One endpoint's
//! failure never stops the run, and results keep input order.

pub mod checks;
pub mod request;
pub mod transport;

use std::time::Instant;

use routekit_core::{Endpoint, TestConfig, TestReport, TestResult};
use slog::{Logger, debug, info, o, warn};

pub use checks::{check_status, validate_params, validate_response};
pub use request::{SyntheticRequest, build_request, join_url};
pub use transport::{ExecutionError, HttpResponse, HttpTransport, Transport};

/// Sequential contract tester over a [`Transport`].
pub struct TestRunner<T: Transport = HttpTransport> {
    config: TestConfig,
    transport: T,
    logger: Logger,
}

impl TestRunner<HttpTransport> {
    /// Runner over a real HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(config: TestConfig) -> Result<Self, RunnerError> {
        let transport = HttpTransport::new().map_err(|e| RunnerError::Http(e.to_string()))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> TestRunner<T> {
    pub fn with_transport(config: TestConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            logger: Logger::root(slog::Discard, o!()),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger.new(o!("src" => "TestRunner"));
        self
    }

    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Test every endpoint in order; one result per endpoint.
    pub fn run(&self, endpoints: &[Endpoint]) -> TestReport {
        info!(
            self.logger, "Testing {} endpoints", endpoints.len();
            "base_url" => &self.config.base_url,
            "validate_schema" => self.config.validate_schema
        );

        let results: Vec<TestResult> = endpoints.iter().map(|ep| self.test_endpoint(ep)).collect();
        let report = TestReport::new(results);

        info!(
            self.logger, "Run finished: {}", report;
            "failed" => report.summary.failed
        );
        report
    }

    /// Synthesize, send and classify a single endpoint.
    pub fn test_endpoint(&self, endpoint: &Endpoint) -> TestResult {
        let request = build_request(endpoint, &self.config);
        debug!(
            self.logger, "Sending request";
            "endpoint" => endpoint.label(),
            "url" => &request.url,
            "has_body" => request.body.is_some()
        );

        let start = Instant::now();
        let response = match self.transport.send(&request, self.config.timeout()) {
            Ok(r) => r,
            Err(e) => {
                let elapsed = millis(start.elapsed().as_millis());
                warn!(self.logger, "Request failed"; "endpoint" => endpoint.label(), "error" => %e);
                return TestResult::execution_failed(endpoint.clone(), elapsed, e.to_string());
            }
        };
        let elapsed = millis(response.elapsed.as_millis());
        let status = response.status_code;

        if let Err(message) = check_status(endpoint, status) {
            warn!(self.logger, "Status mismatch"; "endpoint" => endpoint.label(), "error" => &message);
            return TestResult::failed(endpoint.clone(), status, elapsed, response.body, message);
        }

        if self.config.validate_schema {
            let validation = validate_response(endpoint, status, &response.body);
            if !validation.valid {
                let message = format!("Schema validation failed: {}", validation.error_summary());
                warn!(
                    self.logger, "Response does not match schema";
                    "endpoint" => endpoint.label(),
                    "violations" => validation.errors.len()
                );
                return TestResult::failed(endpoint.clone(), status, elapsed, response.body, message);
            }
        }

        debug!(self.logger, "Endpoint passed"; "endpoint" => endpoint.label(), "status" => status);
        TestResult::passed(endpoint.clone(), status, elapsed, response.body)
    }

    /// Requests that `run` would send, without sending them.
    #[must_use]
    pub fn plan(&self, endpoints: &[Endpoint]) -> Vec<SyntheticRequest> {
        plan(endpoints, &self.config)
    }
}

/// Requests for `endpoints` in order. Needs no transport, so a dry run never
/// builds an HTTP client.
#[must_use]
pub fn plan(endpoints: &[Endpoint], config: &TestConfig) -> Vec<SyntheticRequest> {
    endpoints.iter().map(|ep| build_request(ep, config)).collect()
}

fn millis(ms: u128) -> u64 {
    u64::try_from(ms).unwrap_or(u64::MAX)
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("HTTP client error: {0}")]
    Http(String),
}
