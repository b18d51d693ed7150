//! routekit-runner: contract tests for canonical endpoints
//!
//! Synthesizes one request per endpoint from its declared parameters, sends
//! it, and checks the response status (and optionally body schema) against
//! what the endpoint declares.

pub mod contract;
pub mod datagen;

pub use contract::{
    ExecutionError, HttpResponse, HttpTransport, RunnerError, SyntheticRequest, TestRunner,
    Transport, build_request, plan, validate_params, validate_response,
};
