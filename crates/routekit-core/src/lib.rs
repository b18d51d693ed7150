//! routekit-core: canonical endpoint model and route extraction
//!
//! Route tables from Express, Koa, Fastify and NestJS hosts (or an OpenAPI
//! document) are folded into one [`Endpoint`] list, which the renderers
//! document and the runner crate tests against a live service.

pub mod adapters;
pub mod config;
pub mod document;
pub mod model;
pub mod path;
pub mod render;
pub mod report;
pub mod schema;

pub use adapters::{
    Framework, FrameworkSelector, NestMetadataKeys, RouteExtractor, RouteSource, UnknownFramework,
};
pub use config::{Config, ConfigError, DEFAULT_TIMEOUT_MS, LogLevel, SourceConfig, TestConfig};
pub use document::{DocumentError, load_endpoints, load_host, parse_document, save_endpoints};
pub use model::{
    ContentFormat, Endpoint, Method, ParamLocation, ParamType, Parameter, ResponseSpec,
};
pub use render::{DocFormat, DocInfo};
pub use report::{ReportSummary, TestReport, TestResult, ValidationResult, Violation};
