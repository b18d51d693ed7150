//! Route source adapters: host introspection snapshot → canonical endpoints
//!
//! A host snapshot is a JSON/YAML document mirroring a framework's internal
//! route table (Express `_router.stack`, Koa `router.stack`, Fastify route
//! list, NestJS controller metadata) or an OpenAPI document. Adapters read it
//! structurally and never fail: a missing or reshaped introspection point is
//! logged and yields no endpoints.

mod express;
mod fastify;
mod koa;
mod nestjs;
mod openapi;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::{Logger, debug, info, o, warn};

use crate::model::{Endpoint, ParamLocation, ParamType, Parameter};

pub use express::ExpressSource;
pub use fastify::FastifySource;
pub use koa::KoaSource;
pub use nestjs::{NestMetadataKeys, NestSource};
pub use openapi::OpenApiSource;

/// Supported host frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Express,
    Koa,
    Fastify,
    #[serde(rename = "nestjs")]
    NestJs,
    #[serde(rename = "openapi")]
    OpenApi,
}

impl Framework {
    /// Framework assumed when no structural marker matches.
    pub const DEFAULT: Self = Self::Express;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Koa => "koa",
            Self::Fastify => "fastify",
            Self::NestJs => "nestjs",
            Self::OpenApi => "openapi",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit framework, or `auto` for structural detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FrameworkSelector {
    #[default]
    Auto,
    Explicit(Framework),
}

impl FromStr for FrameworkSelector {
    type Err = UnknownFramework;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let framework = match s.to_ascii_lowercase().as_str() {
            "auto" => return Ok(Self::Auto),
            "express" => Framework::Express,
            "koa" => Framework::Koa,
            "fastify" => Framework::Fastify,
            "nestjs" | "nest" => Framework::NestJs,
            "openapi" | "swagger" => Framework::OpenApi,
            _ => return Err(UnknownFramework(s.to_string())),
        };
        Ok(Self::Explicit(framework))
    }
}

impl TryFrom<String> for FrameworkSelector {
    type Error = UnknownFramework;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameworkSelector> for String {
    fn from(selector: FrameworkSelector) -> Self {
        match selector {
            FrameworkSelector::Auto => "auto".to_string(),
            FrameworkSelector::Explicit(f) => f.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown framework '{0}' (expected auto, express, koa, fastify, nestjs or openapi)")]
pub struct UnknownFramework(pub String);

/// One host framework's route table reader.
pub trait RouteSource {
    fn framework(&self) -> Framework;

    /// Structural marker check used by auto-detection.
    fn probe(&self, host: &Value) -> bool;

    /// Read every route from the snapshot. Never fails; logs and returns
    /// an empty list when the route table cannot be located.
    fn extract(&self, host: &Value, logger: &Logger) -> Vec<Endpoint>;
}

/// Dispatcher over the registered route sources.
///
/// Sources are probed in registration order; the default order is
/// NestJS, Fastify, Koa, OpenAPI, Express (most specific marker first).
pub struct RouteExtractor {
    sources: Vec<Box<dyn RouteSource>>,
    logger: Logger,
}

impl Default for RouteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: vec![
                Box::new(NestSource::default()),
                Box::new(FastifySource),
                Box::new(KoaSource),
                Box::new(OpenApiSource),
                Box::new(ExpressSource),
            ],
            logger: Logger::root(slog::Discard, o!()),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger.new(o!("src" => "RouteExtractor"));
        self
    }

    /// Replace the registered source for the same framework, or append it.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn RouteSource>) -> Self {
        let framework = source.framework();
        match self.sources.iter().position(|s| s.framework() == framework) {
            Some(idx) => self.sources[idx] = source,
            None => self.sources.push(source),
        }
        self
    }

    /// First framework whose structural probe matches, else [`Framework::DEFAULT`].
    #[must_use]
    pub fn detect(&self, host: &Value) -> Framework {
        self.sources
            .iter()
            .find(|s| s.probe(host))
            .map_or(Framework::DEFAULT, |s| s.framework())
    }

    /// Extract endpoints using the selected (or detected) framework.
    #[must_use]
    pub fn extract(&self, host: &Value, selector: FrameworkSelector) -> Vec<Endpoint> {
        let framework = match selector {
            FrameworkSelector::Explicit(f) => f,
            FrameworkSelector::Auto => {
                let detected = self.detect(host);
                debug!(self.logger, "Detected host framework"; "framework" => %detected);
                detected
            }
        };

        let Some(source) = self.sources.iter().find(|s| s.framework() == framework) else {
            warn!(self.logger, "No route source registered"; "framework" => %framework);
            return Vec::new();
        };

        let endpoints = source.extract(host, &self.logger);
        info!(
            self.logger,
            "Extracted {} endpoints", endpoints.len();
            "framework" => %framework
        );
        endpoints
    }
}

// ── Shared helpers for adapters ──

/// A string or an array of strings, as route paths and method lists appear.
pub(crate) fn string_or_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Parse an OpenAPI/Swagger-style parameter object.
///
/// Accepts either a nested `schema` or top-level `type`/`format`/`enum`
/// (Swagger 2 and NestJS decorators). Unsupported locations yield `None`.
pub(crate) fn parse_parameter(param: &Value) -> Option<Parameter> {
    let name = str_field(param, "name")?;
    let location = ParamLocation::parse(str_field(param, "in")?)?;
    let schema = param.get("schema").filter(|s| s.is_object());

    let param_type = match (schema, param.get("type")) {
        (Some(s), _) => ParamType::from_schema(s),
        (None, Some(Value::String(t))) => ParamType::from_schema_type(t),
        (None, _) if location == ParamLocation::Body => ParamType::Object,
        (None, _) => ParamType::String,
    };

    let mut p = Parameter::new(name, location, param_type);
    p.required = location == ParamLocation::Path
        || param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
    p.description = str_field(param, "description").map(String::from);
    p.example = param
        .get("example")
        .or_else(|| schema.and_then(|s| s.get("example")))
        .cloned();
    p.default = param
        .get("default")
        .or_else(|| schema.and_then(|s| s.get("default")))
        .cloned();
    p.enum_values = param
        .get("enum")
        .or_else(|| schema.and_then(|s| s.get("enum")))
        .and_then(Value::as_array)
        .cloned();
    p.format = str_field(param, "format")
        .or_else(|| schema.and_then(|s| str_field(s, "format")))
        .map(String::from);
    p.schema = schema.cloned();
    Some(p)
}

/// One parameter per property of an object schema (Fastify `params`,
/// `querystring`, `headers`).
pub(crate) fn parameters_from_object_schema(
    schema: &Value,
    location: ParamLocation,
) -> Vec<Parameter> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    props
        .iter()
        .map(|(name, prop)| {
            let mut p = Parameter::new(name.as_str(), location, ParamType::from_schema(prop));
            p.required = location == ParamLocation::Path || required.contains(&name.as_str());
            p.description = str_field(prop, "description").map(String::from);
            p.example = prop.get("example").cloned();
            p.default = prop.get("default").cloned();
            p.enum_values = prop.get("enum").and_then(Value::as_array).cloned();
            p.format = str_field(prop, "format").map(String::from);
            p.schema = Some(prop.clone());
            p
        })
        .collect()
}

/// The single body parameter used for a declared request body schema.
pub(crate) fn body_parameter(schema: &Value, required: bool) -> Parameter {
    let mut p = Parameter::new("body", ParamLocation::Body, ParamType::from_schema(schema))
        .with_required(required)
        .with_schema(schema.clone());
    p.description = str_field(schema, "description").map(String::from);
    p
}
