//! Canonical endpoint model
//!
//! Every route source adapter produces these types, every renderer and the
//! contract runner consume them. Field names on the wire are part of the
//! endpoint-list interchange format and must not change.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path;

/// HTTP method of an endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "patch")]
    Patch,
    #[serde(alias = "delete")]
    Delete,
    #[serde(alias = "head")]
    Head,
    #[serde(alias = "options")]
    Options,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Write-oriented methods that conventionally carry a request body.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

/// Declared value type of a parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Map a JSON Schema `type` keyword onto a parameter type.
    ///
    /// Anything unrecognised (class names, `null`, missing) is an object.
    #[must_use]
    pub fn from_schema_type(type_name: &str) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            _ => Self::Object,
        }
    }

    /// Parameter type of a whole JSON Schema node: its `type`, else its
    /// structure. A `$ref` names a schema component and is an object.
    #[must_use]
    pub fn from_schema(schema: &Value) -> Self {
        match schema.get("type") {
            Some(Value::String(t)) => Self::from_schema_type(t),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map_or(Self::String, Self::from_schema_type),
            _ if schema.get("$ref").is_some() => Self::Object,
            _ if schema.get("properties").is_some() => Self::Object,
            _ if schema.get("items").is_some() => Self::Array,
            _ => Self::String,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Header,
}

impl ParamLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
            Self::Header => "header",
        }
    }

    /// Parse an OpenAPI-style `in` value. Unsupported locations (`cookie`) yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "body" => Some(Self::Body),
            "header" => Some(Self::Header),
            _ => None,
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body format of a response.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Json,
    Xml,
    Text,
    Html,
    Binary,
}

impl ContentFormat {
    /// Classify a media type such as `application/json; charset=utf-8`.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Self {
        let media = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if media.ends_with("json") {
            Self::Json
        } else if media.ends_with("xml") {
            Self::Xml
        } else if media == "text/html" {
            Self::Html
        } else if media.starts_with("text/") {
            Self::Text
        } else {
            Self::Binary
        }
    }

    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Text => "text/plain",
            Self::Html => "text/html",
            Self::Binary => "application/octet-stream",
        }
    }
}

/// One declared parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Full schema; for body parameters this takes precedence over `type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParamLocation, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: location == ParamLocation::Path,
            location,
            description: None,
            default: None,
            example: None,
            enum_values: None,
            format: None,
            schema: None,
        }
    }

    /// A required string path parameter, as derived from a `:name` segment.
    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path, ParamType::String)
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Type used for synthesis and validation: a body parameter's schema
    /// wins over its declared `type`.
    #[must_use]
    pub fn effective_type(&self) -> ParamType {
        match (&self.schema, self.location) {
            (Some(schema), ParamLocation::Body) => ParamType::from_schema(schema),
            _ => self.param_type,
        }
    }
}

/// Declared response for one status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSpec {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "format", default)]
    pub content_format: ContentFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ResponseSpec {
    #[must_use]
    pub fn new(status_code: u16, description: impl Into<String>) -> Self {
        Self {
            status_code,
            description: description.into(),
            content_format: ContentFormat::Json,
            schema: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.content_format = format;
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Canonical description of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    /// Route path in `:name` parameter notation
    pub path: String,
    pub method: Method,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
}

impl Endpoint {
    /// Create an endpoint; `{name}` segments are rewritten to `:name`.
    #[must_use]
    pub fn new(method: Method, route_path: &str) -> Self {
        Self {
            path: path::to_canonical(route_path),
            method,
            parameters: Vec::new(),
            responses: Vec::new(),
            description: String::new(),
            summary: String::new(),
            tags: Vec::new(),
            deprecated: false,
        }
    }

    /// Add one required string path parameter per named segment of the path.
    #[must_use]
    pub fn with_path_parameters(mut self) -> Self {
        for name in path::extract_parameters(&self.path) {
            if self.parameter(&name, ParamLocation::Path).is_none() {
                self.parameters.push(Parameter::path(name));
            }
        }
        self
    }

    /// Standard 200/400 JSON responses, used when the host declares none.
    #[must_use]
    pub fn with_default_responses(mut self) -> Self {
        self.set_response(ResponseSpec::new(200, "Successful response"));
        self.set_response(ResponseSpec::new(400, "Bad request"));
        self
    }

    /// Re-establish the model invariants on a deserialized endpoint:
    /// `:name` path notation, one parameter per `(name, location)` and one
    /// response per status. Later duplicates replace earlier ones in place.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.path = path::to_canonical(&self.path);
        for parameter in std::mem::take(&mut self.parameters) {
            self.push_parameter(parameter);
        }
        for response in std::mem::take(&mut self.responses) {
            self.set_response(response);
        }
        self
    }

    /// `"GET /users/:id"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Insert a parameter, replacing any existing one with the same name and location.
    pub fn push_parameter(&mut self, parameter: Parameter) {
        match self
            .parameters
            .iter_mut()
            .find(|p| p.name == parameter.name && p.location == parameter.location)
        {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    /// Insert a response, replacing any existing one with the same status code.
    pub fn set_response(&mut self, response: ResponseSpec) {
        match self
            .responses
            .iter_mut()
            .find(|r| r.status_code == response.status_code)
        {
            Some(existing) => *existing = response,
            None => self.responses.push(response),
        }
    }

    #[must_use]
    pub fn parameter(&self, name: &str, location: ParamLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    pub fn parameters_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    #[must_use]
    pub fn response_for(&self, status_code: u16) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.status_code == status_code)
    }

    /// Declared 2xx status codes, in declaration order.
    #[must_use]
    pub fn success_statuses(&self) -> Vec<u16> {
        self.responses
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.status_code)
            .collect()
    }

    /// Add tags that are not yet present, keeping order.
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }
}
