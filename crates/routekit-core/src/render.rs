//! Documentation renderers: endpoint list → Markdown, HTML, or an
//! OpenAPI-flavoured JSON document
//!
//! All three are pure functions of the endpoint list and [`DocInfo`].

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::model::{Endpoint, ParamLocation, Parameter};
use crate::path::to_openapi;

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocInfo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(alias = "base_url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for DocInfo {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            description: None,
            version: "1.0.0".to_string(),
            base_url: None,
        }
    }
}

impl DocInfo {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    #[default]
    Markdown,
    Html,
    Json,
}

impl DocFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocFormat {
    type Err = UnknownDocFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            _ => Err(UnknownDocFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown documentation format '{0}' (expected markdown, html or json)")]
pub struct UnknownDocFormat(pub String);

/// Render in the requested format.
#[must_use]
pub fn render(endpoints: &[Endpoint], info: &DocInfo, format: DocFormat) -> String {
    match format {
        DocFormat::Markdown => to_markdown(endpoints, info),
        DocFormat::Html => to_html(endpoints, info),
        DocFormat::Json => {
            let doc = to_json(endpoints, info);
            serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
        }
    }
}

// ── Markdown ──

#[must_use]
pub fn to_markdown(endpoints: &[Endpoint], info: &DocInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", info.title);
    if let Some(description) = &info.description {
        let _ = writeln!(out, "{description}\n");
    }
    let _ = writeln!(out, "**Version:** {}", info.version);
    if let Some(base_url) = &info.base_url {
        let _ = writeln!(out, "**Base URL:** `{base_url}`");
    }
    out.push('\n');
    out.push_str("## Endpoints\n");

    for ep in endpoints {
        let _ = writeln!(out, "\n### {} {}\n", ep.method, ep.path);
        if ep.deprecated {
            out.push_str("> **Deprecated**\n\n");
        }
        if !ep.summary.is_empty() {
            let _ = writeln!(out, "{}\n", ep.summary);
        }
        if !ep.description.is_empty() {
            let _ = writeln!(out, "{}\n", ep.description);
        }
        if !ep.tags.is_empty() {
            let _ = writeln!(out, "**Tags:** {}\n", ep.tags.join(", "));
        }

        if !ep.parameters.is_empty() {
            out.push_str("**Parameters:**\n\n");
            out.push_str("| Name | In | Type | Required | Description |\n");
            out.push_str("|------|----|------|----------|-------------|\n");
            for p in &ep.parameters {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    p.name,
                    p.location,
                    p.param_type,
                    if p.required { "yes" } else { "no" },
                    table_cell(p.description.as_deref().unwrap_or("-"))
                );
            }
            out.push('\n');
        }

        if !ep.responses.is_empty() {
            out.push_str("**Responses:**\n\n");
            out.push_str("| Status | Format | Description |\n");
            out.push_str("|--------|--------|-------------|\n");
            for r in &ep.responses {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    r.status_code,
                    r.content_format.media_type(),
                    table_cell(&r.description)
                );
            }
        }
    }
    out
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// ── HTML ──

#[must_use]
pub fn to_html(endpoints: &[Endpoint], info: &DocInfo) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(&info.title));
    out.push_str(
        "<style>\nbody{font-family:sans-serif;max-width:960px;margin:auto}\n\
         .endpoint{border:1px solid #ddd;border-radius:4px;margin:1em 0;padding:0 1em}\n\
         .method{font-weight:bold;text-transform:uppercase}\n\
         .deprecated{color:#a00}\n\
         table{border-collapse:collapse}td,th{border:1px solid #ddd;padding:4px 8px}\n\
         </style>\n",
    );
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(&info.title));
    if let Some(description) = &info.description {
        let _ = writeln!(out, "<p>{}</p>", escape_html(description));
    }
    let _ = writeln!(out, "<p>Version: {}</p>", escape_html(&info.version));
    if let Some(base_url) = &info.base_url {
        let _ = writeln!(out, "<p>Base URL: <code>{}</code></p>", escape_html(base_url));
    }

    for ep in endpoints {
        out.push_str("<div class=\"endpoint\">\n");
        let _ = writeln!(
            out,
            "<h2><span class=\"method\">{}</span> <code>{}</code></h2>",
            ep.method,
            escape_html(&ep.path)
        );
        if ep.deprecated {
            out.push_str("<p class=\"deprecated\">Deprecated</p>\n");
        }
        if !ep.summary.is_empty() {
            let _ = writeln!(out, "<p><strong>{}</strong></p>", escape_html(&ep.summary));
        }
        if !ep.description.is_empty() {
            let _ = writeln!(out, "<p>{}</p>", escape_html(&ep.description));
        }
        if !ep.tags.is_empty() {
            let tags: Vec<String> = ep.tags.iter().map(|t| escape_html(t)).collect();
            let _ = writeln!(out, "<p>Tags: {}</p>", tags.join(", "));
        }

        if !ep.parameters.is_empty() {
            out.push_str("<h3>Parameters</h3>\n<table>\n");
            out.push_str("<tr><th>Name</th><th>In</th><th>Type</th><th>Required</th><th>Description</th></tr>\n");
            for p in &ep.parameters {
                let _ = writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&p.name),
                    p.location,
                    p.param_type,
                    if p.required { "yes" } else { "no" },
                    escape_html(p.description.as_deref().unwrap_or(""))
                );
            }
            out.push_str("</table>\n");
        }

        if !ep.responses.is_empty() {
            out.push_str("<h3>Responses</h3>\n<table>\n");
            out.push_str("<tr><th>Status</th><th>Format</th><th>Description</th></tr>\n");
            for r in &ep.responses {
                let _ = writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    r.status_code,
                    r.content_format.media_type(),
                    escape_html(&r.description)
                );
            }
            out.push_str("</table>\n");
        }
        out.push_str("</div>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── JSON (OpenAPI-flavoured) ──

/// OpenAPI 3 shaped document: paths in `{name}` notation, one operation per
/// endpoint, body parameters folded into `requestBody`.
#[must_use]
pub fn to_json(endpoints: &[Endpoint], info: &DocInfo) -> Value {
    let mut info_obj = Map::new();
    info_obj.insert("title".into(), json!(info.title));
    info_obj.insert("version".into(), json!(info.version));
    if let Some(description) = &info.description {
        info_obj.insert("description".into(), json!(description));
    }

    let mut paths = Map::new();
    for ep in endpoints {
        let item = paths
            .entry(to_openapi(&ep.path))
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            item.insert(ep.method.as_str().to_ascii_lowercase(), operation(ep));
        }
    }

    let mut doc = Map::new();
    doc.insert("openapi".into(), json!("3.0.0"));
    doc.insert("info".into(), Value::Object(info_obj));
    if let Some(base_url) = &info.base_url {
        doc.insert("servers".into(), json!([{ "url": base_url }]));
    }
    doc.insert("paths".into(), Value::Object(paths));
    Value::Object(doc)
}

fn operation(ep: &Endpoint) -> Value {
    let mut op = Map::new();
    if !ep.summary.is_empty() {
        op.insert("summary".into(), json!(ep.summary));
    }
    if !ep.description.is_empty() {
        op.insert("description".into(), json!(ep.description));
    }
    if !ep.tags.is_empty() {
        op.insert("tags".into(), json!(ep.tags));
    }
    if ep.deprecated {
        op.insert("deprecated".into(), json!(true));
    }

    let params: Vec<Value> = ep
        .parameters
        .iter()
        .filter(|p| p.location != ParamLocation::Body)
        .map(parameter_object)
        .collect();
    if !params.is_empty() {
        op.insert("parameters".into(), Value::Array(params));
    }

    let body: Vec<&Parameter> = ep.parameters_in(ParamLocation::Body).collect();
    if !body.is_empty() {
        op.insert("requestBody".into(), request_body(&body));
    }

    let mut responses = Map::new();
    for r in &ep.responses {
        let mut obj = Map::new();
        obj.insert("description".into(), json!(r.description));
        if let Some(schema) = &r.schema {
            obj.insert(
                "content".into(),
                json!({ (r.content_format.media_type()): { "schema": schema } }),
            );
        }
        responses.insert(r.status_code.to_string(), Value::Object(obj));
    }
    op.insert("responses".into(), Value::Object(responses));
    Value::Object(op)
}

fn parameter_schema(p: &Parameter) -> Value {
    if let Some(schema) = &p.schema {
        return schema.clone();
    }
    let mut schema = Map::new();
    schema.insert("type".into(), json!(p.param_type.as_str()));
    if let Some(format) = &p.format {
        schema.insert("format".into(), json!(format));
    }
    if let Some(values) = &p.enum_values {
        schema.insert("enum".into(), Value::Array(values.clone()));
    }
    if let Some(default) = &p.default {
        schema.insert("default".into(), default.clone());
    }
    Value::Object(schema)
}

fn parameter_object(p: &Parameter) -> Value {
    let mut obj = Map::new();
    obj.insert("name".into(), json!(p.name));
    obj.insert("in".into(), json!(p.location.as_str()));
    obj.insert("required".into(), json!(p.required));
    if let Some(description) = &p.description {
        obj.insert("description".into(), json!(description));
    }
    if let Some(example) = &p.example {
        obj.insert("example".into(), example.clone());
    }
    obj.insert("schema".into(), parameter_schema(p));
    Value::Object(obj)
}

/// A single schema-carrying body parameter is the body; several are
/// properties of an object body.
fn request_body(body: &[&Parameter]) -> Value {
    let (schema, required) = match body {
        [single] if single.schema.is_some() => (parameter_schema(single), single.required),
        _ => {
            let properties: Map<String, Value> = body
                .iter()
                .map(|p| (p.name.clone(), parameter_schema(p)))
                .collect();
            let required: Vec<&str> = body
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.as_str())
                .collect();
            let any_required = !required.is_empty();
            (
                json!({ "type": "object", "properties": properties, "required": required }),
                any_required,
            )
        }
    };
    json!({
        "required": required,
        "content": { "application/json": { "schema": schema } }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, ParamType, ResponseSpec};

    fn sample() -> Vec<Endpoint> {
        let mut get = Endpoint::new(Method::Get, "/users/:id").with_path_parameters();
        get.summary = "Get user".to_string();
        get.tags = vec!["users".to_string()];
        get.set_response(ResponseSpec::new(200, "The user"));

        let mut post = Endpoint::new(Method::Post, "/users");
        post.deprecated = true;
        post.push_parameter(
            Parameter::new("name", ParamLocation::Body, ParamType::String).with_required(true),
        );
        post.push_parameter(Parameter::new("age", ParamLocation::Body, ParamType::Integer));
        post.set_response(ResponseSpec::new(201, "Created <ok>"));
        vec![get, post]
    }

    #[test]
    fn markdown_layout() {
        let md = to_markdown(&sample()[..1], &DocInfo::new("Users API"));
        insta::assert_snapshot!(md, @r"
        # Users API

        **Version:** 1.0.0

        ## Endpoints

        ### GET /users/:id

        Get user

        **Tags:** users

        **Parameters:**

        | Name | In | Type | Required | Description |
        |------|----|------|----------|-------------|
        | id | path | string | yes | - |

        **Responses:**

        | Status | Format | Description |
        |--------|--------|-------------|
        | 200 | application/json | The user |
        ");
    }

    #[test]
    fn markdown_marks_deprecated() {
        let md = to_markdown(&sample(), &DocInfo::default().with_base_url("http://api"));
        assert!(md.contains("**Base URL:** `http://api`"));
        assert!(md.contains("### POST /users\n\n> **Deprecated**"));
    }

    #[test]
    fn html_escapes_text() {
        let info = DocInfo::new("<Users & Co>").with_description("\"quoted\"");
        let html = to_html(&sample(), &info);
        assert!(html.contains("<title>&lt;Users &amp; Co&gt;</title>"));
        assert!(html.contains("<p>&quot;quoted&quot;</p>"));
        assert!(html.contains("Created &lt;ok&gt;"));
        assert!(html.contains("class=\"deprecated\""));
        assert!(!html.contains("<ok>"));
    }

    #[test]
    fn json_is_openapi_shaped() {
        let doc = to_json(&sample(), &DocInfo::new("Users API").with_base_url("http://api"));
        assert_eq!(doc["openapi"], "3.0.0");
        assert_eq!(doc["servers"][0]["url"], "http://api");

        let get = &doc["paths"]["/users/{id}"]["get"];
        assert_eq!(get["summary"], "Get user");
        assert_eq!(get["parameters"][0]["in"], "path");
        assert_eq!(get["parameters"][0]["schema"]["type"], "string");
        assert_eq!(get["responses"]["200"]["description"], "The user");

        let post = &doc["paths"]["/users"]["post"];
        assert_eq!(post["deprecated"], true);
        assert!(post.get("parameters").is_none());
        let body = &post["requestBody"];
        assert_eq!(body["required"], true);
        let schema = &body["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["age"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["name"]));
    }

    #[test]
    fn render_dispatches_by_format() {
        let eps = sample();
        let info = DocInfo::default();
        assert!(render(&eps, &info, DocFormat::Markdown).starts_with("# API Documentation"));
        assert!(render(&eps, &info, DocFormat::Html).starts_with("<!DOCTYPE html>"));
        let json: Value = serde_json::from_str(&render(&eps, &info, DocFormat::Json)).unwrap();
        assert_eq!(json["info"]["title"], "API Documentation");
        assert_eq!("md".parse::<DocFormat>().unwrap(), DocFormat::Markdown);
    }
}
