//! Reading and writing JSON/YAML documents: endpoint lists and host snapshots

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::Endpoint;

/// Parse a JSON or YAML document.
///
/// The file extension decides (`.json`, `.yaml`, `.yml`); anything else is
/// sniffed from its first non-blank character.
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] if the content is not valid in the chosen syntax
pub fn parse_document(path: &Path, content: &str) -> Result<Value, DocumentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ if content.trim_start().starts_with(['{', '[']) => parse_json(content),
        _ => parse_yaml(content),
    }
}

fn parse_json(content: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(content).map_err(|e| DocumentError::Parse(format!("Invalid JSON: {e}")))
}

fn parse_yaml(content: &str) -> Result<Value, DocumentError> {
    serde_yml::from_str(content).map_err(|e| DocumentError::Parse(format!("Invalid YAML: {e}")))
}

fn read(path: &Path) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|e| DocumentError::Io(path.to_path_buf(), e.to_string()))
}

/// Read a host introspection snapshot.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_host(path: &Path) -> Result<Value, DocumentError> {
    parse_document(path, &read(path)?)
}

/// Read an endpoint list. Paths are rewritten to `:name` notation and
/// duplicate parameters or responses collapse to the last declaration.
///
/// # Errors
///
/// Returns error if the file cannot be read, parsed, or does not match the
/// endpoint-list shape
pub fn load_endpoints(path: &Path) -> Result<Vec<Endpoint>, DocumentError> {
    let value = parse_document(path, &read(path)?)?;
    let endpoints: Vec<Endpoint> = serde_json::from_value(value)
        .map_err(|e| DocumentError::Parse(format!("Invalid endpoint list: {e}")))?;
    Ok(endpoints.into_iter().map(Endpoint::normalized).collect())
}

/// Write an endpoint list as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns error if the directory or file cannot be written
pub fn save_endpoints(path: &Path, endpoints: &[Endpoint]) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DocumentError::Io(parent.to_path_buf(), e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(endpoints)
        .map_err(|e| DocumentError::Parse(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| DocumentError::Io(path.to_path_buf(), e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Cannot access {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
