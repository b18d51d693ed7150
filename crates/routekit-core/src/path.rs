//! Route path normalization and parameter extraction
//!
//! Two parameter notations are recognised everywhere: `:name` (Express-style)
//! and `{name}` (OpenAPI-style). The canonical model stores `:name`.

/// Characters allowed in a `:name` segment.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parameter names in the order they appear, one entry per occurrence.
///
/// `"/a/:id/b/{name}"` → `["id", "name"]`
#[must_use]
pub fn extract_parameters(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;

    while let Some(pos) = rest.find(|c: char| c == ':' || c == '{') {
        let after = &rest[pos + 1..];
        if rest[pos..].starts_with(':') {
            let len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
            if len > 0 {
                names.push(after[..len].to_string());
            }
            rest = &after[len..];
        } else {
            match after.find('}') {
                Some(end) if end > 0 && !after[..end].contains(['/', '{']) => {
                    names.push(after[..end].to_string());
                    rest = &after[end + 1..];
                }
                Some(_) => rest = after,
                None => break,
            }
        }
    }

    names
}

/// Collapse every run of `/` into a single `/`.
#[must_use]
pub fn normalize_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Join a mount path and a sub-path for nested routers.
///
/// The result always starts with `/`, never contains `//`, and has no
/// trailing `/` unless it is the root.
#[must_use]
pub fn join_paths(base: &str, sub: &str) -> String {
    let mut joined = normalize_slashes(&format!("/{base}/{sub}"));
    if joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }
    joined
}

/// Rewrite `{name}` segments to `:name`; `:name` segments pass through.
#[must_use]
pub fn to_canonical(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(end) if end > 0 && !after[..end].contains(['/', '{']) => {
                out.push(':');
                out.push_str(&after[..end]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite `:name` segments to `{name}` for OpenAPI-style output.
#[must_use]
pub fn to_openapi(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    let mut rest = path;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
        if len > 0 {
            out.push('{');
            out.push_str(&after[..len]);
            out.push('}');
        } else {
            out.push(':');
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}
