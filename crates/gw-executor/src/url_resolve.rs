//! Target URL resolution (spec.md §4.3 step 1).
//!
//! Either the caller's `dynamic_url_param` value is used outright (Jenkins
//! `url`, constrained to the service's host), or path parameters are
//! substituted into the operation's path template against the service base
//! URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use gw_core::model::Operation;

use crate::error::ExecutorError;

/// Characters that must be percent-encoded when substituted into a path
/// segment (everything outside the unreserved set, `CONTROLS` plus the
/// handful of path-significant delimiters).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'[')
    .add(b']')
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Resolve the full request URL for `operation` given `args` and the
/// service's `base_url`.
///
/// If `operation.dynamic_url_param` is set and the caller supplied a value
/// for it, that value is used as the URL outright — but only if its scheme
/// and host match `base_url`'s (cross-host redirection prevention).
/// Otherwise the operation's path template (when `Transport::Http`) has its
/// `{name}` placeholders filled with percent-encoded argument values;
/// missing required path parameters are an immediate error.
pub fn resolve_url(
    operation: &Operation,
    base_url: &str,
    args: &serde_json::Map<String, serde_json::Value>,
    path_template: &str,
) -> Result<String, ExecutorError> {
    if operation.uses_dynamic_url(args) {
        let param = operation
            .dynamic_url_param
            .as_deref()
            .expect("uses_dynamic_url implies dynamic_url_param is Some");
        let candidate = args
            .get(param)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ExecutorError::MissingPathParameter {
                operation: operation.tool_name.clone(),
                name: param.to_string(),
            })?;
        return validate_same_host(operation, base_url, candidate);
    }

    fill_path_template(operation, base_url, path_template, args)
}

/// Reject `candidate` unless its scheme and host match `base_url`'s.
fn validate_same_host(
    operation: &Operation,
    base_url: &str,
    candidate: &str,
) -> Result<String, ExecutorError> {
    let base = Url::parse(base_url).map_err(|_| ExecutorError::CrossHostUrl {
        operation: operation.tool_name.clone(),
        attempted: candidate.to_string(),
    })?;
    let target = Url::parse(candidate).map_err(|_| ExecutorError::CrossHostUrl {
        operation: operation.tool_name.clone(),
        attempted: candidate.to_string(),
    })?;
    if target.scheme() != base.scheme() || target.host_str() != base.host_str() {
        return Err(ExecutorError::CrossHostUrl {
            operation: operation.tool_name.clone(),
            attempted: candidate.to_string(),
        });
    }
    Ok(target.to_string())
}

fn fill_path_template(
    operation: &Operation,
    base_url: &str,
    path_template: &str,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Result<String, ExecutorError> {
    let mut path = String::with_capacity(path_template.len());
    let mut chars = path_template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            let mut name = String::new();
            for c2 in chars.by_ref() {
                if c2 == '}' {
                    break;
                }
                name.push(c2);
            }
            match args.get(&name).and_then(value_as_path_segment) {
                Some(v) => path.push_str(&utf8_percent_encode(&v, PATH_SEGMENT).to_string()),
                None => {
                    return Err(ExecutorError::MissingPathParameter {
                        operation: operation.tool_name.clone(),
                        name,
                    });
                }
            }
        } else {
            path.push(c);
        }
    }

    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        Ok(format!("{base}{path}"))
    } else {
        Ok(format!("{base}/{path}"))
    }
}

/// Render a JSON argument value as a single path segment string. Arrays and
/// objects have no sensible path representation and are rejected by
/// returning `None`, which surfaces as a missing-parameter error.
fn value_as_path_segment(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
