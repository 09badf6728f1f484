//! `${VAR}` environment variable expansion (spec.md §6, "Configuration file").
//!
//! Expansion walks every string value in a parsed [`serde_json::Value`]
//! document and substitutes `${VAR}` references from the process
//! environment. An unresolved reference is always fatal — this module never
//! silently leaves a `${VAR}` placeholder in place.

use serde_json::Value;

use crate::error::ConfigError;

/// Recursively expand every `${VAR}` reference in every string leaf of
/// `value`, using `lookup` to resolve variable names.
///
/// Object keys are left untouched; only string values are scanned. Numbers,
/// booleans, and null pass through unchanged.
pub fn expand_env(
    value: Value,
    lookup: impl Fn(&str) -> Option<String> + Copy,
) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => Ok(Value::String(expand_string(&s, lookup)?)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| expand_env(item, lookup))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| expand_env(v, lookup).map(|v| (k, v)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

/// Expand every `${VAR}` occurrence in a single string.
fn expand_string(
    s: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let Some(close) = s[i + 2..].find('}') else {
                // Unmatched `${` — not a reference, keep literally.
                out.push('$');
                i += 1;
                continue;
            };
            let name = &s[i + 2..i + 2 + close];
            let value = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
            out.push_str(&value);
            i += 2 + close + 1;
        } else {
            let ch = s[i..].chars().next().expect("non-empty at index i");
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    Ok(out)
}
