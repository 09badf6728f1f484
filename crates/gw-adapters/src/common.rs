//! Shared helpers used by several REST-family adapters (spec.md §4.1,
//! "Input-schema composition" and "Naming").

use std::collections::BTreeMap;

use gw_core::model::{Parameter, ParameterLocation, RequestBody};

/// Compose the one `object` input schema an [`gw_core::Operation`] exposes:
/// one property per parameter, an optional `body` property, and whichever
/// of `extra_properties` the caller supplies (e.g. `parameters`, `selection`,
/// `url` for Jenkins-shaped operations).
#[must_use]
pub fn compose_input_schema(
    parameters: &[Parameter],
    request_body: Option<&RequestBody>,
    extra_properties: &[(&str, serde_json::Value, bool)],
) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for param in parameters {
        properties.insert(param.name.clone(), param.schema.clone());
        if param.required {
            required.push(param.name.clone());
        }
    }

    if let Some(body) = request_body {
        properties.insert("body".to_string(), body.schema.clone());
        if body.required {
            required.push("body".to_string());
        }
    }

    for (name, schema, is_required) in extra_properties {
        properties.insert((*name).to_string(), schema.clone());
        if *is_required {
            required.push((*name).to_string());
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Build a required-string path parameter.
#[must_use]
pub fn path_param(name: &str) -> Parameter {
    Parameter::required_string(name, ParameterLocation::Path)
}

/// Build an optional query parameter with the given JSON Schema fragment.
#[must_use]
pub fn query_param(name: &str, schema: serde_json::Value) -> Parameter {
    Parameter::optional(name, ParameterLocation::Query, schema)
}

/// Extract every `{name}` path-template placeholder, in order of
/// appearance, so adapters can synthesize path parameters for formats that
/// don't enumerate them explicitly (e.g. OData entity keys).
#[must_use]
pub fn path_template_params(path_template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = path_template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '{' {
            if let Some(end) = path_template[i..].find('}') {
                out.push(path_template[i + 1..i + end].to_string());
            }
        }
    }
    out
}

/// A forced header name/value pair, as a single-entry map (convenience for
/// building `static_headers`).
#[must_use]
pub fn static_header(name: &str, value: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(name.to_string(), value.to_string());
    map
}
