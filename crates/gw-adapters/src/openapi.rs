//! OpenAPI 3 adapter (spec.md §4.1, detection order item 1, REST families
//! normalization rules).

use std::collections::BTreeMap;

use gw_core::model::{Operation, Parameter, ParameterLocation, RequestBody, Service, Transport};
use gw_core::naming;
use openapiv3::{OpenAPI, Operation as OasOperation, Parameter as OasParameter, ReferenceOr};

use crate::common::compose_input_schema;
use crate::error::AdapterError;

/// `true` if `raw` is JSON or YAML with a top-level `openapi` key.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    parse_document(raw).is_some_and(|v| v.get("openapi").and_then(|v| v.as_str()).is_some())
}

fn parse_document(raw: &[u8]) -> Option<serde_json::Value> {
    let text = std::str::from_utf8(raw).ok()?;
    serde_json::from_str(text)
        .ok()
        .or_else(|| serde_yaml_ng::from_str(text).ok())
}

/// Parse an OpenAPI 3 document into a [`Service`], one [`Operation`] per
/// concrete HTTP operation.
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "OpenAPI 3",
        message: e.to_string(),
    })?;

    let doc: OpenAPI = serde_json::from_str(text)
        .or_else(|_| serde_yaml_ng::from_str(text))
        .map_err(|e| AdapterError::Parse {
            api: api_name.to_string(),
            format: "OpenAPI 3",
            message: e.to_string(),
        })?;

    let base_url = base_url_override
        .map(str::to_string)
        .or_else(|| doc.servers.first().map(|s| s.url.clone()))
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let mut service = Service::new(api_name, base_url);

    for (path_template, path_item) in &doc.paths.paths {
        let ReferenceOr::Item(path_item) = path_item else {
            continue;
        };
        for (method, op) in http_methods(path_item) {
            let operation = build_operation(api_name, path_template, method, op)?;
            service.operations.push(operation);
        }
    }

    Ok(service)
}

fn http_methods(item: &openapiv3::PathItem) -> Vec<(&'static str, &OasOperation)> {
    let mut out = Vec::new();
    macro_rules! push {
        ($field:ident, $method:literal) => {
            if let Some(op) = &item.$field {
                out.push(($method, op));
            }
        };
    }
    push!(get, "GET");
    push!(put, "PUT");
    push!(post, "POST");
    push!(delete, "DELETE");
    push!(options, "OPTIONS");
    push!(head, "HEAD");
    push!(patch, "PATCH");
    push!(trace, "TRACE");
    out
}

/// Build one canonical [`Operation`] from an OpenAPI path+method entry.
/// Shared with the Swagger 2 adapter, which converts to an equivalent shape
/// first (see `swagger2.rs`).
pub(crate) fn build_operation(
    api_name: &str,
    path_template: &str,
    method: &str,
    op: &OasOperation,
) -> Result<Operation, AdapterError> {
    let id = op
        .operation_id
        .clone()
        .unwrap_or_else(|| naming::derive_operation_id(method, path_template));
    let tool_name = naming::tool_name(api_name, &id);

    let mut parameters = Vec::new();
    for param_ref in &op.parameters {
        let ReferenceOr::Item(param) = param_ref else {
            continue;
        };
        if let Some(parameter) = convert_parameter(param) {
            parameters.push(parameter);
        }
    }

    let request_body = op.request_body.as_ref().and_then(|rb_ref| {
        let ReferenceOr::Item(rb) = rb_ref else {
            return None;
        };
        // A JSON request body becomes `application/json`; any other content
        // type is carried verbatim and the `body` argument accepted as a raw
        // string (spec.md §4.1, REST families).
        if let Some(media) = rb.content.get("application/json") {
            let schema = media
                .schema
                .as_ref()
                .map(|s| schema_to_json(s))
                .unwrap_or_else(|| serde_json::json!({}));
            Some(RequestBody {
                content_type: "application/json".to_string(),
                required: rb.required,
                schema,
            })
        } else {
            rb.content.keys().next().map(|content_type| RequestBody {
                content_type: content_type.clone(),
                required: rb.required,
                schema: serde_json::json!({ "type": "string" }),
            })
        }
    });

    let response_schema = op
        .responses
        .responses
        .get(&openapiv3::StatusCode::Code(200))
        .and_then(|r| match r {
            ReferenceOr::Item(resp) => resp.content.get("application/json"),
            ReferenceOr::Reference { .. } => None,
        })
        .and_then(|media| media.schema.as_ref())
        .map(schema_to_json);

    let input_schema = compose_input_schema(&parameters, request_body.as_ref(), &[]);

    Ok(Operation {
        service_name: api_name.to_string(),
        id,
        tool_name,
        transport: Transport::Http {
            method: method.to_string(),
            path_template: path_template.to_string(),
        },
        parameters,
        request_body,
        response_schema,
        static_headers: BTreeMap::new(),
        dynamic_url_param: None,
        query_params_object: None,
        requires_crumb: false,
        input_schema,
        summary: op.summary.clone().or_else(|| op.description.clone()),
    })
}

fn convert_parameter(param: &OasParameter) -> Option<Parameter> {
    let (location, data) = match param {
        OasParameter::Path { parameter_data, .. } => (ParameterLocation::Path, parameter_data),
        OasParameter::Query { parameter_data, .. } => (ParameterLocation::Query, parameter_data),
        OasParameter::Header { parameter_data, .. } => (ParameterLocation::Header, parameter_data),
        // Cookie-carried parameters have no place in the canonical model.
        OasParameter::Cookie { .. } => return None,
    };
    // Auth-bearing headers are suppressed; the executor injects auth.
    if location == ParameterLocation::Header && data.name.eq_ignore_ascii_case("authorization") {
        return None;
    }
    let schema = match &data.format {
        openapiv3::ParameterSchemaOrContent::Schema(schema_ref) => schema_to_json(schema_ref),
        openapiv3::ParameterSchemaOrContent::Content(_) => serde_json::json!({ "type": "string" }),
    };
    Some(Parameter {
        name: data.name.clone(),
        location,
        required: data.required,
        schema,
    })
}

/// Best-effort `openapiv3::Schema` → JSON Schema fragment conversion. This
/// is intentionally shallow: it recovers `type`, `enum`, `items`, and
/// `properties`/`required` for objects, which covers the overwhelming
/// majority of real-world specs without pulling in a full `$ref` resolver.
pub(crate) fn schema_to_json(schema_ref: &ReferenceOr<openapiv3::Schema>) -> serde_json::Value {
    let ReferenceOr::Item(schema) = schema_ref else {
        return serde_json::json!({});
    };
    use openapiv3::SchemaKind;
    match &schema.schema_kind {
        SchemaKind::Type(openapiv3::Type::String(_)) => serde_json::json!({"type": "string"}),
        SchemaKind::Type(openapiv3::Type::Number(_)) => serde_json::json!({"type": "number"}),
        SchemaKind::Type(openapiv3::Type::Integer(_)) => serde_json::json!({"type": "integer"}),
        SchemaKind::Type(openapiv3::Type::Boolean(_)) => serde_json::json!({"type": "boolean"}),
        SchemaKind::Type(openapiv3::Type::Array(arr)) => {
            let items = arr
                .items
                .as_ref()
                .map(|i| schema_to_json(&i.clone().unbox()))
                .unwrap_or_else(|| serde_json::json!({}));
            serde_json::json!({"type": "array", "items": items})
        }
        SchemaKind::Type(openapiv3::Type::Object(obj)) => {
            let mut properties = serde_json::Map::new();
            for (name, prop) in &obj.properties {
                properties.insert(name.clone(), schema_to_json(&prop.clone().unbox()));
            }
            serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": obj.required.clone(),
            })
        }
        _ => serde_json::json!({}),
    }
}
