//! Google API Discovery adapter (spec.md §4.1, detection order item 8):
//! JSON documents with a top-level `discoveryVersion` key. `resources` nest
//! recursively; each leaf `methods{}` entry becomes one [`Operation`].

use std::collections::BTreeMap;

use gw_core::model::{Operation, Parameter, ParameterLocation, RequestBody, Service, Transport};
use gw_core::naming;
use serde::Deserialize;

use crate::common::compose_input_schema;
use crate::error::AdapterError;

/// `true` if `raw` is JSON with a top-level `discoveryVersion` key.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(text).is_ok_and(|v| v.get("discoveryVersion").is_some())
}

#[derive(Debug, Deserialize)]
struct DiscoveryDoc {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(rename = "rootUrl")]
    root_url: Option<String>,
    #[serde(rename = "servicePath")]
    service_path: Option<String>,
    #[serde(default)]
    resources: BTreeMap<String, Resource>,
    #[serde(default)]
    methods: BTreeMap<String, Method>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(default)]
    resources: BTreeMap<String, Resource>,
    #[serde(default)]
    methods: BTreeMap<String, Method>,
}

#[derive(Debug, Deserialize)]
struct Method {
    id: String,
    path: String,
    #[serde(rename = "httpMethod")]
    http_method: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: BTreeMap<String, DiscoveryParam>,
    #[serde(default)]
    request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryParam {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default, rename = "type")]
    param_type: Option<String>,
}

/// Parse a Google API Discovery document into a [`Service`].
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "Google API Discovery",
        message: e.to_string(),
    })?;

    let doc: DiscoveryDoc = serde_json::from_str(text).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "Google API Discovery",
        message: e.to_string(),
    })?;

    let derived_base = doc
        .base_url
        .clone()
        .or_else(|| {
            doc.root_url
                .as_ref()
                .map(|root| format!("{}{}", root.trim_end_matches('/'), doc.service_path.clone().unwrap_or_default()))
        });

    let base_url = base_url_override
        .map(str::to_string)
        .or(derived_base)
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let mut service = Service::new(api_name, base_url);

    for method in doc.methods.values() {
        service.operations.push(build_operation(api_name, method));
    }
    for resource in doc.resources.values() {
        walk_resource(api_name, resource, &mut service);
    }

    Ok(service)
}

fn walk_resource(api_name: &str, resource: &Resource, service: &mut Service) {
    for method in resource.methods.values() {
        service.operations.push(build_operation(api_name, method));
    }
    for child in resource.resources.values() {
        walk_resource(api_name, child, service);
    }
}

fn build_operation(api_name: &str, method: &Method) -> Operation {
    let id = method.id.clone();
    let tool_name = naming::tool_name(api_name, &id);

    let mut parameters = Vec::new();
    for (name, param) in &method.parameters {
        let location = match param.location.as_deref() {
            Some("path") => ParameterLocation::Path,
            _ => ParameterLocation::Query,
        };
        let schema_type = param.param_type.clone().unwrap_or_else(|| "string".to_string());
        parameters.push(Parameter {
            name: name.clone(),
            location,
            required: param.required,
            schema: serde_json::json!({"type": schema_type}),
        });
    }

    let request_body = method.request.as_ref().map(|_| RequestBody {
        content_type: "application/json".to_string(),
        required: false,
        schema: serde_json::json!({}),
    });

    let path_template = if method.path.starts_with('/') {
        method.path.clone()
    } else {
        format!("/{}", method.path)
    };

    let input_schema = compose_input_schema(&parameters, request_body.as_ref(), &[]);

    Operation {
        service_name: api_name.to_string(),
        id,
        tool_name,
        transport: Transport::Http {
            method: method.http_method.to_ascii_uppercase(),
            path_template,
        },
        parameters,
        request_body,
        response_schema: None,
        static_headers: BTreeMap::new(),
        dynamic_url_param: None,
        query_params_object: None,
        requires_crumb: false,
        input_schema,
        summary: method.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
{
  "discoveryVersion": "v1",
  "baseUrl": "https://example.googleapis.com/v1/",
  "resources": {
    "files": {
      "methods": {
        "get": {
          "id": "drive.files.get",
          "path": "files/{fileId}",
          "httpMethod": "GET",
          "parameters": {
            "fileId": {"location": "path", "required": true, "type": "string"}
          }
        }
      },
      "resources": {
        "permissions": {
          "methods": {
            "list": {
              "id": "drive.permissions.list",
              "path": "files/{fileId}/permissions",
              "httpMethod": "GET",
              "parameters": {
                "fileId": {"location": "path", "required": true, "type": "string"}
              }
            }
          }
        }
      }
    }
  }
}
"#;

    #[test]
    fn detects_by_discovery_version_key() {
        assert!(detect(DOC.as_bytes()));
        assert!(!detect(b"{\"openapi\":\"3.0.0\"}"));
    }

    #[test]
    fn walks_nested_resources() {
        let svc = parse("drive", DOC.as_bytes(), None).unwrap();
        assert_eq!(svc.base_url, "https://example.googleapis.com/v1/");
        assert_eq!(svc.operations.len(), 2);
        assert!(svc.operations.iter().any(|o| o.id == "drive.files.get"));
        assert!(svc.operations.iter().any(|o| o.id == "drive.permissions.list"));
    }

    #[test]
    fn path_parameter_is_required() {
        let svc = parse("drive", DOC.as_bytes(), None).unwrap();
        let get = svc.operations.iter().find(|o| o.id == "drive.files.get").unwrap();
        let file_id = get.parameters.iter().find(|p| p.name == "fileId").unwrap();
        assert!(file_id.required);
        assert_eq!(file_id.location, ParameterLocation::Path);
    }
}
