//! Postman v2 collection adapter (spec.md §4.1, detection order item 7):
//! JSON whose `info.schema` matches Postman's collection schema URI. Each
//! request item (recursing through folders) becomes one [`Operation`],
//! sharing the REST-family normalization rules with the OpenAPI adapter.

use std::collections::BTreeMap;

use gw_core::model::{Operation, Parameter, ParameterLocation, RequestBody, Service, Transport};
use gw_core::naming;
use serde::Deserialize;

use crate::common::compose_input_schema;
use crate::error::AdapterError;

const SCHEMA_PREFIX: &str = "https://schema.getpostman.com/json/collection/v2.";

/// `true` if `raw` is JSON with `info.schema` matching a Postman v2 schema URI.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(text).is_ok_and(|v| {
        v.get("info")
            .and_then(|i| i.get("schema"))
            .and_then(|s| s.as_str())
            .is_some_and(|s| s.starts_with(SCHEMA_PREFIX))
    })
}

#[derive(Debug, Deserialize)]
struct Collection {
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    #[serde(default)]
    item: Vec<Item>,
    #[serde(default)]
    request: Option<Request>,
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default = "default_method")]
    method: String,
    url: Url,
    #[serde(default)]
    header: Vec<KeyValue>,
    #[serde(default)]
    body: Option<Body>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Url {
    Raw(String),
    Detailed {
        raw: String,
        #[serde(default)]
        query: Vec<KeyValue>,
    },
}

#[derive(Debug, Deserialize)]
struct KeyValue {
    key: String,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct Body {
    mode: String,
    #[serde(default)]
    raw: Option<String>,
}

/// Parse a Postman v2 collection into a [`Service`], one [`Operation`] per
/// leaf request item (folders are traversed, never emitted themselves).
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "Postman v2",
        message: e.to_string(),
    })?;

    let collection: Collection = serde_json::from_str(text).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "Postman v2",
        message: e.to_string(),
    })?;

    let base_url = base_url_override
        .map(str::to_string)
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let mut service = Service::new(api_name, base_url.clone());
    let mut index = 0usize;
    collect_items(api_name, &base_url, &collection.item, &mut service, &mut index);
    Ok(service)
}

fn collect_items(
    api_name: &str,
    base_url: &str,
    items: &[Item],
    service: &mut Service,
    index: &mut usize,
) {
    for item in items {
        if let Some(request) = &item.request {
            *index += 1;
            let id = naming::derive_operation_id(&request.method, &item.name);
            service
                .operations
                .push(build_operation(api_name, base_url, &id, item, request));
        }
        if !item.item.is_empty() {
            collect_items(api_name, base_url, &item.item, service, index);
        }
    }
}

fn build_operation(api_name: &str, base_url: &str, id: &str, item: &Item, request: &Request) -> Operation {
    let tool_name = naming::tool_name(api_name, id);
    let method = request.method.to_ascii_uppercase();

    let raw_url = match &request.url {
        Url::Raw(s) => s.clone(),
        Url::Detailed { raw, .. } => raw.clone(),
    };
    let path_template = raw_url.strip_prefix(base_url).unwrap_or(&raw_url).to_string();
    let path_template = if path_template.is_empty() {
        "/".to_string()
    } else {
        path_template
    };

    let mut parameters = Vec::new();
    if let Url::Detailed { query, .. } = &request.url {
        for q in query {
            if q.disabled {
                continue;
            }
            parameters.push(Parameter::optional(
                q.key.clone(),
                ParameterLocation::Query,
                serde_json::json!({"type": "string"}),
            ));
        }
    }
    for h in &request.header {
        if h.disabled || h.key.eq_ignore_ascii_case("authorization") {
            continue;
        }
        parameters.push(Parameter::optional(
            h.key.clone(),
            ParameterLocation::Header,
            serde_json::json!({"type": "string"}),
        ));
    }

    let request_body = request.body.as_ref().and_then(|b| {
        if b.mode == "raw" {
            Some(RequestBody {
                content_type: "application/json".to_string(),
                required: false,
                schema: serde_json::json!({}),
            })
        } else {
            None
        }
    });

    let input_schema = compose_input_schema(&parameters, request_body.as_ref(), &[]);

    Operation {
        service_name: api_name.to_string(),
        id: id.to_string(),
        tool_name,
        transport: Transport::Http {
            method,
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
        summary: Some(item.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"
{
  "info": {
    "name": "Demo",
    "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
  },
  "item": [
    {
      "name": "List pets",
      "request": {
        "method": "GET",
        "url": {"raw": "https://petstore.example/v1/pets", "query": [{"key": "limit"}]}
      }
    },
    {
      "name": "Admin",
      "item": [
        {
          "name": "Create pet",
          "request": {
            "method": "POST",
            "url": "https://petstore.example/v1/pets",
            "header": [{"key": "Authorization"}],
            "body": {"mode": "raw", "raw": "{}"}
          }
        }
      ]
    }
  ]
}
"#;

    #[test]
    fn detects_by_schema_uri() {
        assert!(detect(COLLECTION.as_bytes()));
        assert!(!detect(b"{\"openapi\":\"3.0.0\"}"));
    }

    #[test]
    fn flattens_nested_folders() {
        let svc = parse(
            "petstore",
            COLLECTION.as_bytes(),
            Some("https://petstore.example/v1"),
        )
        .unwrap();
        assert_eq!(svc.operations.len(), 2);
    }

    #[test]
    fn strips_base_url_from_path_template() {
        let svc = parse(
            "petstore",
            COLLECTION.as_bytes(),
            Some("https://petstore.example/v1"),
        )
        .unwrap();
        let list = svc
            .operations
            .iter()
            .find(|o| matches!(&o.transport, Transport::Http { method, .. } if method == "GET"))
            .unwrap();
        assert!(matches!(&list.transport, Transport::Http { path_template, .. } if path_template == "/pets"));
    }

    #[test]
    fn authorization_header_is_suppressed() {
        let svc = parse(
            "petstore",
            COLLECTION.as_bytes(),
            Some("https://petstore.example/v1"),
        )
        .unwrap();
        let create = svc
            .operations
            .iter()
            .find(|o| matches!(&o.transport, Transport::Http { method, .. } if method == "POST"))
            .unwrap();
        assert!(create.parameters.iter().all(|p| !p.name.eq_ignore_ascii_case("authorization")));
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = parse("petstore", COLLECTION.as_bytes(), None).unwrap_err();
        assert!(matches!(err, AdapterError::MissingBaseUrl { .. }));
    }
}
