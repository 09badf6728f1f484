//! OpenRPC / JSON-RPC adapter (spec.md §4.1, detection order item 6): JSON
//! documents with a top-level `openrpc` key. Each `methods[]` entry becomes
//! one [`Operation`] with [`Transport::JsonRpc`]; the executor synthesises
//! the `{jsonrpc, id, method, params}` envelope at call time from the
//! `body` argument (spec.md §4.1, "OpenRPC / JSON-RPC").

use std::collections::BTreeMap;

use gw_core::model::{Operation, RequestBody, Service, Transport};
use gw_core::naming;
use serde::Deserialize;

use crate::common::compose_input_schema;
use crate::error::AdapterError;

/// `true` if `raw` is JSON with a top-level `openrpc` key.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(text)
        .is_ok_and(|v| v.get("openrpc").is_some())
}

#[derive(Debug, Deserialize)]
struct OpenRpcDoc {
    #[serde(default)]
    servers: Vec<OpenRpcServer>,
    #[serde(default)]
    methods: Vec<OpenRpcMethod>,
}

#[derive(Debug, Deserialize)]
struct OpenRpcServer {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenRpcMethod {
    name: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    params: Vec<OpenRpcParam>,
}

#[derive(Debug, Deserialize)]
struct OpenRpcParam {
    name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    schema: serde_json::Value,
}

/// Parse an OpenRPC document into a [`Service`], one [`Operation`] per
/// `methods[]` entry.
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "OpenRPC",
        message: e.to_string(),
    })?;

    let doc: OpenRpcDoc = serde_json::from_str(text).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "OpenRPC",
        message: e.to_string(),
    })?;

    let base_url = base_url_override
        .map(str::to_string)
        .or_else(|| doc.servers.first().map(|s| s.url.clone()))
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let mut service = Service::new(api_name, base_url);

    for method in &doc.methods {
        let id = method.name.clone();
        let tool_name = naming::tool_name(api_name, &id);

        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &method.params {
            properties.insert(param.name.clone(), param.schema.clone());
            if param.required {
                required.push(param.name.clone());
            }
        }
        let params_schema = serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        let params_required = !required.is_empty();
        let request_body = RequestBody {
            content_type: "application/json".to_string(),
            required: params_required,
            schema: params_schema,
        };

        let input_schema = compose_input_schema(&[], Some(&request_body), &[]);

        service.operations.push(Operation {
            service_name: api_name.to_string(),
            id,
            tool_name,
            transport: Transport::JsonRpc {
                method: method.name.clone(),
            },
            parameters: Vec::new(),
            request_body: Some(request_body),
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema,
            summary: method.summary.clone(),
        });
    }

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
{
  "openrpc": "1.2.6",
  "info": {"title": "demo", "version": "1.0.0"},
  "servers": [{"url": "https://rpc.example/api"}],
  "methods": [
    {
      "name": "getBalance",
      "summary": "Fetch an account balance",
      "params": [
        {"name": "account", "required": true, "schema": {"type": "string"}}
      ]
    },
    {
      "name": "ping",
      "params": []
    }
  ]
}
"#;

    #[test]
    fn detects_by_top_level_key() {
        assert!(detect(DOC.as_bytes()));
        assert!(!detect(b"{\"openapi\":\"3.0.0\"}"));
    }

    #[test]
    fn parses_methods_into_json_rpc_operations() {
        let svc = parse("rpc", DOC.as_bytes(), None).unwrap();
        assert_eq!(svc.base_url, "https://rpc.example/api");
        assert_eq!(svc.operations.len(), 2);
        let get_balance = svc.operations.iter().find(|o| o.id == "getBalance").unwrap();
        assert!(matches!(&get_balance.transport, Transport::JsonRpc { method } if method == "getBalance"));
        assert_eq!(get_balance.tool_name, "rpc__getBalance");
        assert_eq!(
            get_balance.input_schema["required"],
            serde_json::json!(["body"])
        );
    }

    #[test]
    fn method_with_no_required_params_has_optional_body() {
        let svc = parse("rpc", DOC.as_bytes(), None).unwrap();
        let ping = svc.operations.iter().find(|o| o.id == "ping").unwrap();
        assert_eq!(ping.input_schema["required"], serde_json::json!([]));
    }
}
