//! Response normalization (spec.md §4.3 step 7).

use gw_core::model::{Operation, Transport};

/// The normalized result of one backend call; mirrors the fixed MCP tool
/// output shape `{status, content_type, body}` (spec.md §3, "Tool").
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorResponse {
    /// HTTP status code returned by the backend.
    pub status: u16,
    /// Content type of the raw response.
    pub content_type: String,
    /// Parsed JSON, decoded XML→JSON (SOAP), or an opaque string.
    pub body: serde_json::Value,
}

/// Normalize a raw response body into the fixed `{status, content_type,
/// body}` shape, truncating bodies over `max_bytes` with a `truncated:
/// true` marker (spec.md §4.3 step 7).
#[must_use]
pub fn normalize(
    operation: &Operation,
    status: u16,
    content_type: &str,
    raw: &[u8],
    max_bytes: usize,
) -> ExecutorResponse {
    let truncated = raw.len() > max_bytes;
    let bounded = if truncated { &raw[..max_bytes] } else { raw };

    let is_soap = matches!(operation.transport, Transport::Soap(_));
    let looks_json = content_type.contains("json");

    let decoded = if is_soap && content_type.contains("xml") {
        soap_response_body(bounded)
    } else if let Ok(text) = std::str::from_utf8(bounded) {
        if looks_json {
            serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
        }
    } else {
        serde_json::Value::String(String::from_utf8_lossy(bounded).into_owned())
    };

    let body = if truncated {
        serde_json::json!({ "truncated": true, "body": decoded })
    } else {
        decoded
    };

    ExecutorResponse {
        status,
        content_type: content_type.to_string(),
        body,
    }
}

/// Decode a SOAP XML response into the `{field: value, ...}` shape that
/// drops the `Envelope`/`Body`/response-element wrapper (spec.md §8
/// scenario 2: `body: {plants: {plant:{id:"1"}}}`). Falls back to the raw
/// text if the XML fails to parse.
fn soap_response_body(raw: &[u8]) -> serde_json::Value {
    let Ok((_, envelope)) = crate::xml::parse(raw) else {
        return serde_json::Value::String(String::from_utf8_lossy(raw).into_owned());
    };
    let Some(body) = envelope.get("Body") else {
        return envelope;
    };
    match body {
        serde_json::Value::Object(map) if map.len() == 1 => {
            map.values().next().cloned().unwrap_or_else(|| body.clone())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::model::SoapDescriptor;
    use std::collections::BTreeMap;

    fn soap_operation() -> Operation {
        Operation {
            service_name: "plants".into(),
            id: "ListPlants".into(),
            tool_name: "plants__ListPlants".into(),
            transport: Transport::Soap(SoapDescriptor {
                namespace: "http://example.com/plants".into(),
            }),
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({}),
            summary: None,
        }
    }

    fn http_operation() -> Operation {
        Operation {
            service_name: "petstore".into(),
            id: "listPets".into(),
            tool_name: "petstore__listPets".into(),
            transport: Transport::Http {
                method: "GET".into(),
                path_template: "/pets".into(),
            },
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({}),
            summary: None,
        }
    }

    #[test]
    fn json_content_type_is_parsed() {
        let response = normalize(
            &http_operation(),
            200,
            "application/json",
            br#"[{"id": 1}]"#,
            1024,
        );
        assert_eq!(response.body, serde_json::json!([{"id": 1}]));
    }

    #[test]
    fn non_json_content_type_that_still_parses_is_decoded() {
        let response = normalize(&http_operation(), 200, "text/plain", br#"{"a":1}"#, 1024);
        assert_eq!(response.body, serde_json::json!({"a": 1}));
    }

    #[test]
    fn opaque_text_stays_a_string() {
        let response = normalize(&http_operation(), 200, "text/plain", b"hello world", 1024);
        assert_eq!(response.body, serde_json::json!("hello world"));
    }

    #[test]
    fn soap_xml_response_decodes_to_unwrapped_map() {
        let xml = br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
            <soap:Body>
                <ListPlantsResponse>
                    <plants><plant><id>1</id></plant></plants>
                </ListPlantsResponse>
            </soap:Body>
        </soap:Envelope>"#;
        let response = normalize(&soap_operation(), 200, "text/xml", xml, 4096);
        assert_eq!(response.body, serde_json::json!({"plants": {"plant": {"id": "1"}}}));
    }

    #[test]
    fn oversized_body_is_truncated_with_marker() {
        let raw = vec![b'a'; 100];
        let response = normalize(&http_operation(), 200, "text/plain", &raw, 10);
        assert_eq!(response.body["truncated"], serde_json::json!(true));
        assert_eq!(response.body["body"], serde_json::json!("a".repeat(10)));
    }

    #[test]
    fn body_within_limit_is_not_truncated() {
        let response = normalize(&http_operation(), 200, "text/plain", b"short", 1024);
        assert_eq!(response.body, serde_json::json!("short"));
    }
}
