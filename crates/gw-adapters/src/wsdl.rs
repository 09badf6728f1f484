//! WSDL/SOAP adapter (spec.md §4.1, detection order item 4): the first
//! service/port/binding is taken, and each `wsdl:operation` in it becomes
//! one [`Operation`] with a [`SoapDescriptor`] recording the target
//! namespace the executor needs to build envelopes.

use std::collections::BTreeMap;

use gw_core::model::{Operation, Service, SoapDescriptor, Transport};
use gw_core::naming;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::common::{compose_input_schema, static_header};
use crate::error::AdapterError;

/// `true` for XML containing `<definitions>` or `<wsdl:definitions>`.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    text.contains("<definitions") || text.contains(":definitions")
}

struct PendingOp {
    name: String,
    soap_action: Option<String>,
}

/// Parse a WSDL document into a [`Service`]; the base URL must come from
/// `base_url_override` since the WSDL `soap:address` is not resolved here —
/// only the first binding's operations matter to the canonical model.
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let base_url = base_url_override
        .map(str::to_string)
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "WSDL",
        message: e.to_string(),
    })?;

    let (target_namespace, ops) = extract(text).map_err(|message| AdapterError::Parse {
        api: api_name.to_string(),
        format: "WSDL",
        message,
    })?;

    let mut service = Service::new(api_name, base_url);
    for op in ops {
        let tool_name = naming::tool_name(api_name, &op.name);
        let mut static_headers = BTreeMap::new();
        if let Some(action) = &op.soap_action {
            static_headers = static_header("SOAPAction", action);
        }
        let input_schema = compose_input_schema(
            &[],
            None,
            &[("parameters", serde_json::json!({"type": "object"}), false)],
        );
        service.operations.push(Operation {
            service_name: api_name.to_string(),
            id: op.name.clone(),
            tool_name,
            transport: Transport::Soap(SoapDescriptor {
                namespace: target_namespace.clone(),
            }),
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers,
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema,
            summary: None,
        });
    }
    Ok(service)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if String::from_utf8_lossy(a.key.local_name().as_ref()) == name {
            Some(String::from_utf8_lossy(&a.value).to_string())
        } else {
            None
        }
    })
}

fn extract(text: &str) -> Result<(String, Vec<PendingOp>), String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text = true;

    let mut target_namespace = String::new();
    let mut ops: Vec<PendingOp> = Vec::new();
    let mut in_binding = false;
    let mut binding_done = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let name = local_name(&e);
                if name == "definitions" {
                    if let Some(ns) = attr(&e, "targetNamespace") {
                        target_namespace = ns;
                    }
                } else if name == "binding" && !binding_done {
                    in_binding = true;
                } else if name == "operation" && in_binding {
                    if let Some(soap_action) = attr(&e, "soapAction") {
                        if let Some(last) = ops.last_mut() {
                            last.soap_action = Some(soap_action);
                        }
                    } else if let Some(op_name) = attr(&e, "name") {
                        ops.push(PendingOp {
                            name: op_name,
                            soap_action: None,
                        });
                    }
                }
            }
            Event::End(e) => {
                if local_name(&e) == "binding" && in_binding {
                    in_binding = false;
                    binding_done = true;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((target_namespace, ops))
}
