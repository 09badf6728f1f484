//! gRPC adapter (spec.md §4.1, detection order item 10): only consulted
//! when `spec_type: grpc` is declared. Reflects against the live server via
//! `tonic-reflection`, decodes the returned `FileDescriptorProto`s with
//! `prost-reflect`, and emits one [`Operation`] per unary method.
//!
//! This module only covers the ingestion-time half of spec.md §4.1's
//! "translated into a JSON Schema and back at call time" — `gw-executor`
//! does not re-encode the JSON `body` argument back to protobuf or place a
//! real unary call; see DESIGN.md's `gw-executor` entry for the deviation.

use std::collections::{BTreeMap, HashMap};

use gw_core::model::{Operation, Service, Transport};
use gw_core::naming;
use prost::Message;
use prost_reflect::{DescriptorPool, FieldDescriptor, Kind, MessageDescriptor};
use tonic::transport::Channel;
use tonic_reflection::pb::v1::server_reflection_client::ServerReflectionClient;
use tonic_reflection::pb::v1::server_reflection_request::MessageRequest;
use tonic_reflection::pb::v1::server_reflection_response::MessageResponse;
use tonic_reflection::pb::v1::ServerReflectionRequest;

use crate::common::compose_input_schema;
use crate::error::AdapterError;

/// `true` when the configuration explicitly declares `spec_type: grpc`.
#[must_use]
pub fn detect_by_hint(spec_type: Option<&str>) -> bool {
    spec_type == Some("grpc")
}

/// Connect to `base_url` and reflect its full service/method/message graph
/// into a [`Service`] of canonical Operations.
pub async fn discover(api_name: &str, base_url: &str) -> Result<Service, AdapterError> {
    let channel = Channel::from_shared(base_url.to_string())
        .map_err(|e| AdapterError::Reflection {
            api: api_name.to_string(),
            message: e.to_string(),
        })?
        .connect()
        .await
        .map_err(|e| AdapterError::Reflection {
            api: api_name.to_string(),
            message: e.to_string(),
        })?;

    let pool = reflect_pool(api_name, channel).await?;

    let mut service = Service::new(api_name, base_url);
    for svc_desc in pool.services() {
        for method in svc_desc.methods() {
            if method.is_client_streaming() || method.is_server_streaming() {
                // Streaming RPCs have no place in a request/response tool call.
                continue;
            }
            let id = format!("{}.{}", svc_desc.full_name(), method.name());
            let tool_name = naming::tool_name(api_name, &id);
            let input_schema_body = message_to_json_schema(&method.input(), &mut HashMap::new());
            let request_body = gw_core::model::RequestBody {
                content_type: "application/json".to_string(),
                required: false,
                schema: input_schema_body,
            };
            let input_schema = compose_input_schema(&[], Some(&request_body), &[]);

            service.operations.push(Operation {
                service_name: api_name.to_string(),
                id,
                tool_name,
                transport: Transport::Grpc {
                    service: svc_desc.full_name().to_string(),
                    method: method.name().to_string(),
                },
                parameters: Vec::new(),
                request_body: Some(request_body),
                response_schema: None,
                static_headers: BTreeMap::new(),
                dynamic_url_param: None,
                query_params_object: None,
                requires_crumb: false,
                input_schema,
                summary: None,
            });
        }
    }

    Ok(service)
}

async fn reflect_pool(api_name: &str, channel: Channel) -> Result<DescriptorPool, AdapterError> {
    let mut client = ServerReflectionClient::new(channel);
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let outbound = tokio_stream::wrappers::ReceiverStream::new(rx);
    let response = client
        .server_reflection_info(outbound)
        .await
        .map_err(|e| AdapterError::Reflection {
            api: api_name.to_string(),
            message: e.to_string(),
        })?;
    let mut inbound = response.into_inner();

    let reflect_err = |message: String| AdapterError::Reflection {
        api: api_name.to_string(),
        message,
    };

    tx.send(ServerReflectionRequest {
        host: String::new(),
        message_request: Some(MessageRequest::ListServices(String::new())),
    })
    .await
    .map_err(|e| reflect_err(e.to_string()))?;

    let list_response = inbound
        .message()
        .await
        .map_err(|e| reflect_err(e.to_string()))?
        .ok_or_else(|| reflect_err("reflection stream closed before ListServices reply".to_string()))?;

    let service_names: Vec<String> = match list_response.message_response {
        Some(MessageResponse::ListServicesResponse(resp)) => {
            resp.service.into_iter().map(|s| s.name).collect()
        }
        _ => return Err(reflect_err("unexpected reflection response to ListServices".to_string())),
    };

    let mut file_protos: HashMap<String, prost_types::FileDescriptorProto> = HashMap::new();
    for name in &service_names {
        if name.starts_with("grpc.reflection.") {
            continue;
        }
        tx.send(ServerReflectionRequest {
            host: String::new(),
            message_request: Some(MessageRequest::FileContainingSymbol(name.clone())),
        })
        .await
        .map_err(|e| reflect_err(e.to_string()))?;

        let response = inbound
            .message()
            .await
            .map_err(|e| reflect_err(e.to_string()))?
            .ok_or_else(|| reflect_err(format!("reflection stream closed while resolving `{name}`")))?;

        match response.message_response {
            Some(MessageResponse::FileDescriptorResponse(fd)) => {
                for bytes in fd.file_descriptor_proto {
                    let proto = prost_types::FileDescriptorProto::decode(bytes.as_slice())
                        .map_err(|e| reflect_err(e.to_string()))?;
                    if let Some(file_name) = proto.name.clone() {
                        file_protos.entry(file_name).or_insert(proto);
                    }
                }
            }
            _ => return Err(reflect_err(format!("unexpected reflection response for `{name}`"))),
        }
    }
    drop(tx);

    let set = prost_types::FileDescriptorSet {
        file: file_protos.into_values().collect(),
    };
    DescriptorPool::decode(set.encode_to_vec().as_slice())
        .map_err(|e| reflect_err(format!("failed to build descriptor pool: {e}")))
}

/// Best-effort gRPC message -> JSON Schema translation, mirroring the
/// shallow approach `openapi::schema_to_json` takes for OpenAPI schemas.
/// `seen` breaks cycles between self-referential messages.
fn message_to_json_schema(
    msg: &MessageDescriptor,
    seen: &mut HashMap<String, ()>,
) -> serde_json::Value {
    if seen.contains_key(msg.full_name()) {
        return serde_json::json!({});
    }
    seen.insert(msg.full_name().to_string(), ());

    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for field in msg.fields() {
        properties.insert(field.name().to_string(), field_to_json_schema(&field, seen));
        if field.cardinality() == prost_reflect::Cardinality::Required {
            required.push(field.name().to_string());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn field_to_json_schema(field: &FieldDescriptor, seen: &mut HashMap<String, ()>) -> serde_json::Value {
    let scalar = match field.kind() {
        Kind::Double | Kind::Float => serde_json::json!({"type": "number"}),
        Kind::Int32 | Kind::Int64 | Kind::Uint32 | Kind::Uint64 | Kind::Sint32 | Kind::Sint64
        | Kind::Fixed32 | Kind::Fixed64 | Kind::Sfixed32 | Kind::Sfixed64 => {
            serde_json::json!({"type": "integer"})
        }
        Kind::Bool => serde_json::json!({"type": "boolean"}),
        Kind::String | Kind::Bytes | Kind::Enum(_) => serde_json::json!({"type": "string"}),
        Kind::Message(inner) => message_to_json_schema(&inner, seen),
    };
    if field.is_list() {
        serde_json::json!({"type": "array", "items": scalar})
    } else {
        scalar
    }
}
