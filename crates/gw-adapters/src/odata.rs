//! OData v4 adapter (spec.md §4.1, detection order item 5): CSDL metadata
//! XML is read for `EntityType`/`EntitySet` pairs, and each `EntitySet`
//! emits a CRUD bundle (list/get/create/update/delete) using OData
//! conventions.

use std::collections::{BTreeMap, HashMap};

use gw_core::model::{Operation, Parameter, Service, Transport};
use gw_core::naming;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::common::{compose_input_schema, path_param, query_param};
use crate::error::AdapterError;

/// `true` for CSDL metadata XML: an `edmx:Edmx` root, or a bare `Schema`
/// document containing `EntityContainer`.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    text.contains("Edmx") && text.contains("EntityContainer")
}

struct EntitySet {
    name: String,
    entity_type: String,
}

/// Parse CSDL metadata into a [`Service`], one CRUD bundle per `EntitySet`.
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
        format: "OData v4",
        message: e.to_string(),
    })?;

    let (entity_keys, entity_sets) = extract(text).map_err(|message| AdapterError::Parse {
        api: api_name.to_string(),
        format: "OData v4",
        message,
    })?;

    let mut service = Service::new(api_name, base_url);
    for set in entity_sets {
        let key_name = entity_keys
            .get(&set.entity_type)
            .cloned()
            .unwrap_or_else(|| "id".to_string());
        for op in build_crud_bundle(api_name, &set.name, &key_name) {
            service.operations.push(op);
        }
    }
    Ok(service)
}

fn build_crud_bundle(api_name: &str, set_name: &str, key_name: &str) -> Vec<Operation> {
    let odata_query_params = |include_select_expand: bool| -> Vec<Parameter> {
        let mut params = vec![
            query_param("$filter", serde_json::json!({"type": "string"})),
            query_param("$top", serde_json::json!({"type": "integer"})),
            query_param("$skip", serde_json::json!({"type": "integer"})),
        ];
        if include_select_expand {
            params.push(query_param("$select", serde_json::json!({"type": "string"})));
            params.push(query_param("$expand", serde_json::json!({"type": "string"})));
        }
        params
    };

    let make = |id: &str, method: &str, path: String, parameters: Vec<Parameter>| -> Operation {
        let tool_name = naming::tool_name(api_name, id);
        let input_schema = compose_input_schema(&parameters, None, &[]);
        Operation {
            service_name: api_name.to_string(),
            id: id.to_string(),
            tool_name,
            transport: Transport::Http {
                method: method.to_string(),
                path_template: path,
            },
            parameters,
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema,
            summary: None,
        }
    };

    let list_id = format!("list{set_name}");
    let get_id = format!("get{set_name}");
    let create_id = format!("create{set_name}");
    let update_id = format!("update{set_name}");
    let delete_id = format!("delete{set_name}");

    vec![
        make(&list_id, "GET", format!("/{set_name}"), odata_query_params(true)),
        make(
            &get_id,
            "GET",
            format!("/{set_name}({{{key_name}}})"),
            {
                let mut p = vec![path_param(key_name)];
                p.extend(odata_query_params(true));
                p
            },
        ),
        make(&create_id, "POST", format!("/{set_name}"), vec![]),
        make(
            &update_id,
            "PATCH",
            format!("/{set_name}({{{key_name}}})"),
            vec![path_param(key_name)],
        ),
        make(
            &delete_id,
            "DELETE",
            format!("/{set_name}({{{key_name}}})"),
            vec![path_param(key_name)],
        ),
    ]
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

/// Returns (entity type short name -> key property name, list of entity sets).
fn extract(text: &str) -> Result<(HashMap<String, String>, Vec<EntitySet>), String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text = true;

    let mut keys: HashMap<String, String> = HashMap::new();
    let mut sets = Vec::new();
    let mut current_entity_type: Option<String> = None;
    let mut in_key_block = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                match local_name(&e).as_str() {
                    "EntityType" => current_entity_type = attr(&e, "Name"),
                    "Key" => in_key_block = true,
                    "PropertyRef" if in_key_block => {
                        if let (Some(type_name), Some(key_name)) =
                            (current_entity_type.clone(), attr(&e, "Name"))
                        {
                            keys.entry(type_name).or_insert(key_name);
                        }
                    }
                    "EntitySet" => {
                        if let Some(name) = attr(&e, "Name") {
                            let entity_type = attr(&e, "EntityType")
                                .and_then(|t| t.rsplit('.').next().map(str::to_string))
                                .unwrap_or_else(|| name.clone());
                            sets.push(EntitySet { name, entity_type });
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                let name = local_name(&e);
                if name == "Key" {
                    in_key_block = false;
                } else if name == "EntityType" {
                    current_entity_type = None;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((keys, sets))
}
