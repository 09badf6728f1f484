//! Minimal XML→JSON conversion used to decode SOAP responses (spec.md
//! §4.3 step 7: "a decoded XML→JSON map when the Operation is SOAP and the
//! response is XML").
//!
//! Each element becomes a JSON object keyed by its (namespace-stripped)
//! child tag names; repeated same-named children collapse into a JSON
//! array; a leaf element with only text content becomes a JSON string.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Parse `bytes` as XML and return the root element's tag name (with any
/// namespace prefix stripped) and its JSON representation.
pub fn parse(bytes: &[u8]) -> Result<(String, serde_json::Value), String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text = true;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let tag = local_name(&start);
                let value = parse_element(&mut reader, &mut buf)?;
                return Ok((tag, value));
            }
            Event::Empty(start) => {
                let tag = local_name(&start);
                return Ok((tag, serde_json::Value::Object(serde_json::Map::new())));
            }
            Event::Eof => return Err("empty XML document".to_string()),
            _ => {}
        }
        buf.clear();
    }
}

/// Parse everything up to (and consuming) the matching `End` event for the
/// element whose `Start` was already consumed by the caller.
fn parse_element(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> Result<serde_json::Value, String> {
    let mut children: Vec<(String, serde_json::Value)> = Vec::new();
    let mut text = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(buf).map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let tag = local_name(&start);
                let value = parse_element(reader, buf)?;
                children.push((tag, value));
            }
            Event::Empty(start) => {
                let tag = local_name(&start);
                children.push((tag, serde_json::Value::Object(serde_json::Map::new())));
            }
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => break,
            Event::Eof => return Err("unexpected end of XML document".to_string()),
            _ => {}
        }
    }

    if children.is_empty() {
        return Ok(serde_json::Value::String(text.trim().to_string()));
    }

    let mut object = serde_json::Map::new();
    for (tag, value) in children {
        match object.remove(&tag) {
            None => {
                object.insert(tag, value);
            }
            Some(serde_json::Value::Array(mut items)) => {
                items.push(value);
                object.insert(tag, serde_json::Value::Array(items));
            }
            Some(existing) => {
                object.insert(tag, serde_json::Value::Array(vec![existing, value]));
            }
        }
    }
    Ok(serde_json::Value::Object(object))
}

/// Tag name with any namespace prefix stripped.
fn local_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_element_becomes_string() {
        let (tag, value) = parse(b"<id>1</id>").unwrap();
        assert_eq!(tag, "id");
        assert_eq!(value, serde_json::json!("1"));
    }

    #[test]
    fn nested_elements_become_objects() {
        let (tag, value) = parse(b"<plant><id>1</id><name>Fern</name></plant>").unwrap();
        assert_eq!(tag, "plant");
        assert_eq!(value, serde_json::json!({"id": "1", "name": "Fern"}));
    }

    #[test]
    fn repeated_children_collapse_into_array() {
        let (_, value) = parse(b"<plants><plant><id>1</id></plant><plant><id>2</id></plant></plants>").unwrap();
        assert_eq!(
            value,
            serde_json::json!({"plant": [{"id": "1"}, {"id": "2"}]})
        );
    }

    #[test]
    fn namespace_prefixes_are_stripped() {
        let (tag, _) = parse(b"<soap:Envelope xmlns:soap=\"ns\"><soap:Body/></soap:Envelope>").unwrap();
        assert_eq!(tag, "Envelope");
    }

    #[test]
    fn empty_element_becomes_empty_object() {
        let (tag, value) = parse(b"<thing/>").unwrap();
        assert_eq!(tag, "thing");
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn entities_are_unescaped() {
        let (_, value) = parse(b"<name>Rose &amp; Co</name>").unwrap();
        assert_eq!(value, serde_json::json!("Rose & Co"));
    }
}
