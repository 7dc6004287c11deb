//! Decodes SOAP responses into a generic keyed tree.
//!
//! Tag names are lowercased and stripped of namespace prefixes. An element holding
//! only text becomes a string; an element with children becomes a mapping in
//! document order; repeated sibling tags collapse into a sequence. Attributes are
//! dropped.

use crate::errors::AppError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() {
            return Value::String(text.to_string());
        }
        let mut children = self.children;
        if !text.is_empty() {
            children.insert("_".to_string(), Value::String(text.to_string()));
        }
        Value::Object(children)
    }

    fn insert(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn text_of(raw: &[u8]) -> Result<&str, AppError> {
    std::str::from_utf8(raw).map_err(|e| AppError::Parse(format!("invalid UTF-8 in text: {}", e)))
}

/// Resolves `amp`, `#38`, `#x26` and the other predefined entity references.
fn resolve_entity(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(code, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(code) = name.strip_prefix('#') {
        return code.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return None,
    };
    Some(resolved.to_string())
}

/// Parses an XML document into a keyed tree rooted at an unnamed mapping.
pub fn parse_xml(xml: &str) -> Result<Value, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::new(tag_name(e.local_name().as_ref()))),
            Event::Empty(e) => {
                let name = tag_name(e.local_name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.insert(name, Value::String(String::new()));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(AppError::Parse("unbalanced closing tag".to_string()));
                }
                if let Some(frame) = stack.pop() {
                    let name = frame.name.clone();
                    let value = frame.into_value();
                    if let Some(parent) = stack.last_mut() {
                        parent.insert(name, value);
                    }
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(text_of(&e)?);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(text_of(&e)?);
                }
            }
            Event::GeneralRef(e) => {
                let name = text_of(&e)?;
                let resolved = resolve_entity(name)
                    .ok_or_else(|| AppError::Parse(format!("unknown entity &{};", name)))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(AppError::Parse("document ended inside an element".to_string()));
    }
    let root = stack.pop().map(|f| f.children).unwrap_or_default();
    if root.is_empty() {
        return Err(AppError::Parse("document has no elements".to_string()));
    }
    Ok(Value::Object(root))
}
