//! XML to JSON transcoding of reference-manager exports.
//!
//! The mapping mirrors what Python's `xmltodict` produces, so collections
//! converted here load the same way as historical exports:
//! - an element holding only text becomes a string, an empty one `null`
//! - attributes become `@name` keys
//! - text next to attributes or children is stored under `#text`
//! - a child name that repeats becomes an array

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use log::info;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::export::write_json;

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>, source: &str) -> Result<Self> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::format(source, e))?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let raw = String::from_utf8_lossy(&attr.value);
            fields.insert(key, Value::String(unescaped(&raw).into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            if !text.is_empty() {
                self.fields
                    .insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(self.fields)
        };
        (self.name, value)
    }
}

fn attach(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn unescaped(raw: &str) -> Cow<'_, str> {
    unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Converts an XML document into its JSON structure.
///
/// # Example
/// ```
/// use bibliostat::xml_to_json;
/// let json = xml_to_json("<a><b>1</b><b>2</b></a>", "inline").unwrap();
/// assert_eq!(json, serde_json::json!({"a": {"b": ["1", "2"]}}));
/// ```
pub fn xml_to_json(xml: &str, source: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut root = Map::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Frame::open(&e, source)?),
            Ok(Event::Empty(e)) => {
                let (name, value) = Frame::open(&e, source)?.close();
                let parent = stack.last_mut().map_or(&mut root, |f| &mut f.fields);
                attach(parent, name, value);
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::format(source, "closing tag without opening tag"))?;
                let (name, value) = frame.close();
                let parent = stack.last_mut().map_or(&mut root, |f| &mut f.fields);
                attach(parent, name, value);
            }
            Ok(Event::Text(t)) => {
                if let Some(frame) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&t);
                    frame.text.push_str(&unescaped(&raw));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(frame) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&r);
                    match resolve_entity(&name) {
                        Some(c) => frame.text.push(c),
                        None => {
                            frame.text.push('&');
                            frame.text.push_str(&name);
                            frame.text.push(';');
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::format(
                    source,
                    format!("XML error at byte {}: {e}", reader.error_position()),
                ));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::format(
            source,
            format!("element <{}> is never closed", open.name),
        ));
    }
    if root.is_empty() {
        return Err(Error::format(source, "document has no root element"));
    }
    Ok(Value::Object(root))
}

/// Reads an XML export and writes its JSON transcription.
pub fn transcode_file(xml_path: &Path, json_path: &Path) -> Result<()> {
    let xml = fs::read_to_string(xml_path).map_err(|e| Error::io(xml_path, e))?;
    let json = xml_to_json(&xml, &xml_path.display().to_string())?;
    write_json(&json, json_path)?;
    info!("transcoded {} -> {}", xml_path.display(), json_path.display());
    Ok(())
}
