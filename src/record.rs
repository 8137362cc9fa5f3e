//! Bibliographic records and the loader that materialises them from JSON.
//!
//! A record collection is either a flat JSON array of record objects, or the
//! envelope produced by transcoding a reference-manager export, where the
//! records sit under `Documents.Document`.

use log::debug;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One bibliographic entry, kept exactly as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    index: usize,
    fields: Map<String, Value>,
}

impl Record {
    /// Wraps a JSON object found at position `index` of its collection.
    pub fn new(index: usize, fields: Map<String, Value>) -> Self {
        Self { index, fields }
    }

    /// Position of the record in the collection it was loaded from.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The untouched field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The record title, or `MissingField` if there is none.
    pub fn title(&self) -> Result<String> {
        self.text("title").ok_or(Error::MissingField {
            index: self.index,
            field: "title",
        })
    }

    /// The abstract, if present and non-empty.
    pub fn abstract_text(&self) -> Option<String> {
        self.text("abstract").filter(|a| !a.trim().is_empty())
    }

    /// Raw keyword strings. A string field is a single keyword; an array
    /// contributes one keyword per text entry. A wrapper element such as
    /// `<keywords><keyword>..</keyword></keywords>` is looked through.
    pub fn keywords(&self) -> Vec<String> {
        self.fields
            .get("keywords")
            .map(keyword_values)
            .unwrap_or_default()
    }

    /// Publication year, when it parses as an integer.
    pub fn year(&self) -> Option<i64> {
        let parsed = match self.fields.get("year") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(other @ Value::Object(_)) => {
                value_text(other).and_then(|s| s.trim().parse::<i64>().ok())
            }
            _ => None,
        };
        if parsed.is_none() {
            debug!(
                "record #{}: unusable year {:?}",
                self.index,
                self.fields.get("year")
            );
        }
        parsed
    }

    fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(value_text)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Reads a field value as text. Strings and numbers are taken as they are.
/// Objects yield their `#text` entry, or the text of their only child
/// element, which unwraps styled fields such as `<title><style>..</style></title>`.
/// Arrays (a title split into several style runs) yield their pieces joined
/// by single spaces.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("#text") {
            Some(text) => value_text(text),
            None => only_child(map).and_then(value_text),
        },
        Value::Array(items) => {
            let pieces: Vec<String> = items.iter().filter_map(value_text).collect();
            if pieces.is_empty() {
                return None;
            }
            Some(pieces.join(" ").split_whitespace().collect::<Vec<_>>().join(" "))
        }
        _ => None,
    }
}

fn keyword_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::Object(map) if !map.contains_key("#text") => {
            only_child(map).map(keyword_values).unwrap_or_default()
        }
        other => value_text(other).into_iter().collect(),
    }
}

/// The single non-attribute entry of an element, if it has exactly one.
fn only_child(map: &Map<String, Value>) -> Option<&Value> {
    let mut children = map.iter().filter(|(k, _)| !k.starts_with('@'));
    match (children.next(), children.next()) {
        (Some((_, only)), None) => Some(only),
        _ => None,
    }
}

/// Turns a parsed JSON document into records.
///
/// # Example
/// ```
/// use bibliostat::load;
/// let doc = serde_json::json!([{"title": "Gene Expression"}, {"title": "RNA Analysis"}]);
/// let records = load(doc, "inline").unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].title().unwrap(), "RNA Analysis");
/// ```
pub fn load(document: Value, source_name: &str) -> Result<Vec<Record>> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut root) => unwrap_envelope(&mut root)
            .ok_or_else(|| Error::format(source_name, "no Documents.Document collection"))?,
        other => {
            return Err(Error::format(
                source_name,
                format!("expected an array or object, found {}", kind(&other)),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Record::new(index, fields)),
            other => Err(Error::format(
                source_name,
                format!("record #{index} is {}, not an object", kind(&other)),
            )),
        })
        .collect()
}

/// Parses JSON text and loads the records it holds.
pub fn parse_records(text: &str, source_name: &str) -> Result<Vec<Record>> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| Error::format(source_name, e))?;
    load(document, source_name)
}

fn unwrap_envelope(root: &mut Map<String, Value>) -> Option<Vec<Value>> {
    let documents = root.get_mut("Documents")?.as_object_mut()?;
    match documents.remove("Document")? {
        Value::Array(items) => Some(items),
        // a single document is transcoded as a bare object
        single @ Value::Object(_) => Some(vec![single]),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
