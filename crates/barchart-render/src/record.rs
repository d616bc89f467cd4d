use crate::format::js_number_string;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// One bar: field name to JSON value (strings and numbers in practice).
pub type Record = Map<String, Value>;

/// Converts a JSON array of objects into records.
pub fn records_from_value(value: Value) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidDataset {
            message: format!("expected an array of records, got {}", json_kind(&value)),
        });
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(Error::InvalidDataset {
                message: format!("record {idx} is {}, expected an object", json_kind(&other)),
            }),
        })
        .collect()
}

pub fn records_from_str(text: &str) -> Result<Vec<Record>> {
    records_from_value(serde_json::from_str(text)?)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Numeric value of a field. Numeric strings count; blanks, missing fields and anything
/// else do not.
pub fn field_f64(record: &Record, name: &str) -> Option<f64> {
    value_f64(record.get(name)?)
}

pub(crate) fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Display text of a field; missing and null fields render blank.
pub fn field_text(record: &Record, name: &str) -> String {
    record.get(name).map(value_text).unwrap_or_default()
}

pub(crate) fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) => js_number_string(f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
