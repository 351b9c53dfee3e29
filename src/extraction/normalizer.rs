use crate::models::ExtractionRecord;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const SUMMARY_MAX_CHARS: usize = 200;

/// Why a model reply could not be turned into a record.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("reply is a list without a leading object: {0}")]
    UnexpectedList(String),
    #[error("reply has unexpected JSON type: {0}")]
    UnexpectedType(&'static str),
    #[error("reply object failed field validation: {0}")]
    InvalidFields(#[source] serde_json::Error),
}

/// Turn a raw model reply into a record, degrading every failure to an
/// all-null record plus a warning.
pub fn normalize_response(raw: &str) -> ExtractionRecord {
    match parse_record(raw) {
        Ok(record) => {
            debug!("Model reply normalized, empty: {}", record.is_empty());
            record
        }
        Err(e) => {
            warn!(payload = %summarize(raw), "Discarding model reply: {}", e);
            ExtractionRecord::default()
        }
    }
}

/// Strict parse of a model reply.
///
/// A top-level list is accepted only when its first element is an object, and
/// only that element is used. Any field with an incompatible type rejects the
/// whole object.
pub fn parse_record(raw: &str) -> Result<ExtractionRecord, NormalizeError> {
    let value: Value = serde_json::from_str(raw).map_err(NormalizeError::InvalidJson)?;

    let object = match value {
        Value::Object(object) => object,
        Value::Array(items) => first_object(items)?,
        other => return Err(NormalizeError::UnexpectedType(json_type_name(&other))),
    };

    serde_json::from_value(Value::Object(object)).map_err(NormalizeError::InvalidFields)
}

fn first_object(items: Vec<Value>) -> Result<Map<String, Value>, NormalizeError> {
    let len = items.len();
    match items.into_iter().next() {
        Some(Value::Object(object)) => {
            debug!("Model returned a list of {} items, using the first", len);
            Ok(object)
        }
        Some(other) => Err(NormalizeError::UnexpectedList(format!(
            "first of {len} items is {}",
            json_type_name(&other)
        ))),
        None => Err(NormalizeError::UnexpectedList("empty list".to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn summarize(raw: &str) -> String {
    let mut summary: String = raw.chars().take(SUMMARY_MAX_CHARS).collect();
    if raw.chars().count() > SUMMARY_MAX_CHARS {
        summary.push_str("...");
    }
    summary
}
