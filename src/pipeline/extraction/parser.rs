use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::types::{DocumentRecord, ParseOutcome, UnparseableReason};

/// Keys the model is asked to return, in prompt order.
pub const REQUIRED_FIELDS: [&str; 6] = ["name", "id_num", "doc_type", "lang", "tamper", "reason"];

/// First `{` through last `}`, across newlines.
static JSON_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Decode a model reply into a [`DocumentRecord`].
///
/// Models often wrap the object in prose or code fences, so the brace span is
/// tried first and the whole reply second. Never fails: anything unusable
/// comes back as [`ParseOutcome::Unparseable`].
pub fn parse_document_reply(reply: &str) -> ParseOutcome {
    match decode_reply_json(reply) {
        Ok(value) => record_from_value(value),
        Err(reason) => ParseOutcome::Unparseable(reason),
    }
}

/// Locate the outermost brace-delimited span, if any.
pub fn find_json_span(text: &str) -> Option<&str> {
    JSON_SPAN.find(text).map(|m| m.as_str())
}

/// Best-effort JSON decoding of an untrusted reply.
pub fn decode_reply_json(reply: &str) -> Result<Value, UnparseableReason> {
    if let Some(span) = find_json_span(reply) {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::debug!(error = %e, "Brace span is not valid JSON, trying whole reply");
            }
        }
    }
    serde_json::from_str::<Value>(reply.trim())
        .map_err(|e| UnparseableReason::InvalidJson(e.to_string()))
}

/// Build a record from decoded JSON. Every required field must be present.
pub fn record_from_value(value: Value) -> ParseOutcome {
    let Value::Object(map) = value else {
        return ParseOutcome::Unparseable(UnparseableReason::NotAnObject);
    };

    match build_record(&map) {
        Ok(record) => ParseOutcome::Parsed { record, raw: map },
        Err(reason) => ParseOutcome::Unparseable(reason),
    }
}

fn build_record(map: &Map<String, Value>) -> Result<DocumentRecord, UnparseableReason> {
    Ok(DocumentRecord {
        name: scalar_field(map, "name")?,
        id_number: scalar_field(map, "id_num")?,
        doc_type: scalar_field(map, "doc_type")?,
        language: scalar_field(map, "lang")?,
        tamper_risk: scalar_field(map, "tamper")?,
        reason: scalar_field(map, "reason")?,
    })
}

/// Read a field as text. Numbers and booleans are rendered; null, arrays and
/// objects count as missing.
fn scalar_field(map: &Map<String, Value>, key: &'static str) -> Result<String, UnparseableReason> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(UnparseableReason::MissingField(key)),
    }
}
