use serde_json::{Map, Value};

/// A single record: field name to JSON value.
pub type Document = Map<String, Value>;

/// Store-assigned identity field.
pub const FIELD_OBJECT_ID: &str = "_id";
/// Domain identity field (`u1`, `a7`, `r42`, `popular-daily-...`).
pub const FIELD_ID: &str = "id";

/// Best-effort identity for diagnostics.
pub fn record_id(doc: &Document) -> String {
    [FIELD_ID, "aid", "uid", FIELD_OBJECT_ID]
        .iter()
        .find_map(|key| scalar_string(doc, key))
        .unwrap_or_else(|| "<unidentified>".to_string())
}

/// Reads a scalar field as a string. Numbers are rendered in decimal so that
/// `"uid": 5` and `"uid": "5"` refer to the same user.
pub fn scalar_string(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A reference key as a string, plus its integer form when it is numeric.
pub fn key_variants(key: &str) -> Vec<Value> {
    let mut variants = vec![Value::String(key.to_string())];
    if let Ok(n) = key.parse::<i64>() {
        variants.push(Value::from(n));
    }
    variants
}

/// Interprets the engagement flag encodings found in event logs.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "True" | "TRUE"),
        _ => false,
    }
}

/// Builds a document from a `json!` object literal. Non-objects yield an
/// empty document.
pub fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
