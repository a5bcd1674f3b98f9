//! Filter and Patch Grammar
//!
//! A filter is a JSON object mapping field names to either a literal
//! (equality) or an operator object:
//!
//! ```text
//! {"region": "Beijing", "timestamp": {"$gte": 1506000000}, "aid": {"$in": ["1", "2"]}}
//! ```
//!
//! Supported operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`.
//! Every clause must hold for a document to match. Anything outside this
//! grammar is rejected with `MalformedFilter`.

use super::types::Document;
use crate::error::{ClusterError, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
}

impl Condition {
    fn parse(op: &str, operand: Value) -> Result<Self> {
        let condition = match op {
            "$eq" => Condition::Eq(operand),
            "$ne" => Condition::Ne(operand),
            "$gt" => Condition::Gt(operand),
            "$gte" => Condition::Gte(operand),
            "$lt" => Condition::Lt(operand),
            "$lte" => Condition::Lte(operand),
            "$in" | "$nin" => {
                let Value::Array(items) = operand else {
                    return Err(ClusterError::malformed(format!(
                        "operator {op} expects an array"
                    )));
                };
                if op == "$in" {
                    Condition::In(items)
                } else {
                    Condition::Nin(items)
                }
            }
            other => {
                return Err(ClusterError::malformed(format!(
                    "unsupported operator '{other}'"
                )));
            }
        };
        Ok(condition)
    }

    fn operator(&self) -> (&'static str, Value) {
        match self {
            Condition::Eq(v) => ("$eq", v.clone()),
            Condition::Ne(v) => ("$ne", v.clone()),
            Condition::Gt(v) => ("$gt", v.clone()),
            Condition::Gte(v) => ("$gte", v.clone()),
            Condition::Lt(v) => ("$lt", v.clone()),
            Condition::Lte(v) => ("$lte", v.clone()),
            Condition::In(vs) => ("$in", Value::Array(vs.clone())),
            Condition::Nin(vs) => ("$nin", Value::Array(vs.clone())),
        }
    }

    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => field_equals(field, expected),
            Condition::Ne(expected) => !field_equals(field, expected),
            Condition::In(options) => options.iter().any(|o| field_equals(field, o)),
            Condition::Nin(options) => !options.iter().any(|o| field_equals(field, o)),
            Condition::Gt(bound) => compare_field(field, bound, |o| o == Ordering::Greater),
            Condition::Gte(bound) => compare_field(field, bound, |o| o != Ordering::Less),
            Condition::Lt(bound) => compare_field(field, bound, |o| o == Ordering::Less),
            Condition::Lte(bound) => compare_field(field, bound, |o| o != Ordering::Greater),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub condition: Condition,
}

/// A parsed, validated record filter. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, Condition::Eq(value.into()))
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self::all().and(field, Condition::In(values))
    }

    pub fn and(mut self, field: &str, condition: Condition) -> Self {
        self.clauses.push(Clause {
            field: field.to_string(),
            condition,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn constrains(&self, field: &str) -> bool {
        self.clauses.iter().any(|c| c.field == field)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Parses filter text. The text must be exactly one JSON object.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ClusterError::malformed(format!("{e} in '{text}'")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ClusterError::malformed("filter must be a JSON object"));
        };

        let mut filter = Filter::all();
        for (field, operand) in map {
            validate_field_name(&field)?;
            match operand {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                    if !ops.keys().all(|k| k.starts_with('$')) {
                        return Err(ClusterError::malformed(format!(
                            "field '{field}' mixes operators and literal keys"
                        )));
                    }
                    for (op, arg) in ops {
                        filter = filter.and(&field, Condition::parse(&op, arg)?);
                    }
                }
                literal => filter = filter.and(&field, Condition::Eq(literal)),
            }
        }
        Ok(filter)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.condition.matches(doc.get(&clause.field)))
    }
}

impl TryFrom<Value> for Filter {
    type Error = ClusterError;

    fn try_from(value: Value) -> Result<Self> {
        Filter::from_value(value)
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        let mut out = Map::new();
        for clause in filter.clauses {
            let (op, operand) = clause.condition.operator();
            let slot = out
                .entry(clause.field)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(ops) = slot {
                ops.insert(op.to_string(), operand);
            }
        }
        Value::Object(out)
    }
}

/// A field patch applied with "set specified fields" semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Patch {
    fields: Document,
}

impl Patch {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ClusterError::malformed(format!("{e} in '{text}'")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(ClusterError::malformed("patch must be a JSON object"));
        };
        if fields.is_empty() {
            return Err(ClusterError::malformed("patch sets no fields"));
        }
        for key in fields.keys() {
            validate_field_name(key)?;
        }
        Ok(Self { fields })
    }

    /// Sets every patched field. Returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> bool {
        let mut changed = false;
        for (key, value) in &self.fields {
            if doc.get(key) != Some(value) {
                doc.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }
}

impl TryFrom<Value> for Patch {
    type Error = ClusterError;

    fn try_from(value: Value) -> Result<Self> {
        Patch::from_value(value)
    }
}

impl From<Patch> for Value {
    fn from(patch: Patch) -> Self {
        Value::Object(patch.fields)
    }
}

fn validate_field_name(field: &str) -> Result<()> {
    if field.is_empty() {
        return Err(ClusterError::malformed("empty field name"));
    }
    if field.starts_with('$') {
        return Err(ClusterError::malformed(format!(
            "'{field}' is not a field name"
        )));
    }
    Ok(())
}

/// Equality with array containment: a scalar literal matches an array field
/// holding that scalar.
fn field_equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(actual) => values_equal(actual, expected),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_field(field: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(actual) = field else {
        return false;
    };
    let ordering = match (actual, bound) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    };
    ordering.map(accept).unwrap_or(false)
}
