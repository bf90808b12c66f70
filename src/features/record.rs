//! Raw transaction record: field name → scalar, possibly partial.

use crate::{FraudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric field; `Ok(None)` when absent, error when present but not a number.
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(FieldValue::Number(v)) => Ok(Some(*v)),
            Some(FieldValue::Text(s)) => Err(FraudError::MalformedInput(format!(
                "field `{name}` must be numeric, got {s:?}"
            ))),
        }
    }

    /// Numeric field with absent treated as 0.0.
    pub fn number_or_zero(&self, name: &str) -> Result<f64> {
        Ok(self.number(name)?.unwrap_or(0.0))
    }

    /// Textual view of a field; numbers are rendered with `Display`.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(v) => Some(v.to_string()),
        }
    }
}
