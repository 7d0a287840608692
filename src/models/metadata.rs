//! Open-ended, typed key-value metadata for projects, phases, tasks and artifacts

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Store a value typed in on the command line: booleans and integers are
    /// recognised, anything else is kept as a string.
    pub fn set_parsed(&mut self, key: impl Into<String>, raw: &str) {
        self.set(key, parse_value(raw));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get_str(&self, key: &str) -> WorkflowResult<Option<&str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(key, "a string", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> WorkflowResult<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(key, "a boolean", other)),
        }
    }

    pub fn get_u64(&self, key: &str) -> WorkflowResult<Option<u64>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| mismatch(key, "a non-negative integer", &Value::Number(n.clone()))),
            Some(other) => Err(mismatch(key, "a non-negative integer", other)),
        }
    }

    /// `true` only when the key holds boolean `true`; absent means `false`.
    pub fn flag(&self, key: &str) -> WorkflowResult<bool> {
        Ok(self.get_bool(key)?.unwrap_or(false))
    }
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> WorkflowError {
    WorkflowError::MetadataType {
        key: key.to_string(),
        expected,
        found: kind_of(found),
    }
}

pub fn parse_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => match raw.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(raw.to_string()),
            },
        },
    }
}
