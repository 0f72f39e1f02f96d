// SPDX-License-Identifier: MIT

//! State schema definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::engine::error::StateError;

/// Schema declaring the fields a pipeline's state may hold
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateSchema {
    #[serde(flatten)]
    pub fields: HashMap<String, StateFieldDef>,
}

/// Definition of a single state field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateFieldDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
    /// Seeded into every run before the first step
    #[serde(default)]
    pub default: Option<Value>,
}

impl StateFieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            description: None,
            default: None,
        }
    }
}

/// Supported field types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::String, Value::String(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::Object, Value::Object(_))
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl StateSchema {
    /// Builder-style field declaration
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields
            .insert(name.into(), StateFieldDef::new(field_type));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Check that `value` may be stored under `key`
    pub fn check(&self, key: &str, value: &Value) -> Result<(), StateError> {
        let def = self
            .fields
            .get(key)
            .ok_or_else(|| StateError::UnknownField(key.to_string()))?;

        if def.field_type.accepts(value) {
            Ok(())
        } else {
            Err(StateError::TypeMismatch {
                field: key.to_string(),
                expected: def.field_type.as_str().to_string(),
                actual: value_kind(value).to_string(),
            })
        }
    }

    /// Field defaults, in no particular order
    pub fn defaults(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter_map(|(name, def)| def.default.as_ref().map(|v| (name, v)))
    }
}
