// SPDX-License-Identifier: MIT

//! Accumulated state of a single pipeline run

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::schema::StateSchema;
use crate::engine::error::StateError;
use crate::engine::step::PartialUpdate;

/// Accumulated key/value state with overwrite-only merge semantics.
///
/// Keys are never removed once written. When a schema is attached, merges are
/// validated against it and rejected as a whole on the first bad field.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    fields: Map<String, Value>,
    schema: Option<Arc<StateSchema>>,
}

impl WorkflowState {
    /// Create a state bound to a schema, seeded with the schema defaults
    pub fn new(schema: Arc<StateSchema>) -> Self {
        let fields = schema
            .defaults()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            fields,
            schema: Some(schema),
        }
    }

    /// Create an unconstrained, empty state
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> Option<&StateSchema> {
        self.schema.as_deref()
    }

    /// Merge a partial update (union with overwrite).
    ///
    /// Returns the keys that were written, in update order.
    pub fn merge(&mut self, update: PartialUpdate) -> Result<Vec<String>, StateError> {
        if let Some(schema) = &self.schema {
            for (key, value) in update.iter() {
                schema.check(key, value)?;
            }
        }

        let mut written = Vec::with_capacity(update.len());
        for (key, value) in update {
            self.fields.insert(key.clone(), value);
            written.push(key);
        }
        Ok(written)
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field value if it holds a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All field names, sorted
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert state to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Serialize for WorkflowState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
