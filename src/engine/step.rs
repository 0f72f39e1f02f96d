// SPDX-License-Identifier: MIT

//! Step contract - the only boundary between the engine and business logic

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;

use super::state::WorkflowState;

/// Failure raised by a step implementation
pub type StepError = Box<dyn Error + Send + Sync>;

/// A possibly-empty set of fields to merge into the accumulated state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialUpdate {
    fields: Map<String, Value>,
}

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl IntoIterator for PartialUpdate {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl From<Map<String, Value>> for PartialUpdate {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PartialUpdate {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut update = PartialUpdate::new();
        for (k, v) in iter {
            update.set(k, v);
        }
        update
    }
}

/// Successful result of running a step
///
/// `Miss` means the step ran fine but had nothing to contribute (for example an
/// unrecognized identifier). It is not a failure and must not abort the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Update(PartialUpdate),
    Miss,
}

impl StepOutcome {
    pub fn update(update: PartialUpdate) -> Self {
        StepOutcome::Update(update)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, StepOutcome::Miss)
    }

    /// The update to merge; a miss merges nothing
    pub fn into_update(self) -> PartialUpdate {
        match self {
            StepOutcome::Update(update) => update,
            StepOutcome::Miss => PartialUpdate::new(),
        }
    }
}

/// A named, stateless unit of work in a pipeline.
///
/// Steps receive a shared borrow of the accumulated state and cannot change
/// it; their only way to contribute is the returned [`StepOutcome`].
#[async_trait]
pub trait Step: Send + Sync {
    /// Human-readable description used for introspection
    fn description(&self) -> &str {
        ""
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError>;
}

/// Adapter turning a plain function into a [`Step`]
pub struct FnStep<F> {
    description: String,
    func: F,
}

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: Fn(&WorkflowState) -> Result<StepOutcome, StepError> + Send + Sync,
{
    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
        (self.func)(state)
    }
}

/// Wrap a synchronous function as a step
pub fn step_fn<F>(description: impl Into<String>, func: F) -> FnStep<F>
where
    F: Fn(&WorkflowState) -> Result<StepOutcome, StepError> + Send + Sync,
{
    FnStep {
        description: description.into(),
        func,
    }
}
