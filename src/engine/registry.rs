// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use super::error::RegistryError;
use super::step::Step;

/// Name -> step mapping, populated once during initialization.
///
/// Registration needs `&mut self`; once the registry is handed to the graph
/// compiler it is only read.
#[derive(Clone, Default)]
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        step: Arc<dyn Step>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.steps.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        log::debug!("Registered step: {}", name);
        self.steps.insert(name, step);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Step>, RegistryError> {
        self.steps
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownStep(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Registered step names, sorted
    pub fn all(&self) -> Vec<String> {
        let mut names: Vec<String> = self.steps.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.all())
            .finish()
    }
}
