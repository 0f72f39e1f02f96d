// SPDX-License-Identifier: MIT

//! Field-service steps
//!
//! Steps are registered explicitly; nothing is discovered at import time.

mod final_answer;
mod knowledge;
mod scheduling;
mod service_insight;

pub use final_answer::FinalAnswerStep;
pub use knowledge::KnowledgeStep;
pub use scheduling::SchedulingStep;
pub use service_insight::ServiceInsightStep;

use std::sync::Arc;

use crate::engine::error::RegistryError;
use crate::engine::graph::DEFAULT_INPUT_FIELD;
use crate::engine::registry::StepRegistry;
use crate::model::Model;
use crate::services::{KnowledgeService, SchedulingService, ServiceCatalog, ServiceInsightService};

pub const SCHEDULING: &str = "scheduling";
pub const SERVICE_INSIGHT: &str = "service_insight";
pub const KNOWLEDGE: &str = "knowledge";
pub const FINAL_ANSWER: &str = "final_answer";

/// Register the three lookup steps backed by `catalog`
pub fn register_defaults(
    registry: &mut StepRegistry,
    catalog: Arc<ServiceCatalog>,
) -> Result<(), RegistryError> {
    register_defaults_for(registry, catalog, DEFAULT_INPUT_FIELD)
}

/// Like [`register_defaults`], for pipelines whose question lives in `input_field`
pub fn register_defaults_for(
    registry: &mut StepRegistry,
    catalog: Arc<ServiceCatalog>,
    input_field: &str,
) -> Result<(), RegistryError> {
    registry.register(
        SCHEDULING,
        Arc::new(
            SchedulingStep::new(Arc::new(SchedulingService::new(catalog.clone())))
                .with_question_field(input_field),
        ),
    )?;
    registry.register(
        SERVICE_INSIGHT,
        Arc::new(ServiceInsightStep::new(Arc::new(ServiceInsightService::new(
            catalog.clone(),
        )))),
    )?;
    registry.register(
        KNOWLEDGE,
        Arc::new(KnowledgeStep::new(Arc::new(KnowledgeService::new(catalog)))),
    )?;
    Ok(())
}

/// Register the model-backed `final_answer` step
pub fn register_narrator(
    registry: &mut StepRegistry,
    model: Arc<dyn Model>,
) -> Result<(), RegistryError> {
    register_narrator_for(registry, model, DEFAULT_INPUT_FIELD)
}

pub fn register_narrator_for(
    registry: &mut StepRegistry,
    model: Arc<dyn Model>,
    input_field: &str,
) -> Result<(), RegistryError> {
    registry.register(
        FINAL_ANSWER,
        Arc::new(FinalAnswerStep::new(model).with_question_field(input_field)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;

    #[test]
    fn test_register_defaults() {
        let mut registry = StepRegistry::new();
        register_defaults(&mut registry, Arc::new(ServiceCatalog::default())).unwrap();

        assert_eq!(registry.all(), vec!["knowledge", "scheduling", "service_insight"]);
        assert!(!registry.resolve(SCHEDULING).unwrap().description().is_empty());
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let catalog = Arc::new(ServiceCatalog::default());
        let mut registry = StepRegistry::new();
        register_defaults(&mut registry, catalog.clone()).unwrap();

        let err = register_defaults(&mut registry, catalog).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("scheduling".to_string()));
    }

    #[test]
    fn test_register_narrator() {
        let mut registry = StepRegistry::new();
        register_narrator(&mut registry, Arc::new(ScriptedModel::new(["ok"]))).unwrap();
        assert!(registry.contains(FINAL_ANSWER));
    }
}
