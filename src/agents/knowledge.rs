// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::engine::state::WorkflowState;
use crate::engine::step::{PartialUpdate, Step, StepError, StepOutcome};
use crate::services::Tool;

/// Fetches documentation for the product on the work order
pub struct KnowledgeStep {
    tool: Arc<dyn Tool>,
}

impl KnowledgeStep {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Step for KnowledgeStep {
    fn description(&self) -> &str {
        "Reads product_id; writes documentation and cleanup_steps"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
        let Some(product_id) = state.get_str("product_id") else {
            return Ok(StepOutcome::Miss);
        };

        let result = self.tool.execute(json!({ "product_id": product_id })).await?;
        let Some(title) = result.get("title").and_then(Value::as_str) else {
            log::info!("No documentation for product {}", product_id);
            return Ok(StepOutcome::Miss);
        };

        let mut update = PartialUpdate::new().with("documentation", title);
        if let Some(steps) = result.get("cleanup_steps").and_then(Value::as_array) {
            if !steps.is_empty() {
                update.set("cleanup_steps", Value::Array(steps.clone()));
            }
        }
        Ok(StepOutcome::update(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{KnowledgeService, ServiceCatalog};

    fn step() -> KnowledgeStep {
        let catalog = Arc::new(ServiceCatalog::default());
        KnowledgeStep::new(Arc::new(KnowledgeService::new(catalog)))
    }

    fn state_with(product_id: &str) -> WorkflowState {
        let mut state = WorkflowState::empty();
        state
            .merge(PartialUpdate::new().with("product_id", product_id))
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_manual_without_cleanup_steps() {
        let update = step().run(&state_with("AC-987")).await.unwrap().into_update();
        assert_eq!(
            update,
            PartialUpdate::new().with("documentation", "AC-987 Installation & Maintenance Manual")
        );
    }

    #[tokio::test]
    async fn test_quick_guide_has_cleanup_steps() {
        let update = step()
            .run(&state_with("PROD-77881"))
            .await
            .unwrap()
            .into_update();

        let steps = update.get("cleanup_steps").and_then(Value::as_array).unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0], "Power down the machine and follow lockout/tagout");
    }

    #[tokio::test]
    async fn test_missing_product_is_a_miss() {
        assert!(step().run(&WorkflowState::empty()).await.unwrap().is_miss());
        assert!(step().run(&state_with("UNKNOWN")).await.unwrap().is_miss());
    }
}
