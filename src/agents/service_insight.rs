// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::engine::state::WorkflowState;
use crate::engine::step::{PartialUpdate, Step, StepError, StepOutcome};
use crate::services::Tool;

const DETAIL_FIELDS: &[&str] = &[
    "work_order_id",
    "product_id",
    "description",
    "work_order_type",
    "asset",
];

/// Expands a work order id into its product and description
pub struct ServiceInsightStep {
    tool: Arc<dyn Tool>,
}

impl ServiceInsightStep {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Step for ServiceInsightStep {
    fn description(&self) -> &str {
        "Reads work_order_id; writes product_id, description, asset and service history"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
        let Some(work_order_id) = state.get_str("work_order_id") else {
            return Ok(StepOutcome::Miss);
        };

        let result = self
            .tool
            .execute(json!({ "work_order_id": work_order_id }))
            .await?;
        if result.is_null() {
            log::info!("No details for work order {}", work_order_id);
            return Ok(StepOutcome::Miss);
        }

        let mut update = PartialUpdate::new();
        for field in DETAIL_FIELDS {
            if let Some(value) = result.get(*field).and_then(Value::as_str) {
                update.set(*field, value);
            }
        }
        if let Some(history) = result.get("history").filter(|h| h.is_array()) {
            update.set("history", history.clone());
        }
        Ok(StepOutcome::update(update))
    }
}
