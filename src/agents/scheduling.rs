// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::engine::graph::DEFAULT_INPUT_FIELD;
use crate::engine::state::WorkflowState;
use crate::engine::step::{PartialUpdate, Step, StepError, StepOutcome};
use crate::services::Tool;

const VISIT_FIELDS: &[&str] = &["date", "technician", "start_time", "site"];

/// Looks up today's scheduled work order
pub struct SchedulingStep {
    tool: Arc<dyn Tool>,
    question_field: String,
}

impl SchedulingStep {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self {
            tool,
            question_field: DEFAULT_INPUT_FIELD.to_string(),
        }
    }

    /// Read the caller's question from `field` instead of `goal`
    pub fn with_question_field(mut self, field: impl Into<String>) -> Self {
        self.question_field = field.into();
        self
    }
}

#[async_trait]
impl Step for SchedulingStep {
    fn description(&self) -> &str {
        "Finds the work order scheduled today; writes work_order_id and visit details"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
        let goal = state.get_str(&self.question_field).unwrap_or_default();
        let result = self.tool.execute(json!({ "goal": goal })).await?;

        let Some(work_order_id) = result.get("work_order_id").and_then(Value::as_str) else {
            log::info!("Nothing scheduled today");
            return Ok(StepOutcome::Miss);
        };

        let mut update = PartialUpdate::new().with("work_order_id", work_order_id);
        for field in VISIT_FIELDS {
            if let Some(value) = result.get(*field).and_then(Value::as_str) {
                update.set(*field, value);
            }
        }
        Ok(StepOutcome::update(update))
    }
}
