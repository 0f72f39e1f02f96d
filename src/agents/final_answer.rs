// SPDX-License-Identifier: MIT

//! Final answer - narrates the collected data with a generative model

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::engine::graph::DEFAULT_INPUT_FIELD;
use crate::engine::state::WorkflowState;
use crate::engine::step::{PartialUpdate, Step, StepError, StepOutcome};
use crate::model::{Content, GenerationConfig, Model};

const INSTRUCTION: &str = "You are a field service assistant. \
Only use the provided data below. Do not add assumptions.";

const REQUIRED: &[&str] = &["work_order_id", "product_id", "documentation"];
const OPTIONAL: &[&str] = &[
    "date",
    "start_time",
    "technician",
    "site",
    "work_order_type",
    "description",
    "asset",
];
/// Array fields rendered as numbered lists
const LISTS: &[&str] = &["history", "cleanup_steps"];

/// Summarises the run for the technician; writes `final_answer`
pub struct FinalAnswerStep {
    model: Arc<dyn Model>,
    config: GenerationConfig,
    question_field: String,
}

impl FinalAnswerStep {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                temperature: Some(0.0),
                ..GenerationConfig::default()
            },
            question_field: DEFAULT_INPUT_FIELD.to_string(),
        }
    }

    /// Read the caller's question from `field` instead of `goal`
    pub fn with_question_field(mut self, field: impl Into<String>) -> Self {
        self.question_field = field.into();
        self
    }

    /// Build the user prompt, or `None` when a required field is missing
    fn prompt(&self, state: &WorkflowState) -> Option<String> {
        let mut lines = Vec::new();
        for field in REQUIRED {
            lines.push(format!("- {}: {}", field, state.get_str(field)?));
        }
        for field in OPTIONAL {
            if let Some(value) = state.get_str(field) {
                lines.push(format!("- {}: {}", field, value));
            }
        }
        for field in LISTS {
            let Some(items) = state.get(field).and_then(Value::as_array) else {
                continue;
            };
            lines.push(format!("- {}:", field));
            for (i, item) in items.iter().filter_map(Value::as_str).enumerate() {
                lines.push(format!("  {}) {}", i + 1, item));
            }
        }
        let data = lines.join("\n");

        let question = state
            .get_str(&self.question_field)
            .unwrap_or("Summarise today's work order.");
        Some(format!(
            "User question:\n{}\n\nTool outputs:\n{}\n\n\
             Return a concise final answer including:\n\
             1) Work order id\n2) Work order details\n3) Documentation and cleanup steps",
            question, data
        ))
    }
}

#[async_trait]
impl Step for FinalAnswerStep {
    fn description(&self) -> &str {
        "Writes a grounded final_answer from the collected work order data"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
        let Some(prompt) = self.prompt(state) else {
            log::info!("Not enough data for a final answer");
            return Ok(StepOutcome::Miss);
        };

        let history = [Content::system(INSTRUCTION), Content::user(prompt)];
        let response = self
            .model
            .generate_content(&history, Some(&self.config))
            .await?;

        Ok(StepOutcome::update(
            PartialUpdate::new().with("final_answer", response.text.trim()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ModelError;
    use crate::model::ScriptedModel;
    use serde_json::json;

    struct BrokenModel;

    #[async_trait]
    impl Model for BrokenModel {
        async fn generate_content(
            &self,
            _history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<Content, ModelError> {
            Err(ModelError::RateLimited { attempts: 4 })
        }
    }

    fn complete_state() -> WorkflowState {
        let mut state = WorkflowState::empty();
        state
            .merge(
                PartialUpdate::new()
                    .with("goal", "What is on today?")
                    .with("work_order_id", "WO-100245")
                    .with("product_id", "PROD-77881")
                    .with("work_order_type", "Critical")
                    .with("technician", "Tech-01")
                    .with("asset", "Packaging Line Conveyor A7")
                    .with("history", json!(["2026-01-15: Belt tension adjusted"]))
                    .with("documentation", "Conveyor Cleanup & Basic Care (Quick Guide)")
                    .with("cleanup_steps", json!(["Power down", "Inspect belt"])),
            )
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_writes_final_answer_from_model() {
        let model = Arc::new(ScriptedModel::new(["  WO-100245 is critical.  "]));
        let step = FinalAnswerStep::new(model.clone());

        let update = step.run(&complete_state()).await.unwrap().into_update();
        assert_eq!(update.get("final_answer"), Some(&json!("WO-100245 is critical.")));

        let prompts = model.prompts();
        let user = &prompts[0][1].text;
        assert!(user.contains("What is on today?"));
        assert!(user.contains("- work_order_type: Critical"));
        assert!(user.contains("  2) Inspect belt"));
        assert!(user.contains("- technician: Tech-01"));
        assert!(user.contains("- asset: Packaging Line Conveyor A7"));
        assert!(user.contains("- history:\n  1) 2026-01-15: Belt tension adjusted"));
    }

    #[tokio::test]
    async fn test_reads_configured_question_field() {
        let model = Arc::new(ScriptedModel::new(["ok"]));
        let step = FinalAnswerStep::new(model.clone()).with_question_field("user_question");

        let mut state = complete_state();
        state
            .merge(PartialUpdate::new().with("user_question", "Which belt is slipping?"))
            .unwrap();
        step.run(&state).await.unwrap();

        let user = &model.prompts()[0][1].text;
        assert!(user.starts_with("User question:\nWhich belt is slipping?\n"));
        assert!(!user.contains("What is on today?"));
    }

    #[tokio::test]
    async fn test_missing_documentation_is_a_miss() {
        let model = Arc::new(ScriptedModel::new(["unused"]));
        let step = FinalAnswerStep::new(model.clone());

        let mut state = WorkflowState::empty();
        state
            .merge(PartialUpdate::new().with("work_order_id", "WO-999"))
            .unwrap();

        assert!(step.run(&state).await.unwrap().is_miss());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_fails_the_step() {
        let step = FinalAnswerStep::new(Arc::new(BrokenModel));
        let err = step.run(&complete_state()).await.unwrap_err();
        assert!(err.to_string().contains("Rate limit"));
    }
}
