// SPDX-License-Identifier: MIT

//! Scripted model - replays canned responses in order

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Content, GenerationConfig, Model};
use crate::engine::error::ModelError;

/// Deterministic model cycling through a fixed list of responses.
///
/// Every prompt it receives is kept so tests can inspect what was asked.
pub struct ScriptedModel {
    responses: Vec<String>,
    next: AtomicUsize,
    prompts: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Histories received so far, oldest first
    pub fn prompts(&self) -> Vec<Vec<Content>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        if self.responses.is_empty() {
            return Err(ModelError::InvalidResponse(
                "scripted model has no responses".to_string(),
            ));
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(history.to_vec());
        }

        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.responses.len();
        Ok(Content::model(self.responses[index].clone()))
    }
}
