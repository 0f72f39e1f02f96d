// SPDX-License-Identifier: MIT

//! Model module - generative model trait and implementations
//!
//! - [openai] - any OpenAI-compatible chat-completions endpoint
//! - [scripted] - canned responses for offline runs and tests

pub mod openai;
pub mod scripted;

pub use openai::OpenAIModel;
pub use scripted::ScriptedModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::engine::error::ModelError;

/// Model used when neither the caller nor `MODEL_NAME` picks one
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";

/// Resolve the model name: explicit choice, then `MODEL_NAME`, then the default
pub fn model_name_from_env(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| env::var("MODEL_NAME").ok().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string())
}

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Model,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: Role,
    pub text: String,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Core trait for generative model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError>;
}
