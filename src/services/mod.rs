// SPDX-License-Identifier: MIT

//! Backend services the field-service steps call
//!
//! Each backend sits behind the [`Tool`] trait so steps never depend on
//! where the data comes from. The bundled implementations read from an
//! in-memory [`ServiceCatalog`].

pub mod catalog;
pub mod field_service;

pub use catalog::{Documentation, ScheduledVisit, ServiceCatalog, WorkOrder};
pub use field_service::{KnowledgeService, SchedulingService, ServiceInsightService};

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;

/// A backend call with a JSON input and a JSON result.
///
/// A lookup that finds nothing returns `Ok(Value::Null)`; `Err` is reserved
/// for the backend itself failing.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the tool's input
    fn schema(&self) -> &Value;

    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>>;
}
