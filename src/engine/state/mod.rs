// SPDX-License-Identifier: MIT

//! State management for pipelines
//!
//! This module provides:
//! - `StateSchema` - declares the fields a pipeline may write and their types
//! - `WorkflowState` - the accumulated state of a single run

mod schema;
mod store;

pub use schema::{FieldType, StateFieldDef, StateSchema};
pub use store::WorkflowState;
