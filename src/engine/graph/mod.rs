// SPDX-License-Identifier: MIT

//! Graph-based pipeline execution
//!
//! Definitions are compiled once against a [`StepRegistry`](crate::engine::registry::StepRegistry)
//! into an immutable chain, which the executor walks from the entry node to [`END`].

mod compiler;
pub mod executor;
pub mod types;

pub use compiler::{compile, CompiledGraph, CompiledNode, Next};
pub use executor::{ExecutionEvent, ExecutionReport, Executor, RecordedOutcome, StepRecord};
pub use types::{EdgeDefinition, GraphDefinition, NodeDefinition, DEFAULT_INPUT_FIELD, END};
