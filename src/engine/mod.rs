// SPDX-License-Identifier: MIT

pub mod error;
pub mod graph;
pub mod loader;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod step;

pub use error::{DispatchError, ExecutionError, GraphError, RegistryError, StateError};
pub use graph::{GraphDefinition, END};
pub use orchestrator::Orchestrator;
pub use registry::StepRegistry;
pub use state::WorkflowState;
pub use step::{PartialUpdate, Step, StepError, StepOutcome};
