// SPDX-License-Identifier: MIT

//! Typed error handling for dispatch-rs
//!
//! Construction-time failures (registry, graph compilation) are fatal before
//! any run starts. Run-time failures only abort the run in progress.

use thiserror::Error;

use super::step::StepError;

/// Top-level error type for dispatch-rs
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration errors (missing env vars, unknown pipeline)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl DispatchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Registry misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Step '{0}' is already registered")]
    DuplicateName(String),

    #[error("Step '{0}' is not registered")]
    UnknownStep(String),
}

/// Graph compilation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Node name '{0}' is reserved for the terminal marker")]
    ReservedNodeName(String),

    /// `referenced_by` names the edge or the entry point that mentions the node
    #[error("Unknown node '{node}' referenced by {referenced_by}")]
    UnknownNode { node: String, referenced_by: String },

    #[error("Node '{node}' uses step '{step}' which is not registered")]
    UnresolvedStep { node: String, step: String },

    #[error("Circular dependency detected: {0:?}")]
    Cycle(Vec<String>),

    #[error("Chain ends at node '{0}' without reaching the terminal marker")]
    UnreachableTerminal(String),

    #[error("Node '{0}' is not reachable from the entry node")]
    UnreachableNode(String),

    #[error("Node '{node}' has {} outgoing edges ({targets:?}); only chains are supported", .targets.len())]
    BranchingNotSupported { node: String, targets: Vec<String> },

    #[error("Input field '{0}' is not declared as a string field in the state schema")]
    UndeclaredInputField(String),

    #[error("Default for field '{field}' is invalid: {reason}")]
    InvalidDefault { field: String, reason: String },
}

/// Failures while a compiled graph is running
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Step execution failed at node '{node}': {source}")]
    StepExecution {
        node: String,
        #[source]
        source: StepError,
    },

    /// The run's input could not be seeded into the initial state
    #[error("Invalid run input: {0}")]
    InvalidInput(#[from] StateError),
}

impl ExecutionError {
    /// Name of the node that failed, if a node was running
    pub fn node(&self) -> Option<&str> {
        match self {
            ExecutionError::StepExecution { node, .. } => Some(node),
            ExecutionError::InvalidInput(_) => None,
        }
    }
}

/// State merge rejections
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Field '{0}' is not declared in the state schema")]
    UnknownField(String),

    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),
}
