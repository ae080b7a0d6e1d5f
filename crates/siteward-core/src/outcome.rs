// Tool and dispatch outcome contract
//
// Two layers with distinct audiences:
// - `ToolOutcome` is what a handler produces: success, a failure message the
//   model may see, or an internal error that must not leak.
// - `DispatchOutcome` is what a dispatch call returns to the orchestrator:
//   ownership (`NotOwned`) is a first-class variant instead of an ambiguous
//   null, and internal errors have already been logged and masked.
//
// Anticipated failures are always values, never panics; only genuine faults
// (never input-dependent) take the internal path.

use serde_json::Value;
use tracing::error;

use crate::error::HostError;

// ============================================================================
// ToolOutcome - Handler-Level Result
// ============================================================================

/// Result of one tool handler execution.
///
/// # Security
///
/// Internal errors are logged but replaced with a generic message before they
/// reach the model. This prevents leaking connection strings, filesystem
/// layout, or other host internals through tool results.
#[derive(Debug)]
pub enum ToolOutcome {
    /// Successful execution with a JSON payload for the model
    Success(Value),

    /// Tool-level failure that is safe to show the model
    ///
    /// Use this for anticipated conditions: validation failures, missing
    /// entities, gated features, bounded-download violations.
    Failure(String),

    /// Internal error that must NOT be exposed to the model
    Internal(InternalToolError),
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(value: impl Into<Value>) -> Self {
        ToolOutcome::Success(value.into())
    }

    /// Create an in-band failure (safe to show the model)
    pub fn failure(message: impl Into<String>) -> Self {
        ToolOutcome::Failure(message.into())
    }

    /// Create an internal error from an error value (hidden from the model)
    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        ToolOutcome::Internal(InternalToolError::new(error))
    }

    /// Create an internal error from a message (hidden from the model)
    pub fn internal_msg(message: impl Into<String>) -> Self {
        ToolOutcome::Internal(InternalToolError::from_message(message))
    }

    /// Map a host backend error onto the outcome contract.
    ///
    /// `NotFound`, `Invalid`, and `Unavailable` carry messages meant for the
    /// model; anything else is a host fault and takes the internal path.
    pub fn host_error(error: HostError) -> Self {
        if error.is_user_facing() {
            ToolOutcome::Failure(error.to_string())
        } else {
            ToolOutcome::internal(error)
        }
    }

    /// Check if this is a successful outcome
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// Check if this is any kind of failure
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Convert to the dispatch-level outcome, masking internal errors.
    ///
    /// The full error is logged with agent/tool context for operators; the
    /// model sees only a generic in-band failure.
    pub fn into_dispatch(self, agent_id: &str, tool_name: &str) -> DispatchOutcome {
        match self {
            ToolOutcome::Success(value) => DispatchOutcome::Success(value),
            ToolOutcome::Failure(message) => DispatchOutcome::Failure(message),
            ToolOutcome::Internal(err) => {
                error!(
                    agent = %agent_id,
                    tool = %tool_name,
                    error = %err.message,
                    "Tool internal error (details hidden from the model)"
                );
                DispatchOutcome::Failure(
                    "An internal error occurred while executing the tool".to_string(),
                )
            }
        }
    }
}

/// Internal error details (logged but not exposed to the model)
#[derive(Debug)]
pub struct InternalToolError {
    /// Error message for logging
    pub message: String,
    /// Optional source error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl InternalToolError {
    /// Create from an error
    pub fn new(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Create from a string message
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl std::fmt::Display for InternalToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InternalToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// DispatchOutcome - Registry-Level Result
// ============================================================================

/// Result of dispatching a tool call through an agent.
///
/// Ownership is explicit: `NotOwned` means "ask another agent", which callers
/// must not confuse with a tool that ran and failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The agent does not own a tool with the requested name
    NotOwned,

    /// The tool ran (or was gated) and failed; the message is in-band data
    Failure(String),

    /// The tool succeeded with a JSON payload
    Success(Value),
}

impl DispatchOutcome {
    /// Create a failure outcome
    pub fn failure(message: impl Into<String>) -> Self {
        DispatchOutcome::Failure(message.into())
    }

    /// Create a success outcome
    pub fn success(value: impl Into<Value>) -> Self {
        DispatchOutcome::Success(value.into())
    }

    /// Check if the agent owned the tool at all
    pub fn is_owned(&self) -> bool {
        !matches!(self, DispatchOutcome::NotOwned)
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success(_))
    }

    /// Check if this is an in-band failure
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failure(_))
    }

    /// Project onto the legacy wire shape.
    ///
    /// `NotOwned` becomes `None`; failures become `Some({"error": message})`;
    /// successes become `Some(payload)`. Orchestrators that predate the typed
    /// outcome consume this form.
    pub fn into_value(self) -> Option<Value> {
        match self {
            DispatchOutcome::NotOwned => None,
            DispatchOutcome::Failure(message) => {
                Some(serde_json::json!({ "error": message }))
            }
            DispatchOutcome::Success(value) => Some(value),
        }
    }
}
