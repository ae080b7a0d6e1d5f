// Error types for the registry and host backends

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type alias for host backend operations
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Errors surfaced by host backends (content, comments, themes, users, catalog, files).
///
/// Handlers map `NotFound` and `Invalid` to in-band failures the model is
/// allowed to see. Everything else is treated as an internal error and masked
/// at the dispatch boundary.
#[derive(Debug, Error)]
pub enum HostError {
    /// The addressed entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request was well-formed JSON but semantically invalid
    #[error("{0}")]
    Invalid(String),

    /// The backend exists but cannot serve requests right now
    #[error("{0}")]
    Unavailable(String),

    /// Filesystem error from the sandbox
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HostError {
    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        HostError::NotFound(msg.into())
    }

    /// Create an invalid-request error
    pub fn invalid(msg: impl Into<String>) -> Self {
        HostError::Invalid(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        HostError::Unavailable(msg.into())
    }

    /// True if the error carries a message that is safe to show the model.
    ///
    /// `Unavailable` is in-band: a deactivated host feature is an anticipated
    /// condition the model should be told about, same as the precondition
    /// short-circuit.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            HostError::NotFound(_) | HostError::Invalid(_) | HostError::Unavailable(_)
        )
    }
}

/// Errors raised while registering an agent.
///
/// Registration is the only fallible phase; once an agent is in the registry
/// its definition is immutable and dispatch never returns these.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An agent with this id is already registered
    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    /// Agent id does not match the required shape
    #[error("Invalid agent id '{0}': expected non-empty lowercase letters, digits, and hyphens")]
    InvalidAgentId(String),

    /// Two tools on the same agent share a name
    #[error("Duplicate tool '{tool}' on agent '{agent}'")]
    DuplicateTool { agent: String, tool: String },

    /// A tool schema failed validation
    #[error("Invalid schema for tool '{tool}' on agent '{agent}': {source}")]
    InvalidSchema {
        agent: String,
        tool: String,
        #[source]
        source: SchemaError,
    },
}
