// Agent contract
//
// Design decisions:
// - Agents are trait objects constructed once and registered exactly once;
//   nothing about an agent changes after registration
// - The system prompt is returned verbatim. Caller input is never
//   interpolated into it; anything request-specific travels as tool output
// - `required_capabilities` is an all-of set; an empty set admits any
//   authenticated caller
// - `ensure_ready` gates every tool of the agent uniformly, so a missing
//   host backend fails the same way regardless of which tool was called

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::CapabilitySet;
use crate::context::HostContext;
use crate::tool::Tool;

/// A registrable agent definition: identity, presentation metadata, the
/// capability gate, and the tools it owns.
///
/// Implementations are cheap to query; all methods are expected to return
/// constants or clones of construction-time data.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier: non-empty lowercase letters, digits, and hyphens
    fn id(&self) -> &str;

    /// Human-facing display name
    fn name(&self) -> &str;

    /// One-sentence description for agent pickers
    fn description(&self) -> &str;

    /// Icon hint for presentation surfaces
    fn icon(&self) -> &str {
        "robot"
    }

    /// Coarse grouping for presentation surfaces
    fn category(&self) -> &str {
        "general"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn author(&self) -> &str {
        "Siteward"
    }

    /// The instruction block handed to the model, verbatim
    fn system_prompt(&self) -> &str;

    /// Capabilities a caller must hold (all of them) to use this agent
    fn required_capabilities(&self) -> CapabilitySet;

    /// Optional greeting shown when a conversation starts
    fn welcome_message(&self) -> Option<String> {
        None
    }

    /// Conversation starters, in presentation order
    fn suggested_prompts(&self) -> Vec<String> {
        Vec::new()
    }

    /// The tools this agent owns, in presentation order.
    ///
    /// Read once at registration; the registry validates and caches the
    /// schemas from here.
    fn tools(&self) -> Vec<Arc<dyn Tool>>;

    /// Precondition checked once per dispatch, before any tool runs.
    ///
    /// An `Err` short-circuits the call into an in-band failure carrying the
    /// returned message, uniformly for every tool of this agent.
    async fn ensure_ready(&self, _host: &HostContext) -> Result<(), String> {
        Ok(())
    }
}

/// Serializable snapshot of an agent for presentation surfaces.
///
/// Built by the registry from registration-time data; `tools` holds the
/// rendered wire definitions of the agent's tool schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub version: String,
    pub author: String,
    pub required_capabilities: CapabilitySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    pub suggested_prompts: Vec<String>,
    pub tools: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;

    struct MinimalAgent;

    #[async_trait]
    impl Agent for MinimalAgent {
        fn id(&self) -> &str {
            "minimal"
        }

        fn name(&self) -> &str {
            "Minimal"
        }

        fn description(&self) -> &str {
            "Smallest possible agent"
        }

        fn system_prompt(&self) -> &str {
            "You are a minimal agent."
        }

        fn required_capabilities(&self) -> CapabilitySet {
            CapabilitySet::of([Capability::edit_content()])
        }

        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_trait_defaults() {
        let agent = MinimalAgent;
        assert_eq!(agent.icon(), "robot");
        assert_eq!(agent.category(), "general");
        assert_eq!(agent.version(), "1.0.0");
        assert!(agent.welcome_message().is_none());
        assert!(agent.suggested_prompts().is_empty());
        assert_eq!(agent.ensure_ready(&HostContext::new()).await, Ok(()));
    }
}
