// Built-in Site Agents
//
// This crate ships the seven built-in agents: content writing, comment
// moderation, SEO, security auditing, theme management, the store assistant,
// and sandboxed file management. Each one implements the `Agent` trait from
// `siteward-core` and carries its own system prompt, capability requirement,
// and tool set.
//
// Key design decisions:
// - Agents never reach the filesystem or network except through the host
//   context and the bounded theme downloader
// - Analysis heuristics (spam score, SEO audit, account audit) are pure
//   functions in their modules, unit-tested without a store
// - `builtin_agents()` fixes the registration order; the content writer is
//   first and therefore the host's default agent

use std::sync::Arc;

use siteward_core::{Agent, AgentRegistry, RegistryError};

mod common;

pub mod comments;
pub mod commerce;
pub mod content;
pub mod files;
pub mod security;
pub mod seo;
pub mod themes;

// Agent re-exports
pub use comments::CommentModeratorAgent;
pub use commerce::StoreAssistantAgent;
pub use content::ContentWriterAgent;
pub use files::FileManagerAgent;
pub use security::SecurityAuditorAgent;
pub use seo::SeoOptimizerAgent;
pub use themes::{ThemeFetcher, ThemeManagerAgent};

/// The built-in agents in registration order
pub fn builtin_agents() -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(ContentWriterAgent),
        Arc::new(CommentModeratorAgent),
        Arc::new(SeoOptimizerAgent),
        Arc::new(SecurityAuditorAgent),
        Arc::new(ThemeManagerAgent::new()),
        Arc::new(StoreAssistantAgent),
        Arc::new(FileManagerAgent),
    ]
}

/// Build a registry with every built-in agent registered
pub fn registry_with_builtins() -> Result<AgentRegistry, RegistryError> {
    let mut builder = AgentRegistry::builder();
    for agent in builtin_agents() {
        builder = builder.agent(agent);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_agents_have_distinct_ids() {
        let agents = builtin_agents();
        let mut ids: Vec<&str> = agents.iter().map(|a| a.id()).collect();
        assert_eq!(ids.len(), 7);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_registry_with_builtins_registers_all() {
        let registry = registry_with_builtins().unwrap();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.first().map(|a| a.id()), Some("content-writer"));
    }
}
