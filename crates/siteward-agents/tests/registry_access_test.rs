// Integration tests for the built-in agent suite and capability gating
//
// These tests pin the shipped roster: which agents exist, which capability
// each one needs, and that access widens monotonically with the caller's
// capability set.

use std::sync::Arc;

use siteward_agents::{registry_with_builtins, ContentWriterAgent};
use siteward_core::{Capability, CapabilitySet, HostContext, RegistryError};

fn all_capabilities() -> CapabilitySet {
    CapabilitySet::of([
        Capability::edit_content(),
        Capability::moderate_comments(),
        Capability::manage_themes(),
        Capability::manage_users(),
        Capability::manage_catalog(),
        Capability::manage_files(),
    ])
}

#[test]
fn test_builtin_roster_and_order() {
    let registry = registry_with_builtins().unwrap();

    assert_eq!(
        registry.ids(),
        vec![
            "content-writer",
            "comment-moderator",
            "seo-optimizer",
            "security-auditor",
            "theme-manager",
            "store-assistant",
            "file-manager",
        ]
    );
    assert_eq!(registry.first().map(|a| a.id()), Some("content-writer"));
}

#[test]
fn test_every_agent_requires_a_capability() {
    let registry = registry_with_builtins().unwrap();

    for agent in registry.agents() {
        assert!(
            !agent.required_capabilities().is_empty(),
            "{} must require at least one capability",
            agent.id()
        );
    }

    // Therefore a caller with no capabilities sees nothing
    assert!(registry.accessible(&CapabilitySet::new()).is_empty());
}

#[test]
fn test_accessible_widens_monotonically() {
    let registry = registry_with_builtins().unwrap();

    let editor = CapabilitySet::of([Capability::edit_content()]);
    let editor_ids: Vec<&str> = registry.accessible(&editor).iter().map(|a| a.id()).collect();
    assert_eq!(editor_ids, vec!["content-writer", "seo-optimizer"]);

    let moderator = editor.clone().with(Capability::moderate_comments());
    let moderator_ids: Vec<&str> = registry
        .accessible(&moderator)
        .iter()
        .map(|a| a.id())
        .collect();
    assert_eq!(
        moderator_ids,
        vec!["content-writer", "comment-moderator", "seo-optimizer"]
    );
    for id in &editor_ids {
        assert!(moderator_ids.contains(id), "widening must not drop {id}");
    }

    let everything = registry.accessible(&all_capabilities());
    assert_eq!(everything.len(), registry.len());
}

#[test]
fn test_per_capability_gating() {
    let registry = registry_with_builtins().unwrap();
    let expectations = [
        (Capability::moderate_comments(), vec!["comment-moderator"]),
        (Capability::manage_users(), vec!["security-auditor"]),
        (Capability::manage_themes(), vec!["theme-manager"]),
        (Capability::manage_catalog(), vec!["store-assistant"]),
        (Capability::manage_files(), vec!["file-manager"]),
    ];

    for (capability, expected) in expectations {
        let caller = CapabilitySet::of([capability.clone()]);
        let ids: Vec<&str> = registry.accessible(&caller).iter().map(|a| a.id()).collect();
        assert_eq!(ids, expected, "unexpected agents for {capability}");
    }
}

#[tokio::test]
async fn test_every_listed_tool_is_owned_by_its_agent() {
    let registry = registry_with_builtins().unwrap();
    let host = HostContext::new();

    for agent in registry.agents() {
        let names: Vec<String> = agent
            .tool_schemas()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert!(!names.is_empty(), "{} ships no tools", agent.id());

        for name in &names {
            assert!(agent.owns(name));
            // The empty host makes the call fail, but never as NotOwned
            let outcome = agent
                .dispatch(name, &serde_json::json!({}), &host)
                .await;
            assert_ne!(
                outcome,
                siteward_core::DispatchOutcome::NotOwned,
                "{}::{name} should be owned",
                agent.id()
            );
        }

        let outcome = agent
            .dispatch("no_such_tool", &serde_json::json!({}), &host)
            .await;
        assert_eq!(outcome, siteward_core::DispatchOutcome::NotOwned);
    }
}

#[test]
fn test_tool_names_are_unique_within_each_agent() {
    let registry = registry_with_builtins().unwrap();

    for agent in registry.agents() {
        let mut names: Vec<&str> = agent.tool_schemas().iter().map(|s| s.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total, "{} repeats a tool name", agent.id());
    }
}

#[test]
fn test_registering_a_builtin_twice_is_rejected() {
    let mut registry = registry_with_builtins().unwrap();

    let err = registry.register(Arc::new(ContentWriterAgent)).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateAgent(id) if id == "content-writer"));
    assert_eq!(registry.len(), 7);
}

#[test]
fn test_descriptors_cover_presentation_fields() {
    let registry = registry_with_builtins().unwrap();
    let descriptors = registry.descriptors();
    assert_eq!(descriptors.len(), 7);

    for descriptor in &descriptors {
        assert!(!descriptor.name.is_empty());
        assert!(!descriptor.description.is_empty());
        assert!(!descriptor.icon.is_empty());
        assert!(!descriptor.category.is_empty());
        assert!(!descriptor.tools.is_empty());
        assert!(
            descriptor.welcome_message.is_some(),
            "{} ships no welcome message",
            descriptor.id
        );
        assert!(!descriptor.suggested_prompts.is_empty());
    }

    for agent in registry.agents() {
        assert!(
            !agent.agent().system_prompt().trim().is_empty(),
            "{} ships an empty system prompt",
            agent.id()
        );
    }
}
