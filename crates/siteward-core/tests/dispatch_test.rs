// Integration tests for the registry dispatch path
//
// These tests drive a small content agent end to end: registration,
// capability filtering, schema validation, handler execution against an
// in-memory backend, and the in-band error contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use siteward_core::{
    Agent, AgentRegistry, Capability, CapabilitySet, ContentStore, DispatchOutcome, HostContext,
    InMemoryContentStore, NewPost, ParamKind, ParamSpec, Tool, ToolArguments, ToolOutcome,
    ToolSchema,
};

// =============================================================================
// A minimal notes agent with one create tool and one read tool
// =============================================================================

struct CreateNoteTool;

#[async_trait]
impl Tool for CreateNoteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("create_note", "Create a note post")
            .param(ParamSpec::required("title", ParamKind::String, "Note title"))
            .param(
                ParamSpec::optional("content", ParamKind::String, "Note body")
                    .default_value(json!("")),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        let title = match args.str("title") {
            Some(t) => t.to_string(),
            None => return ToolOutcome::failure("Missing required parameter: title"),
        };
        let new = NewPost {
            title,
            content: args.str("content").unwrap_or_default().to_string(),
            ..Default::default()
        };
        match store.create_post(new).await {
            Ok(post) => ToolOutcome::success(json!({ "id": post.id, "slug": post.slug })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct CountNotesTool;

#[async_trait]
impl Tool for CountNotesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("count_notes", "Count stored notes")
    }

    async fn execute(&self, _args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        match store.list_posts(None, usize::MAX).await {
            Ok(posts) => ToolOutcome::success(json!({ "count": posts.len() })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct NotesAgent;

#[async_trait]
impl Agent for NotesAgent {
    fn id(&self) -> &str {
        "notes"
    }

    fn name(&self) -> &str {
        "Notes"
    }

    fn description(&self) -> &str {
        "Keeps short notes as posts"
    }

    fn system_prompt(&self) -> &str {
        "You manage short notes stored as posts."
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::edit_content()])
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(CreateNoteTool), Arc::new(CountNotesTool)]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.content.is_some() {
            Ok(())
        } else {
            Err("The content backend is not active".to_string())
        }
    }
}

fn registry() -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(NotesAgent)).unwrap();
    registry
}

fn host_with_store() -> (HostContext, InMemoryContentStore) {
    let store = InMemoryContentStore::new();
    let host = HostContext::new().with_content(Arc::new(store.clone()));
    (host, store)
}

async fn dispatch(registry: &AgentRegistry, tool: &str, args: Value, host: &HostContext) -> DispatchOutcome {
    registry.get("notes").unwrap().dispatch(tool, &args, host).await
}

// =============================================================================
// Dispatch contract
// =============================================================================

#[tokio::test]
async fn test_create_then_count_round_trip() {
    let registry = registry();
    let (host, _store) = host_with_store();

    let outcome = dispatch(
        &registry,
        "create_note",
        json!({ "title": "Remember the milk" }),
        &host,
    )
    .await;
    let DispatchOutcome::Success(payload) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(payload["id"], 1);
    assert_eq!(payload["slug"], "remember-the-milk");

    let outcome = dispatch(&registry, "count_notes", json!({}), &host).await;
    assert_eq!(outcome, DispatchOutcome::Success(json!({ "count": 1 })));
}

#[tokio::test]
async fn test_create_is_not_idempotent() {
    let registry = registry();
    let (host, store) = host_with_store();
    let args = json!({ "title": "Same title" });

    let first = dispatch(&registry, "create_note", args.clone(), &host).await;
    let second = dispatch(&registry, "create_note", args, &host).await;

    let (DispatchOutcome::Success(a), DispatchOutcome::Success(b)) = (first, second) else {
        panic!("expected two successes");
    };
    assert_ne!(a["id"], b["id"]);
    assert_ne!(a["slug"], b["slug"]);
    assert_eq!(store.list_posts(None, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_tool_is_not_owned() {
    let registry = registry();
    let (host, _store) = host_with_store();

    let outcome = dispatch(&registry, "publish_note", json!({}), &host).await;
    assert_eq!(outcome, DispatchOutcome::NotOwned);
    assert_eq!(outcome.into_value(), None);
}

#[tokio::test]
async fn test_missing_required_parameter_is_in_band() {
    let registry = registry();
    let (host, _store) = host_with_store();

    let outcome = dispatch(&registry, "create_note", json!({}), &host).await;
    assert_eq!(
        outcome.into_value(),
        Some(json!({ "error": "Missing required parameter: title" }))
    );
}

#[tokio::test]
async fn test_unknown_parameter_is_in_band() {
    let registry = registry();
    let (host, _store) = host_with_store();

    let outcome = dispatch(
        &registry,
        "create_note",
        json!({ "title": "ok", "tags": ["a"] }),
        &host,
    )
    .await;
    assert_eq!(
        outcome,
        DispatchOutcome::Failure("Unknown parameter: tags".to_string())
    );
}

#[tokio::test]
async fn test_missing_backend_short_circuits_all_tools() {
    let registry = registry();
    let host = HostContext::new();

    for (tool, args) in [
        ("create_note", json!({ "title": "x" })),
        ("count_notes", json!({})),
    ] {
        let outcome = dispatch(&registry, tool, args, &host).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Failure("The content backend is not active".to_string()),
            "tool {tool} should fail uniformly"
        );
    }
}

#[tokio::test]
async fn test_accessible_filters_by_capability() {
    let registry = registry();

    assert!(registry.accessible(&CapabilitySet::new()).is_empty());

    let editor = CapabilitySet::of([Capability::edit_content()]);
    let agents = registry.accessible(&editor);
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id(), "notes");

    // Extra capabilities never hide an agent
    let admin = editor.with(Capability::manage_users());
    assert_eq!(registry.accessible(&admin).len(), 1);
}

#[tokio::test]
async fn test_descriptor_lists_tools_in_declared_order() {
    let registry = registry();
    let descriptor = registry.get("notes").unwrap().descriptor();

    let names: Vec<&str> = descriptor
        .tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["create_note", "count_notes"]);
    assert_eq!(descriptor.required_capabilities.len(), 1);
}
