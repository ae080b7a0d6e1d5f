//! Simple Agent Example - One custom agent with a single tool
//!
//! This is the simplest possible example of using siteward-core: define an
//! agent with one tool, register it, and dispatch calls to it. The tool is a
//! pure function over its arguments, so no host backends are wired.
//!
//! Everything runs offline; no credentials or network access required.
//!
//! Run with: cargo run -p siteward-core --example simple_agent

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use siteward_core::{
    slugify, Agent, AgentRegistry, Capability, CapabilitySet, HostContext, ParamKind, ParamSpec,
    Tool, ToolArguments, ToolOutcome, ToolSchema,
};

/// Turns a post title into a URL slug
struct MakeSlugTool;

#[async_trait]
impl Tool for MakeSlugTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("make_slug", "Turn a title into a URL slug").param(ParamSpec::required(
            "title",
            ParamKind::String,
            "Title to convert",
        ))
    }

    async fn execute(&self, args: ToolArguments, _host: &HostContext) -> ToolOutcome {
        let Some(title) = args.str("title") else {
            return ToolOutcome::failure("Missing required parameter: title");
        };
        let slug = slugify(title);
        if slug.is_empty() {
            return ToolOutcome::failure("The title contains no usable characters");
        }
        ToolOutcome::success(json!({ "title": title, "slug": slug }))
    }
}

struct UtilityAgent;

#[async_trait]
impl Agent for UtilityAgent {
    fn id(&self) -> &str {
        "utilities"
    }

    fn name(&self) -> &str {
        "Utilities"
    }

    fn description(&self) -> &str {
        "Small editorial helpers"
    }

    fn system_prompt(&self) -> &str {
        "You provide small editorial utilities for the site."
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::edit_content()])
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(MakeSlugTool)]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Simple Agent (siteward-core) ===\n");

    // 1. Register the agent; a duplicate id would be rejected here
    let registry = AgentRegistry::builder()
        .agent(Arc::new(UtilityAgent))
        .build()?;

    // 2. Capability gating: hidden until the caller holds edit_content
    let nobody = CapabilitySet::new();
    let editor = CapabilitySet::of([Capability::edit_content()]);
    println!("agents visible with no grants:  {}", registry.accessible(&nobody).len());
    println!("agents visible to an editor:    {}\n", registry.accessible(&editor).len());

    // 3. Route a call; this tool needs no backends
    let host = HostContext::new();
    println!("request id: {}\n", host.request_id);

    if let Some((owner, outcome)) = registry
        .route("make_slug", &json!({ "title": "Hello, Rust World!" }), &host)
        .await
    {
        println!("[{}] make_slug -> {:?}", owner, outcome.into_value());
    }

    // 4. A type error comes back in-band through the same path
    if let Some((owner, outcome)) = registry
        .route("make_slug", &json!({ "title": 7 }), &host)
        .await
    {
        println!("[{}] make_slug -> {:?}", owner, outcome.into_value());
    }

    // 5. An unknown tool routes nowhere
    if registry.route("levitate", &json!({}), &host).await.is_none() {
        println!("[nobody] levitate -> not owned");
    }

    Ok(())
}
