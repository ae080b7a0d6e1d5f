//! Tool Dispatch Example - Built-in Agents on In-Memory Backends
//!
//! This example builds the full built-in registry, wires a host context with
//! in-memory backends and a sandboxed scratch directory, then walks the
//! dispatch protocol end to end: the agent roster, capability gating, routed
//! tool calls, and failures reported in-band.
//!
//! Everything runs offline; no credentials or network access required.
//!
//! Run with: cargo run -p siteward-agents --example tool_dispatch

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use siteward_agents::registry_with_builtins;
use siteward_core::{
    AgentRegistry, CapabilitySet, Comment, CommentStatus, DispatchOutcome, FileSandbox,
    HostContext, InMemoryCatalogStore, InMemoryCommentStore, InMemoryContentStore,
    InMemoryThemeStore, InMemoryUserStore, Post, PostStatus, Product, ProductStatus, Theme, User,
    UserRole,
};

// ============================================================================
// Demo host
// ============================================================================

/// Wire a host context with every backend active and some data seeded
async fn demo_host(sandbox_root: &Path) -> anyhow::Result<HostContext> {
    let now = Utc::now();

    let content = InMemoryContentStore::new();
    content
        .seed([Post {
            id: 1,
            title: "Welcome to the relaunch".to_string(),
            content: "We rebuilt the site from the ground up. More details soon.".to_string(),
            slug: "welcome-to-the-relaunch".to_string(),
            excerpt: None,
            meta_description: None,
            status: PostStatus::Published,
            created_at: now,
            updated_at: now,
        }])
        .await;

    let comments = InMemoryCommentStore::new();
    comments
        .seed([
            Comment {
                id: 1,
                post_id: 1,
                author: "dealbot3000".to_string(),
                author_email: None,
                content: "buy now at http://deals.example/a or http://deals.example/b or \
                          http://deals.example/c"
                    .to_string(),
                status: CommentStatus::Pending,
                created_at: now,
            },
            Comment {
                id: 2,
                post_id: 1,
                author: "Priya".to_string(),
                author_email: Some("priya@example.com".to_string()),
                content: "Great write-up, thanks for sharing the details.".to_string(),
                status: CommentStatus::Pending,
                created_at: now,
            },
        ])
        .await;

    let users = InMemoryUserStore::new();
    users
        .seed([
            User {
                id: 1,
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                display_name: "Site Admin".to_string(),
                role: UserRole::Administrator,
                registered_at: now,
            },
            User {
                id: 2,
                username: "priya".to_string(),
                email: "priya@example.com".to_string(),
                display_name: "Priya".to_string(),
                role: UserRole::Editor,
                registered_at: now,
            },
        ])
        .await;

    let themes = InMemoryThemeStore::new();
    themes
        .seed([Theme {
            slug: "aurora".to_string(),
            name: "Aurora".to_string(),
            active: true,
            size_bytes: 4096,
            installed_at: now,
        }])
        .await;

    let catalog = InMemoryCatalogStore::new();
    catalog
        .seed([
            Product {
                id: 1,
                name: "Canvas Tote".to_string(),
                description: "Heavy cotton tote with the site logo".to_string(),
                sku: "TOTE-1".to_string(),
                price_cents: 2499,
                stock_quantity: 12,
                status: ProductStatus::Active,
                created_at: now,
                updated_at: now,
            },
            Product {
                id: 2,
                name: "Sticker Pack".to_string(),
                description: "Five die-cut vinyl stickers".to_string(),
                sku: "STICK-1".to_string(),
                price_cents: 499,
                stock_quantity: 3,
                status: ProductStatus::Active,
                created_at: now,
                updated_at: now,
            },
            Product {
                id: 3,
                name: "Launch Poster".to_string(),
                description: "A2 print of the relaunch artwork".to_string(),
                sku: "POST-1".to_string(),
                price_cents: 1599,
                stock_quantity: 0,
                status: ProductStatus::Active,
                created_at: now,
                updated_at: now,
            },
        ])
        .await;

    let sandbox = FileSandbox::new(sandbox_root)?;

    Ok(HostContext::new()
        .with_content(Arc::new(content))
        .with_comments(Arc::new(comments))
        .with_themes(Arc::new(themes))
        .with_users(Arc::new(users))
        .with_catalog(Arc::new(catalog))
        .with_files(Arc::new(sandbox)))
}

// ============================================================================
// Helper to print routed calls
// ============================================================================

async fn route_and_print(
    registry: &AgentRegistry,
    host: &HostContext,
    tool: &str,
    arguments: Value,
) {
    println!("  {}({})", tool, arguments);
    match registry.route(tool, &arguments, host).await {
        Some((owner, DispatchOutcome::Success(value))) => {
            println!("    [{}] ok: {}\n", owner, value);
        }
        Some((owner, DispatchOutcome::Failure(message))) => {
            println!("    [{}] failed: {}\n", owner, message);
        }
        _ => {
            println!("    no agent owns this tool\n");
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep logging quiet; failures in this demo come back as data
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Tool Dispatch Demo (siteward-agents) ===\n");

    let registry = registry_with_builtins()?;
    let sandbox_dir = tempfile::tempdir()?;
    let host = demo_host(sandbox_dir.path()).await?;

    example_roster(&registry);
    example_capability_gating(&registry);
    example_routed_calls(&registry, &host).await;
    example_in_band_failures(&registry, &host).await;

    println!("=== Demo completed! ===");
    Ok(())
}

/// Example 1: What the registry knows about each built-in agent
fn example_roster(registry: &AgentRegistry) {
    println!("--- Example 1: Agent Roster ---\n");

    for agent in registry.agents() {
        let descriptor = agent.descriptor();
        let tools: Vec<&str> = agent.tool_schemas().iter().map(|s| s.name()).collect();
        println!("  {} - {}", descriptor.id, descriptor.description);
        println!("    requires: {}", descriptor.required_capabilities);
        println!("    tools:    {}", tools.join(", "));
    }
    println!();
}

/// Example 2: Agents stay hidden until the caller holds every required capability
fn example_capability_gating(registry: &AgentRegistry) {
    println!("--- Example 2: Capability Gating ---\n");

    let callers = [
        ("visitor", CapabilitySet::new()),
        ("author", CapabilitySet::of(["edit_content"])),
        (
            "moderator",
            CapabilitySet::of(["edit_content", "moderate_comments"]),
        ),
        (
            "administrator",
            CapabilitySet::of([
                "edit_content",
                "moderate_comments",
                "manage_users",
                "manage_themes",
                "manage_catalog",
                "manage_files",
            ]),
        ),
    ];

    for (label, grants) in &callers {
        let visible: Vec<&str> = registry.accessible(grants).iter().map(|a| a.id()).collect();
        let listing = if visible.is_empty() {
            "(none)".to_string()
        } else {
            visible.join(", ")
        };
        println!("  {:<14} sees: {}", label, listing);
    }
    println!();
}

/// Example 3: Tool calls routed to their owning agents
async fn example_routed_calls(registry: &AgentRegistry, host: &HostContext) {
    println!("--- Example 3: Routed Tool Calls ---\n");

    route_and_print(
        registry,
        host,
        "create_post",
        json!({
            "title": "Ten Tips for Faster Page Loads",
            "content": "Measure first. Cache aggressively. Ship less JavaScript.",
        }),
    )
    .await;

    route_and_print(registry, host, "audit_post", json!({ "post_id": 1 })).await;

    route_and_print(registry, host, "analyze_comment", json!({ "comment_id": 1 })).await;

    route_and_print(
        registry,
        host,
        "moderate_comment",
        json!({ "comment_id": 1, "action": "spam" }),
    )
    .await;

    route_and_print(registry, host, "check_inventory", json!({})).await;

    route_and_print(
        registry,
        host,
        "write_file",
        json!({ "path": "notes/welcome.txt", "content": "Hello from the file manager" }),
    )
    .await;

    route_and_print(registry, host, "read_file", json!({ "path": "notes/welcome.txt" })).await;
}

/// Example 4: Failures come back as data, never as transport errors
async fn example_in_band_failures(registry: &AgentRegistry, host: &HostContext) {
    println!("--- Example 4: Failures Stay In-Band ---\n");

    // Path traversal is rejected by the sandbox
    route_and_print(registry, host, "read_file", json!({ "path": "../../etc/passwd" })).await;

    // The catalog refuses negative prices
    route_and_print(
        registry,
        host,
        "create_product",
        json!({ "name": "Mystery Box", "price": -5.0 }),
    )
    .await;

    // Switching to a theme that is not installed
    route_and_print(registry, host, "switch_theme", json!({ "slug": "ghost" })).await;

    // An update with nothing to change
    route_and_print(registry, host, "update_post", json!({ "post_id": 1 })).await;

    // Nobody owns this name, so the call routes nowhere
    route_and_print(registry, host, "telepathy", json!({})).await;
}
