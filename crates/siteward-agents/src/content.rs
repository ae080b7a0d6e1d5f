// Content writing agent
//
// Design decisions:
// - Creating a post always goes through NewPost; the slug is derived by the
//   host when omitted, so two identical create calls yield two posts with
//   distinct slugs
// - The create schema excludes the trash status; trashing is an update
// - Empty updates are refused by the host ("No fields to update") and the
//   message passes through in-band unchanged

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use siteward_core::{
    Agent, Capability, CapabilitySet, HostContext, NewPost, ParamKind, ParamSpec, PostPatch,
    PostStatus, Tool, ToolArguments, ToolOutcome, ToolSchema,
};

use crate::common::{limit_arg, require_u64};

const SYSTEM_PROMPT: &str = r#"# Content Writing

You are the content assistant for this site. You draft, edit, and organize
posts together with the user.

## What you can do

- Create posts (they start as drafts unless told otherwise)
- Update any field of an existing post, including its status
- Fetch a post to read it before editing
- List posts by status

## Guidelines

- Draft first: create new posts with draft status and let the user review
- Never publish or trash a post without explicit confirmation
- When editing, fetch the current content first and change only what was
  asked for
- Write in the site's voice; keep titles concrete and under 60 characters
"#;

/// Builtin agent gated on `edit_content`
pub struct ContentWriterAgent;

#[async_trait]
impl Agent for ContentWriterAgent {
    fn id(&self) -> &str {
        "content-writer"
    }

    fn name(&self) -> &str {
        "Content Writer"
    }

    fn description(&self) -> &str {
        "Drafts, edits, and organizes posts"
    }

    fn icon(&self) -> &str {
        "pencil"
    }

    fn category(&self) -> &str {
        "content"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::edit_content()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some(
            "Hi! I can draft new posts, edit existing ones, and keep your content \
             organized. What are we writing today?"
                .to_string(),
        )
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "Draft a post about our latest release".to_string(),
            "Show me all drafts".to_string(),
            "Tighten up the intro of post 7".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(CreatePostTool),
            Arc::new(UpdatePostTool),
            Arc::new(GetPostTool),
            Arc::new(ListPostsTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.content.is_some() {
            Ok(())
        } else {
            Err("The content backend is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct CreatePostTool;

#[async_trait]
impl Tool for CreatePostTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("create_post", "Create a new post")
            .param(ParamSpec::required("title", ParamKind::String, "Post title"))
            .param(ParamSpec::required(
                "content",
                ParamKind::String,
                "Post body (HTML or markdown)",
            ))
            .param(ParamSpec::optional(
                "excerpt",
                ParamKind::String,
                "Short summary shown in listings",
            ))
            .param(ParamSpec::optional(
                "meta_description",
                ParamKind::String,
                "SEO meta description",
            ))
            .param(ParamSpec::optional(
                "slug",
                ParamKind::String,
                "URL slug; derived from the title when omitted",
            ))
            .param(
                ParamSpec::optional("status", ParamKind::String, "Initial status; defaults to draft")
                    .one_of(["draft", "pending", "published"]),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        let status = match args.str("status").map(str::parse::<PostStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        let new = NewPost {
            title: args.str("title").unwrap_or_default().to_string(),
            content: args.str("content").unwrap_or_default().to_string(),
            slug: args.str("slug").map(str::to_string),
            excerpt: args.str("excerpt").map(str::to_string),
            meta_description: args.str("meta_description").map(str::to_string),
            status,
        };

        match store.create_post(new).await {
            Ok(post) => ToolOutcome::success(json!({ "post": post })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct UpdatePostTool;

#[async_trait]
impl Tool for UpdatePostTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("update_post", "Update fields of an existing post")
            .param(ParamSpec::required(
                "post_id",
                ParamKind::Integer,
                "Id of the post to update",
            ))
            .param(ParamSpec::optional("title", ParamKind::String, "New title"))
            .param(ParamSpec::optional(
                "content",
                ParamKind::String,
                "New post body",
            ))
            .param(ParamSpec::optional(
                "excerpt",
                ParamKind::String,
                "New excerpt",
            ))
            .param(ParamSpec::optional(
                "meta_description",
                ParamKind::String,
                "New meta description",
            ))
            .param(ParamSpec::optional("slug", ParamKind::String, "New URL slug"))
            .param(
                ParamSpec::optional("status", ParamKind::String, "New status")
                    .one_of(["draft", "pending", "published", "trash"]),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        let id = match require_u64(&args, "post_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };
        let status = match args.str("status").map(str::parse::<PostStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        let patch = PostPatch {
            title: args.str("title").map(str::to_string),
            content: args.str("content").map(str::to_string),
            slug: args.str("slug").map(str::to_string),
            excerpt: args.str("excerpt").map(str::to_string),
            meta_description: args.str("meta_description").map(str::to_string),
            status,
        };

        match store.update_post(id, patch).await {
            Ok(post) => ToolOutcome::success(json!({ "post": post })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct GetPostTool;

#[async_trait]
impl Tool for GetPostTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("get_post", "Fetch a single post").param(ParamSpec::required(
            "post_id",
            ParamKind::Integer,
            "Id of the post",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        let id = match require_u64(&args, "post_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };

        match store.get_post(id).await {
            Ok(Some(post)) => ToolOutcome::success(json!({ "post": post })),
            Ok(None) => ToolOutcome::failure(format!("Post not found: {id}")),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct ListPostsTool;

#[async_trait]
impl Tool for ListPostsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_posts", "List posts, newest first")
            .param(
                ParamSpec::optional("status", ParamKind::String, "Filter by status")
                    .one_of(["draft", "pending", "published", "trash"]),
            )
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Maximum number of posts")
                    .default_value(json!(10)),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.content.as_ref() else {
            return ToolOutcome::failure("The content backend is not active");
        };
        let status = match args.str("status").map(str::parse::<PostStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        match store.list_posts(status, limit_arg(&args, 10)).await {
            Ok(posts) => {
                let count = posts.len();
                ToolOutcome::success(json!({ "posts": posts, "count": count }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}
