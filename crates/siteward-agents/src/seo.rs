// SEO optimization agent
//
// Design decisions:
// - The audit is a pure function over a post; every rule is deterministic
//   and names its threshold in the issue text so the model can act on it
// - Score is 100 minus a fixed penalty per issue; rules are independent and
//   at most one title rule fires at a time
// - `list_unoptimized` reuses the same audit over a bounded scan, worst
//   score first

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use siteward_core::{
    Agent, Capability, CapabilitySet, HostContext, ParamKind, ParamSpec, Post, PostPatch, Tool,
    ToolArguments, ToolOutcome, ToolSchema,
};

use crate::common::{limit_arg, require_u64};

const SYSTEM_PROMPT: &str = r#"# SEO Optimization

You are the SEO assistant for this site. You audit posts against on-page
SEO rules and apply fixes the user approves.

## What you can do

- Audit a post: title length, meta description, content depth, subheadings,
  and slug length
- Update a post's title, meta description, or slug
- List posts whose audit score falls below a threshold

## Audit rules

- Title should be 30 to 60 characters
- Meta description should exist and be 120 to 160 characters
- Content should be at least 300 words and contain subheadings
- Slug should be at most 75 characters

## Guidelines

- Always audit before proposing changes, and cite the concrete issues
- Propose a rewrite and wait for approval before calling update_seo
- Keep slugs short, lowercase, and descriptive
"#;

/// Penalty subtracted from 100 for each audit issue
pub const ISSUE_PENALTY: u32 = 15;

/// Result of the deterministic on-page audit
#[derive(Debug, Clone, Serialize)]
pub struct SeoAudit {
    /// 100 minus a fixed penalty per issue, floored at 0
    pub score: u32,
    pub issues: Vec<String>,
}

/// Audit one post against the on-page rules.
pub fn audit(post: &Post) -> SeoAudit {
    let mut issues = Vec::new();

    let title_len = post.title.chars().count();
    if title_len < 30 {
        issues.push(format!(
            "Title is too short: {title_len} characters (aim for at least 30)"
        ));
    } else if title_len > 60 {
        issues.push(format!(
            "Title is too long: {title_len} characters (aim for at most 60)"
        ));
    }

    match post.meta_description.as_deref() {
        None | Some("") => issues.push("Missing meta description".to_string()),
        Some(meta) => {
            let meta_len = meta.chars().count();
            if !(120..=160).contains(&meta_len) {
                issues.push(format!(
                    "Meta description is {meta_len} characters (aim for 120-160)"
                ));
            }
        }
    }

    let words = post.content.split_whitespace().count();
    if words < 300 {
        issues.push(format!(
            "Content is thin: {words} words (aim for at least 300)"
        ));
    }

    if !has_subheadings(&post.content) {
        issues.push("No subheadings (h2/h3) in the content".to_string());
    }

    let slug_len = post.slug.chars().count();
    if slug_len > 75 {
        issues.push(format!(
            "Slug is too long: {slug_len} characters (aim for at most 75)"
        ));
    }

    SeoAudit {
        score: 100u32.saturating_sub(ISSUE_PENALTY * issues.len() as u32),
        issues,
    }
}

/// Subheadings count in both HTML and markdown form
fn has_subheadings(content: &str) -> bool {
    let lower = content.to_lowercase();
    if lower.contains("<h2") || lower.contains("<h3") {
        return true;
    }
    content.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("## ") || line.starts_with("### ")
    })
}

// ============================================================================
// Agent
// ============================================================================

/// Builtin agent gated on `edit_content`
pub struct SeoOptimizerAgent;

#[async_trait]
impl Agent for SeoOptimizerAgent {
    fn id(&self) -> &str {
        "seo-optimizer"
    }

    fn name(&self) -> &str {
        "SEO Optimizer"
    }

    fn description(&self) -> &str {
        "Audits posts against on-page SEO rules and applies approved fixes"
    }

    fn icon(&self) -> &str {
        "trending-up"
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
            "Hello! I can audit your posts for on-page SEO issues and fix titles, \
             meta descriptions, and slugs."
                .to_string(),
        )
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "Audit my latest post".to_string(),
            "Which posts score below 80?".to_string(),
            "Write a better meta description for post 3".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(AuditPostTool),
            Arc::new(UpdateSeoTool),
            Arc::new(ListUnoptimizedTool),
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

struct AuditPostTool;

#[async_trait]
impl Tool for AuditPostTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("audit_post", "Audit one post against the on-page SEO rules").param(
            ParamSpec::required("post_id", ParamKind::Integer, "Id of the post to audit"),
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

        let post = match store.get_post(id).await {
            Ok(Some(post)) => post,
            Ok(None) => return ToolOutcome::failure(format!("Post not found: {id}")),
            Err(e) => return ToolOutcome::host_error(e),
        };

        let audit = audit(&post);
        ToolOutcome::success(json!({
            "post_id": id,
            "title": post.title,
            "audit": audit,
        }))
    }
}

struct UpdateSeoTool;

#[async_trait]
impl Tool for UpdateSeoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("update_seo", "Update a post's SEO fields")
            .param(ParamSpec::required(
                "post_id",
                ParamKind::Integer,
                "Id of the post to update",
            ))
            .param(ParamSpec::optional(
                "title",
                ParamKind::String,
                "New title (30-60 characters recommended)",
            ))
            .param(ParamSpec::optional(
                "meta_description",
                ParamKind::String,
                "New meta description (120-160 characters recommended)",
            ))
            .param(ParamSpec::optional(
                "slug",
                ParamKind::String,
                "New URL slug (at most 75 characters recommended)",
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

        let patch = PostPatch {
            title: args.str("title").map(str::to_string),
            meta_description: args.str("meta_description").map(str::to_string),
            slug: args.str("slug").map(str::to_string),
            ..Default::default()
        };
        if patch.is_empty() {
            return ToolOutcome::failure(
                "Provide at least one of: title, meta_description, slug",
            );
        }

        match store.update_post(id, patch).await {
            Ok(post) => {
                let audit = audit(&post);
                ToolOutcome::success(json!({ "post": post, "audit": audit }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct ListUnoptimizedTool;

impl ListUnoptimizedTool {
    /// How many posts one scan considers
    const SCAN_LIMIT: usize = 100;
}

#[async_trait]
impl Tool for ListUnoptimizedTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "list_unoptimized",
            "List posts whose SEO score falls below a threshold, worst first",
        )
        .param(
            ParamSpec::optional("threshold", ParamKind::Integer, "Score cutoff (0-100)")
                .default_value(json!(80)),
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
        let threshold = args.u64("threshold").unwrap_or(80).min(100) as u32;
        let limit = limit_arg(&args, 10);

        let posts = match store.list_posts(None, Self::SCAN_LIMIT).await {
            Ok(posts) => posts,
            Err(e) => return ToolOutcome::host_error(e),
        };

        let mut flagged: Vec<_> = posts
            .iter()
            .map(|post| (post, audit(post)))
            .filter(|(_, audit)| audit.score < threshold)
            .map(|(post, audit)| {
                json!({
                    "id": post.id,
                    "title": post.title,
                    "score": audit.score,
                    "issues": audit.issues,
                })
            })
            .collect();
        flagged.sort_by_key(|entry| entry["score"].as_u64().unwrap_or(0));
        flagged.truncate(limit);

        let count = flagged.len();
        ToolOutcome::success(json!({
            "threshold": threshold,
            "posts": flagged,
            "count": count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteward_core::{InMemoryContentStore, PostStatus};

    fn post(id: u64, title: &str, content: &str, meta: Option<&str>, slug: &str) -> Post {
        let now = chrono::Utc::now();
        Post {
            id,
            title: title.to_string(),
            content: content.to_string(),
            slug: slug.to_string(),
            excerpt: None,
            meta_description: meta.map(str::to_string),
            status: PostStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    fn well_optimized() -> Post {
        let meta = "m".repeat(140);
        let content = format!("## Overview\n{}\n## Details\nmore", "word ".repeat(320));
        post(
            1,
            "A Complete Guide to Writing Better Posts", // 40 chars
            &content,
            Some(&meta),
            "complete-guide",
        )
    }

    #[test]
    fn test_short_title_names_the_threshold() {
        let mut p = well_optimized();
        p.title = "Getting Started With Rust".to_string(); // 25 chars

        let audit = audit(&p);
        assert_eq!(audit.issues.len(), 1);
        assert_eq!(
            audit.issues[0],
            "Title is too short: 25 characters (aim for at least 30)"
        );
        assert_eq!(audit.score, 85);
    }

    #[test]
    fn test_well_optimized_post_scores_100() {
        let audit = audit(&well_optimized());
        assert_eq!(audit.score, 100);
        assert!(audit.issues.is_empty());
    }

    #[test]
    fn test_every_rule_fires_on_a_bad_post() {
        let p = post(
            2,
            "Hi",                     // too short
            "tiny body",              // thin, no subheadings
            None,                     // missing meta
            &"long-".repeat(20),      // 100-char slug
        );

        let audit = audit(&p);
        assert_eq!(audit.issues.len(), 5);
        assert_eq!(audit.score, 25);
    }

    #[test]
    fn test_meta_description_length_band() {
        let mut p = well_optimized();
        p.meta_description = Some("too short".to_string());
        let a = audit(&p);
        assert!(a.issues.iter().any(|i| i.contains("120-160")));

        p.meta_description = Some("m".repeat(200));
        let a = audit(&p);
        assert!(a.issues.iter().any(|i| i.contains("200 characters")));

        p.meta_description = Some("m".repeat(120));
        assert!(audit(&p).issues.is_empty());
        p.meta_description = Some("m".repeat(160));
        assert!(audit(&p).issues.is_empty());
    }

    #[test]
    fn test_html_subheadings_are_detected() {
        let mut p = well_optimized();
        p.content = format!("<h2>Overview</h2>{}", "word ".repeat(320));
        assert!(audit(&p).issues.is_empty());
    }

    #[tokio::test]
    async fn test_list_unoptimized_orders_worst_first() {
        let store = InMemoryContentStore::new();
        let mut bad = well_optimized();
        bad.id = 2;
        bad.title = "Bad".to_string(); // short title + missing meta = 70
        bad.meta_description = None;
        bad.slug = "bad".to_string();
        let worse = post(3, "Hi", "tiny", None, "worse"); // four issues = 40
        store.seed([well_optimized(), bad, worse]).await;
        let host = HostContext::new().with_content(Arc::new(store));

        let tool = ListUnoptimizedTool;
        let args = tool.schema().check_args(&json!({})).unwrap();
        let outcome = tool.execute(args, &host).await;

        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["posts"][0]["id"], 3);
        assert_eq!(payload["posts"][1]["id"], 2);
        assert_eq!(payload["threshold"], 80);
    }

    #[tokio::test]
    async fn test_update_seo_requires_a_field() {
        let store = InMemoryContentStore::new();
        store.seed([well_optimized()]).await;
        let host = HostContext::new().with_content(Arc::new(store));

        let tool = UpdateSeoTool;
        let args = tool.schema().check_args(&json!({ "post_id": 1 })).unwrap();
        let outcome = tool.execute(args, &host).await;
        assert!(matches!(&outcome, ToolOutcome::Failure(msg)
            if msg == "Provide at least one of: title, meta_description, slug"));
    }
}
