// Comment moderation agent
//
// Design decisions:
// - Moderation actions are a closed enum (approve, hold, spam, trash); the
//   schema enforces it so handlers never see a free-form action
// - Spam analysis is a pure function over the stored comment text: additive
//   signal scores capped at 100, with fixed thresholds for the
//   recommendation bands
// - The analysis reports its signals so the model can explain a decision
//   instead of citing a bare number

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use siteward_core::{
    Agent, Capability, CapabilitySet, CommentStatus, HostContext, ParamKind, ParamSpec, Tool,
    ToolArguments, ToolOutcome, ToolSchema,
};

use crate::common::{limit_arg, require_u64};

const SYSTEM_PROMPT: &str = r#"# Comment Moderation

You are the comment moderation assistant for this site. You review incoming
comments, flag spam, and keep discussions healthy.

## What you can do

- List comments filtered by status (pending, approved, spam, trash) or by post
- Inspect a single comment with its author details
- Approve, hold, spam, or trash a comment
- Run a spam analysis on a comment and explain the signals behind the score

## Guidelines

- Never approve a comment without looking at its content first
- A spam score of 70 or higher means mark as spam; 40 to 69 means ask for
  human review; below 40 is usually safe to approve
- Quote the relevant part of a comment when you explain a decision
- Moderation changes take effect immediately; confirm with the user before
  trashing anything that is not obvious spam
"#;

/// Phrases that contribute to the spam score; each distinct match counts once
pub const SPAM_PHRASES: &[&str] = &[
    "buy now",
    "click here",
    "limited time offer",
    "act now",
    "free money",
    "work from home",
    "no credit check",
    "risk free",
];

/// Score at or above which a comment is recommended for the spam bin
pub const SPAM_THRESHOLD: u32 = 70;

/// Score at or above which a comment is recommended for human review
pub const REVIEW_THRESHOLD: u32 = 40;

/// Result of the deterministic spam heuristic
#[derive(Debug, Clone, Serialize)]
pub struct SpamAnalysis {
    /// 0 to 100
    pub score: u32,
    /// "spam", "review", or "approve"
    pub recommendation: String,
    /// Human-readable descriptions of each signal that fired
    pub signals: Vec<String>,
}

/// Score a comment body for spam signals.
///
/// Additive and order-independent: 20 per embedded link, 25 per distinct
/// known spam phrase, 15 for mostly-uppercase text, 10 for three or more
/// exclamation marks; capped at 100.
pub fn analyze_spam(content: &str) -> SpamAnalysis {
    let lower = content.to_lowercase();
    let mut score = 0u32;
    let mut signals = Vec::new();

    let links = lower.matches("http://").count() + lower.matches("https://").count();
    if links > 0 {
        score += 20 * links as u32;
        signals.push(format!("contains {links} embedded link(s)"));
    }

    for phrase in SPAM_PHRASES {
        if lower.contains(phrase) {
            score += 25;
            signals.push(format!("contains the phrase \"{phrase}\""));
        }
    }

    let letters: Vec<char> = content.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 12 {
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        if upper * 10 > letters.len() * 6 {
            score += 15;
            signals.push("mostly uppercase text".to_string());
        }
    }

    let exclamations = content.matches('!').count();
    if exclamations >= 3 {
        score += 10;
        signals.push(format!("{exclamations} exclamation marks"));
    }

    let score = score.min(100);
    let recommendation = if score >= SPAM_THRESHOLD {
        "spam"
    } else if score >= REVIEW_THRESHOLD {
        "review"
    } else {
        "approve"
    };

    SpamAnalysis {
        score,
        recommendation: recommendation.to_string(),
        signals,
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Builtin agent gated on `moderate_comments`
pub struct CommentModeratorAgent;

#[async_trait]
impl Agent for CommentModeratorAgent {
    fn id(&self) -> &str {
        "comment-moderator"
    }

    fn name(&self) -> &str {
        "Comment Moderator"
    }

    fn description(&self) -> &str {
        "Reviews comments, detects spam, and applies moderation decisions"
    }

    fn icon(&self) -> &str {
        "message-square"
    }

    fn category(&self) -> &str {
        "moderation"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::moderate_comments()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some(
            "Hi! I can review pending comments, analyze them for spam, and apply \
             moderation decisions for you."
                .to_string(),
        )
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "Show me the pending comments".to_string(),
            "Analyze the newest comment for spam".to_string(),
            "Approve everything that looks legitimate".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ListCommentsTool),
            Arc::new(GetCommentTool),
            Arc::new(ModerateCommentTool),
            Arc::new(AnalyzeCommentTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.comments.is_some() {
            Ok(())
        } else {
            Err("The comments backend is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct ListCommentsTool;

#[async_trait]
impl Tool for ListCommentsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_comments", "List comments, newest first")
            .param(
                ParamSpec::optional("status", ParamKind::String, "Filter by moderation status")
                    .one_of(["pending", "approved", "spam", "trash"]),
            )
            .param(ParamSpec::optional(
                "post_id",
                ParamKind::Integer,
                "Only comments on this post",
            ))
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Maximum number of comments")
                    .default_value(json!(20)),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.comments.as_ref() else {
            return ToolOutcome::failure("The comments backend is not active");
        };
        let status = match args.str("status").map(str::parse::<CommentStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };
        let post_id = if args.has("post_id") {
            match require_u64(&args, "post_id") {
                Ok(id) => Some(id),
                Err(message) => return ToolOutcome::failure(message),
            }
        } else {
            None
        };

        match store.list_comments(status, post_id, limit_arg(&args, 20)).await {
            Ok(comments) => {
                let count = comments.len();
                ToolOutcome::success(json!({ "comments": comments, "count": count }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct GetCommentTool;

#[async_trait]
impl Tool for GetCommentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("get_comment", "Fetch a single comment").param(ParamSpec::required(
            "comment_id",
            ParamKind::Integer,
            "Id of the comment",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.comments.as_ref() else {
            return ToolOutcome::failure("The comments backend is not active");
        };
        let id = match require_u64(&args, "comment_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };

        match store.get_comment(id).await {
            Ok(Some(comment)) => ToolOutcome::success(json!({ "comment": comment })),
            Ok(None) => ToolOutcome::failure(format!("Comment not found: {id}")),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct ModerateCommentTool;

#[async_trait]
impl Tool for ModerateCommentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("moderate_comment", "Apply a moderation decision to a comment")
            .param(ParamSpec::required(
                "comment_id",
                ParamKind::Integer,
                "Id of the comment",
            ))
            .param(
                ParamSpec::required("action", ParamKind::String, "Moderation action to apply")
                    .one_of(["approve", "hold", "spam", "trash"]),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.comments.as_ref() else {
            return ToolOutcome::failure("The comments backend is not active");
        };
        let id = match require_u64(&args, "comment_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };
        // The schema's enum already excludes anything else
        let status = match args.str("action") {
            Some("approve") => CommentStatus::Approved,
            Some("hold") => CommentStatus::Pending,
            Some("spam") => CommentStatus::Spam,
            Some("trash") => CommentStatus::Trash,
            _ => return ToolOutcome::failure("Missing required parameter: action"),
        };

        match store.set_comment_status(id, status).await {
            Ok(comment) => ToolOutcome::success(json!({
                "comment": comment,
                "applied": args.str("action"),
            })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct AnalyzeCommentTool;

#[async_trait]
impl Tool for AnalyzeCommentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "analyze_comment",
            "Score a comment for spam signals and recommend an action",
        )
        .param(ParamSpec::required(
            "comment_id",
            ParamKind::Integer,
            "Id of the comment",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.comments.as_ref() else {
            return ToolOutcome::failure("The comments backend is not active");
        };
        let id = match require_u64(&args, "comment_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };

        let comment = match store.get_comment(id).await {
            Ok(Some(comment)) => comment,
            Ok(None) => return ToolOutcome::failure(format!("Comment not found: {id}")),
            Err(e) => return ToolOutcome::host_error(e),
        };

        let analysis = analyze_spam(&comment.content);
        ToolOutcome::success(json!({
            "comment_id": id,
            "status": comment.status,
            "analysis": analysis,
        }))
    }
}
