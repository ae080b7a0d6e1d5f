// Security auditing agent
//
// Design decisions:
// - The audit is a pure function over a user listing, so the heuristics are
//   unit-testable without a store
// - Role counts cover every role, zeros included, most privileged first
// - The audit scans at most MAX_LIST_LIMIT accounts in one pass

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use siteward_core::{
    Agent, Capability, CapabilitySet, HostContext, ParamKind, ParamSpec, Tool, ToolArguments,
    ToolOutcome, ToolSchema, User, UserRole,
};

use crate::common::{limit_arg, require_u64, MAX_LIST_LIMIT};

const SYSTEM_PROMPT: &str = r#"# Security Audit

You review the site's user accounts and keep role assignments tight.

## What you can do

- List users, optionally filtered by role
- Inspect a single account
- Change a user's role
- Run an account audit that flags risky configurations

## Guidelines

- Follow least privilege: suggest the lowest role that covers what the
  person actually does
- Never change a role without explicit confirmation
- Treat every extra administrator as something to question
- Report audit findings plainly and propose one concrete next step each
"#;

const ROLE_NAMES: [&str; 5] = ["administrator", "editor", "author", "contributor", "subscriber"];

/// More administrators than this is flagged by the audit
pub const MAX_ADMINISTRATORS: usize = 3;

/// Outcome of an account audit
#[derive(Debug, Clone, Serialize)]
pub struct AccountAudit {
    pub total: usize,
    pub role_counts: Vec<RoleCount>,
    pub administrators: Vec<String>,
    pub findings: Vec<String>,
}

/// How many accounts hold one role
#[derive(Debug, Clone, Serialize)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: usize,
}

/// Audit a user listing for risky account configurations
pub fn audit_accounts(users: &[User]) -> AccountAudit {
    let role_counts = UserRole::ALL
        .iter()
        .map(|&role| RoleCount {
            role,
            count: users.iter().filter(|u| u.role == role).count(),
        })
        .collect();
    let administrators: Vec<String> = users
        .iter()
        .filter(|u| u.role == UserRole::Administrator)
        .map(|u| u.username.clone())
        .collect();

    let mut findings = Vec::new();
    if administrators.is_empty() {
        findings.push("No administrator account exists".to_string());
    } else if administrators.len() > MAX_ADMINISTRATORS {
        findings.push(format!(
            "High number of administrator accounts: {}",
            administrators.len()
        ));
    }
    if users.iter().any(|u| u.username == "admin") {
        findings.push("Default username in use: admin".to_string());
    }

    AccountAudit {
        total: users.len(),
        role_counts,
        administrators,
        findings,
    }
}

/// Builtin agent gated on `manage_users`
pub struct SecurityAuditorAgent;

#[async_trait]
impl Agent for SecurityAuditorAgent {
    fn id(&self) -> &str {
        "security-auditor"
    }

    fn name(&self) -> &str {
        "Security Auditor"
    }

    fn description(&self) -> &str {
        "Reviews user accounts and role assignments"
    }

    fn icon(&self) -> &str {
        "shield"
    }

    fn category(&self) -> &str {
        "security"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::manage_users()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some(
            "I keep an eye on user accounts and their roles. Want me to run an audit?"
                .to_string(),
        )
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "Run an account audit".to_string(),
            "List all administrators".to_string(),
            "Demote inactive authors to subscriber".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ListUsersTool),
            Arc::new(GetUserTool),
            Arc::new(UpdateUserRoleTool),
            Arc::new(AuditUsersTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.users.is_some() {
            Ok(())
        } else {
            Err("The users backend is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct ListUsersTool;

#[async_trait]
impl Tool for ListUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_users", "List user accounts, ordered by id")
            .param(
                ParamSpec::optional("role", ParamKind::String, "Filter by role")
                    .one_of(ROLE_NAMES),
            )
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Maximum number of users")
                    .default_value(json!(20)),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.users.as_ref() else {
            return ToolOutcome::failure("The users backend is not active");
        };
        let role = match args.str("role").map(str::parse::<UserRole>) {
            None => None,
            Some(Ok(role)) => Some(role),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        match store.list_users(role, limit_arg(&args, 20)).await {
            Ok(users) => {
                let count = users.len();
                ToolOutcome::success(json!({ "users": users, "count": count }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct GetUserTool;

#[async_trait]
impl Tool for GetUserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("get_user", "Fetch a single user account").param(ParamSpec::required(
            "user_id",
            ParamKind::Integer,
            "Id of the user",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.users.as_ref() else {
            return ToolOutcome::failure("The users backend is not active");
        };
        let id = match require_u64(&args, "user_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };

        match store.get_user(id).await {
            Ok(Some(user)) => ToolOutcome::success(json!({ "user": user })),
            Ok(None) => ToolOutcome::failure(format!("User not found: {id}")),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct UpdateUserRoleTool;

#[async_trait]
impl Tool for UpdateUserRoleTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("update_user_role", "Change a user's role")
            .param(ParamSpec::required(
                "user_id",
                ParamKind::Integer,
                "Id of the user",
            ))
            .param(
                ParamSpec::required("role", ParamKind::String, "New role to assign")
                    .one_of(ROLE_NAMES),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.users.as_ref() else {
            return ToolOutcome::failure("The users backend is not active");
        };
        let id = match require_u64(&args, "user_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };
        let role = match args.str("role").map(str::parse::<UserRole>) {
            Some(Ok(role)) => role,
            Some(Err(message)) => return ToolOutcome::failure(message),
            None => return ToolOutcome::failure("Missing required parameter: role"),
        };

        match store.set_user_role(id, role).await {
            Ok(user) => ToolOutcome::success(json!({ "user": user })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct AuditUsersTool;

#[async_trait]
impl Tool for AuditUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "audit_users",
            "Audit all user accounts for risky configurations",
        )
    }

    async fn execute(&self, _args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.users.as_ref() else {
            return ToolOutcome::failure("The users backend is not active");
        };

        let users = match store.list_users(None, MAX_LIST_LIMIT).await {
            Ok(users) => users,
            Err(e) => return ToolOutcome::host_error(e),
        };

        ToolOutcome::success(json!({ "audit": audit_accounts(&users) }))
    }
}
