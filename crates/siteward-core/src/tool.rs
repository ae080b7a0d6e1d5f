// Tool contract
//
// Design decisions:
// - A tool owns its schema: wire definitions and argument validation are
//   derived from the same value, so they cannot drift apart
// - `execute` receives a pre-validated `ToolArguments` view; handlers never
//   see raw JSON and never re-check requiredness themselves
// - Outcomes are values (`ToolOutcome`), not `Err` returns; the dispatch
//   boundary decides what the model is allowed to see

use async_trait::async_trait;

use crate::context::HostContext;
use crate::outcome::ToolOutcome;
use crate::schema::{ToolArguments, ToolSchema};

/// A single dispatchable tool: one schema plus one async handler.
///
/// Implementations are registered once and shared behind `Arc<dyn Tool>`;
/// they hold no per-call state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's schema. Read once at registration; must be stable.
    fn schema(&self) -> ToolSchema;

    /// Run the tool against validated arguments.
    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamKind, ParamSpec};
    use serde_json::json;

    struct UpcaseTool;

    #[async_trait]
    impl Tool for UpcaseTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("upcase", "Uppercase a string")
                .param(ParamSpec::required("text", ParamKind::String, "Input text"))
        }

        async fn execute(&self, args: ToolArguments, _host: &HostContext) -> ToolOutcome {
            match args.str("text") {
                Some(text) => ToolOutcome::success(json!({ "text": text.to_uppercase() })),
                None => ToolOutcome::failure("Missing required parameter: text"),
            }
        }
    }

    #[tokio::test]
    async fn test_tool_executes_against_validated_args() {
        let tool = UpcaseTool;
        let host = HostContext::new();
        let args = tool.schema().check_args(&json!({ "text": "abc" })).unwrap();

        let outcome = tool.execute(args, &host).await;
        assert!(
            matches!(&outcome, ToolOutcome::Success(v) if v == &json!({ "text": "ABC" })),
            "unexpected outcome: {outcome:?}"
        );
    }
}
