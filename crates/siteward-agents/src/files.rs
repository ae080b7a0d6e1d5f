// File management agent
//
// Design decisions:
// - Every tool goes through the host's FileSandbox; no path from the model
//   touches the filesystem directly
// - Traversal and escape attempts surface as in-band invalid-path failures
// - Binary content crosses the boundary base64-encoded

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use siteward_core::{
    Agent, Capability, CapabilitySet, FileEncoding, HostContext, ParamKind, ParamSpec, Tool,
    ToolArguments, ToolOutcome, ToolSchema,
};

const SYSTEM_PROMPT: &str = r#"# File Management

You work with files inside the site's dedicated workspace directory.

## What you can do

- Read files (text, or base64 when binary)
- Write files, creating parent directories as needed
- List directories
- Delete files and directories

## Guidelines

- Paths are rooted at the workspace: /notes/todo.txt and notes/todo.txt
  name the same file
- Nothing outside the workspace is reachable
- Read a file before overwriting it
- Confirm before any delete, and be doubly sure before a recursive one
"#;

/// Builtin agent gated on `manage_files`
pub struct FileManagerAgent;

#[async_trait]
impl Agent for FileManagerAgent {
    fn id(&self) -> &str {
        "file-manager"
    }

    fn name(&self) -> &str {
        "File Manager"
    }

    fn description(&self) -> &str {
        "Reads, writes, and organizes workspace files"
    }

    fn icon(&self) -> &str {
        "folder"
    }

    fn category(&self) -> &str {
        "files"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::manage_files()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some("I can read, write, and organize the files in your workspace.".to_string())
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "List the workspace files".to_string(),
            "Show me notes.txt".to_string(),
            "Save this as drafts/outline.md".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ReadFileTool),
            Arc::new(WriteFileTool),
            Arc::new(ListFilesTool),
            Arc::new(DeleteFileTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.files.is_some() {
            Ok(())
        } else {
            Err("The file sandbox is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("read_file", "Read a file from the workspace").param(ParamSpec::required(
            "path",
            ParamKind::String,
            "Path of the file, rooted at the workspace",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(sandbox) = host.files.as_ref() else {
            return ToolOutcome::failure("The file sandbox is not active");
        };
        let Some(path) = args.str("path") else {
            return ToolOutcome::failure("Missing required parameter: path");
        };

        match sandbox.read_file(path).await {
            Ok(file) => ToolOutcome::success(json!({ "file": file })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("write_file", "Write a file into the workspace")
            .param(ParamSpec::required(
                "path",
                ParamKind::String,
                "Path of the file, rooted at the workspace",
            ))
            .param(ParamSpec::required(
                "content",
                ParamKind::String,
                "Content to write; base64 when encoding is base64",
            ))
            .param(
                ParamSpec::optional("encoding", ParamKind::String, "How content is encoded")
                    .one_of(["text", "base64"])
                    .default_value(json!("text")),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(sandbox) = host.files.as_ref() else {
            return ToolOutcome::failure("The file sandbox is not active");
        };
        let Some(path) = args.str("path") else {
            return ToolOutcome::failure("Missing required parameter: path");
        };
        let Some(content) = args.str("content") else {
            return ToolOutcome::failure("Missing required parameter: content");
        };
        let encoding = match args.str("encoding").map(str::parse::<FileEncoding>) {
            None => FileEncoding::Text,
            Some(Ok(encoding)) => encoding,
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        match sandbox.write_file(path, content, encoding).await {
            Ok(stat) => ToolOutcome::success(json!({ "file": stat })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_files", "List a workspace directory").param(
            ParamSpec::optional(
                "path",
                ParamKind::String,
                "Directory to list; defaults to the workspace root",
            )
            .default_value(json!("/")),
        )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(sandbox) = host.files.as_ref() else {
            return ToolOutcome::failure("The file sandbox is not active");
        };
        let path = args.str("path").unwrap_or("/");

        match sandbox.list_dir(path).await {
            Ok(entries) => {
                let count = entries.len();
                ToolOutcome::success(json!({
                    "path": path,
                    "entries": entries,
                    "count": count,
                }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct DeleteFileTool;

#[async_trait]
impl Tool for DeleteFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("delete_file", "Delete a workspace file or directory")
            .param(ParamSpec::required(
                "path",
                ParamKind::String,
                "Path to delete, rooted at the workspace",
            ))
            .param(
                ParamSpec::optional(
                    "recursive",
                    ParamKind::Boolean,
                    "Delete a directory together with its contents",
                )
                .default_value(json!(false)),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(sandbox) = host.files.as_ref() else {
            return ToolOutcome::failure("The file sandbox is not active");
        };
        let Some(path) = args.str("path") else {
            return ToolOutcome::failure("Missing required parameter: path");
        };
        let recursive = args.bool("recursive").unwrap_or(false);

        match sandbox.delete(path, recursive).await {
            Ok(()) => ToolOutcome::success(json!({ "deleted": path })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteward_core::FileSandbox;
    use tempfile::TempDir;

    fn host() -> (HostContext, TempDir) {
        let dir = TempDir::new().unwrap();
        let sandbox = FileSandbox::new(dir.path()).unwrap();
        let host = HostContext::new().with_files(Arc::new(sandbox));
        (host, dir)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (host, _dir) = host();

        let write = WriteFileTool;
        let args = write
            .schema()
            .check_args(&json!({ "path": "notes/todo.txt", "content": "ship it" }))
            .unwrap();
        let outcome = write.execute(args, &host).await;
        assert!(outcome.is_success());

        let read = ReadFileTool;
        let args = read
            .schema()
            .check_args(&json!({ "path": "/notes/todo.txt" }))
            .unwrap();
        let outcome = read.execute(args, &host).await;
        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["file"]["content"], "ship it");
        assert_eq!(payload["file"]["encoding"], "text");
        assert_eq!(payload["file"]["path"], "/notes/todo.txt");
    }

    #[tokio::test]
    async fn test_traversal_is_an_in_band_failure() {
        let (host, _dir) = host();
        let read = ReadFileTool;
        let args = read
            .schema()
            .check_args(&json!({ "path": "../secret.txt" }))
            .unwrap();
        let outcome = read.execute(args, &host).await;
        assert!(matches!(
            &outcome,
            ToolOutcome::Failure(msg) if msg == "Invalid path: ../secret.txt"
        ));
    }

    #[tokio::test]
    async fn test_invalid_base64_is_an_in_band_failure() {
        let (host, _dir) = host();
        let write = WriteFileTool;
        let args = write
            .schema()
            .check_args(&json!({
                "path": "logo.png",
                "content": "not base64 at all!!!",
                "encoding": "base64",
            }))
            .unwrap();
        let outcome = write.execute(args, &host).await;
        assert!(matches!(
            &outcome,
            ToolOutcome::Failure(msg) if msg == "Invalid base64 content"
        ));
    }

    #[tokio::test]
    async fn test_list_defaults_to_the_workspace_root() {
        let (host, _dir) = host();
        let write = WriteFileTool;
        let args = write
            .schema()
            .check_args(&json!({ "path": "a.txt", "content": "a" }))
            .unwrap();
        write.execute(args, &host).await;

        let list = ListFilesTool;
        let args = list.schema().check_args(&json!({})).unwrap();
        let outcome = list.execute(args, &host).await;
        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["path"], "/");
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["entries"][0]["name"], "a.txt");
    }

    #[tokio::test]
    async fn test_delete_directory_requires_recursive() {
        let (host, _dir) = host();
        let write = WriteFileTool;
        let args = write
            .schema()
            .check_args(&json!({ "path": "dir/inner.txt", "content": "x" }))
            .unwrap();
        write.execute(args, &host).await;

        let delete = DeleteFileTool;
        let args = delete.schema().check_args(&json!({ "path": "dir" })).unwrap();
        let outcome = delete.execute(args, &host).await;
        assert!(matches!(
            &outcome,
            ToolOutcome::Failure(msg)
                if msg == "Directory not empty: /dir (pass recursive to delete it)"
        ));

        let args = delete
            .schema()
            .check_args(&json!({ "path": "dir", "recursive": true }))
            .unwrap();
        let outcome = delete.execute(args, &host).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_in_band() {
        let (host, _dir) = host();
        let read = ReadFileTool;
        let args = read
            .schema()
            .check_args(&json!({ "path": "nope.txt" }))
            .unwrap();
        let outcome = read.execute(args, &host).await;
        assert!(matches!(
            &outcome,
            ToolOutcome::Failure(msg) if msg == "File not found: /nope.txt"
        ));
    }
}
