// Per-dispatch host context
//
// Carries the request id for log correlation plus optional handles to each
// host backend. A missing handle means the host feature is not active; the
// owning agent reports that as a uniform in-band precondition failure.

use std::sync::Arc;

use uuid::Uuid;

use crate::sandbox::FileSandbox;
use crate::traits::{CatalogStore, CommentStore, ContentStore, ThemeStore, UserStore};

/// Runtime context passed to every tool execution.
///
/// Construction assigns a fresh UUID v7 `request_id`; hosts wire backends
/// with the fluent `with_*` methods. The context is cheap to clone - all
/// backends are behind `Arc`.
#[derive(Clone)]
pub struct HostContext {
    /// Correlation id for this dispatch, present in all related log events
    pub request_id: Uuid,
    /// Post storage, if the host exposes content editing
    pub content: Option<Arc<dyn ContentStore>>,
    /// Comment storage, if the host exposes moderation
    pub comments: Option<Arc<dyn CommentStore>>,
    /// Theme management, if the host exposes it
    pub themes: Option<Arc<dyn ThemeStore>>,
    /// User accounts, if the host exposes them
    pub users: Option<Arc<dyn UserStore>>,
    /// Commerce catalog, if the commerce feature is active
    pub catalog: Option<Arc<dyn CatalogStore>>,
    /// Sandboxed file access, if the host grants it
    pub files: Option<Arc<FileSandbox>>,
}

impl HostContext {
    /// Create an empty context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            content: None,
            comments: None,
            themes: None,
            users: None,
            catalog: None,
            files: None,
        }
    }

    /// Wire the content backend
    pub fn with_content(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content = Some(store);
        self
    }

    /// Wire the comment backend
    pub fn with_comments(mut self, store: Arc<dyn CommentStore>) -> Self {
        self.comments = Some(store);
        self
    }

    /// Wire the theme backend
    pub fn with_themes(mut self, store: Arc<dyn ThemeStore>) -> Self {
        self.themes = Some(store);
        self
    }

    /// Wire the user backend
    pub fn with_users(mut self, store: Arc<dyn UserStore>) -> Self {
        self.users = Some(store);
        self
    }

    /// Wire the commerce catalog backend
    pub fn with_catalog(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.catalog = Some(store);
        self
    }

    /// Wire the file sandbox
    pub fn with_files(mut self, sandbox: Arc<FileSandbox>) -> Self {
        self.files = Some(sandbox);
        self
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("request_id", &self.request_id)
            .field("content", &self.content.is_some())
            .field("comments", &self.comments.is_some())
            .field("themes", &self.themes.is_some())
            .field("users", &self.users.is_some())
            .field("catalog", &self.catalog.is_some())
            .field("files", &self.files.is_some())
            .finish()
    }
}
