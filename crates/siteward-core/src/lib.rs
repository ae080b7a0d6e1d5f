// Agent Registry and Tool Dispatch
//
// This crate provides the host-agnostic contract for capability-gated site
// agents: typed tool schemas, agents as trait objects, a dependency-injected
// registry, and the dispatch path that turns a tool call into an in-band
// outcome.
//
// Key design decisions:
// - Tool schemas are typed values; wire definitions and argument validation
//   derive from the same schema, so they cannot drift
// - Agents are registered exactly once; duplicate ids are rejected with an
//   error rather than silently replaced
// - Capability checks recompute on every call; nothing per-caller is cached
// - Handlers return ToolOutcome; the dispatch boundary masks internal errors
//   behind a generic in-band failure and logs the detail via tracing
// - Host backends (content, comments, themes, users, catalog) are traits;
//   in-memory implementations ship for examples and testing
// - The file sandbox canonicalizes and containment-checks every path, so
//   neither traversal nor symlinks can reach outside its root

// Contract types
pub mod capability;
pub mod outcome;
pub mod schema;

// Agents and dispatch
pub mod agent;
pub mod registry;
pub mod tool;

// Host collaborators
pub mod context;
pub mod entities;
pub mod error;
pub mod sandbox;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use agent::{Agent, AgentDescriptor};
pub use capability::{Capability, CapabilitySet};
pub use context::HostContext;
pub use error::{HostError, HostResult, RegistryError};
pub use outcome::{DispatchOutcome, InternalToolError, ToolOutcome};
pub use registry::{AgentRegistry, AgentRegistryBuilder, RegisteredAgent};
pub use schema::{ParamKind, ParamSpec, SchemaError, ToolArguments, ToolSchema};
pub use tool::Tool;

// Host entity re-exports
pub use entities::{
    slugify, Comment, CommentStatus, NewPost, NewProduct, Post, PostPatch, PostStatus, Product,
    ProductPatch, ProductStatus, Theme, User, UserRole,
};
pub use sandbox::{
    DirEntryInfo, FileContent, FileEncoding, FileSandbox, FileStat, DEFAULT_MAX_READ_BYTES,
};
pub use traits::{CatalogStore, CommentStore, ContentStore, ThemeStore, UserStore};

// In-memory backend re-exports
pub use memory::{
    InMemoryCatalogStore, InMemoryCommentStore, InMemoryContentStore, InMemoryThemeStore,
    InMemoryUserStore,
};
