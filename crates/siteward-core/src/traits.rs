// Host backend traits
//
// Design decisions:
// - Each host surface (content, comments, themes, users, catalog) is its own
//   trait so embedding hosts can wire only what they have
// - All methods are async and return HostResult; absence is Option, not error
// - Traits stay flat CRUD - policy (capability gating, preconditions) lives in
//   the registry and agents, never in the backend

use async_trait::async_trait;

use crate::entities::{
    Comment, CommentStatus, NewPost, NewProduct, Post, PostPatch, PostStatus, Product,
    ProductPatch, ProductStatus, Theme, User, UserRole,
};
use crate::error::HostResult;

/// Post storage surface of the host
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a post and return it with its assigned id
    async fn create_post(&self, new: NewPost) -> HostResult<Post>;

    /// Apply a partial update; errors with `NotFound` if the id is unknown
    async fn update_post(&self, id: u64, patch: PostPatch) -> HostResult<Post>;

    /// Fetch one post; `None` if the id is unknown
    async fn get_post(&self, id: u64) -> HostResult<Option<Post>>;

    /// List posts, optionally filtered by status, newest first
    async fn list_posts(&self, status: Option<PostStatus>, limit: usize) -> HostResult<Vec<Post>>;

    /// Delete a post; returns whether anything was removed
    async fn delete_post(&self, id: u64) -> HostResult<bool>;
}

/// Comment storage surface of the host
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// List comments, optionally filtered by status and/or post, newest first
    async fn list_comments(
        &self,
        status: Option<CommentStatus>,
        post_id: Option<u64>,
        limit: usize,
    ) -> HostResult<Vec<Comment>>;

    /// Fetch one comment; `None` if the id is unknown
    async fn get_comment(&self, id: u64) -> HostResult<Option<Comment>>;

    /// Move a comment to a moderation status; errors with `NotFound` if unknown
    async fn set_comment_status(&self, id: u64, status: CommentStatus) -> HostResult<Comment>;

    /// Delete a comment; returns whether anything was removed
    async fn delete_comment(&self, id: u64) -> HostResult<bool>;
}

/// Theme management surface of the host
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// All installed themes
    async fn list_themes(&self) -> HostResult<Vec<Theme>>;

    /// Fetch one theme by slug; `None` if not installed
    async fn get_theme(&self, slug: &str) -> HostResult<Option<Theme>>;

    /// The currently active theme, if any
    async fn active_theme(&self) -> HostResult<Option<Theme>>;

    /// Activate an installed theme; errors with `NotFound` if not installed
    async fn switch_theme(&self, slug: &str) -> HostResult<Theme>;

    /// Install a theme from an archive already validated by the caller.
    ///
    /// Errors with `Invalid` if the slug is already taken.
    async fn install_theme(&self, slug: &str, name: &str, archive: &[u8]) -> HostResult<Theme>;

    /// Remove an installed theme.
    ///
    /// Removing the active theme is invalid; errors with `NotFound` if the
    /// slug is unknown.
    async fn remove_theme(&self, slug: &str) -> HostResult<()>;
}

/// User account surface of the host
#[async_trait]
pub trait UserStore: Send + Sync {
    /// List users, optionally filtered by role, ordered by id
    async fn list_users(&self, role: Option<UserRole>, limit: usize) -> HostResult<Vec<User>>;

    /// Fetch one user; `None` if the id is unknown
    async fn get_user(&self, id: u64) -> HostResult<Option<User>>;

    /// Change a user's role; errors with `NotFound` if the id is unknown
    async fn set_user_role(&self, id: u64, role: UserRole) -> HostResult<User>;
}

/// Commerce catalog surface of the host
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List products, optionally filtered by status, ordered by id
    async fn list_products(
        &self,
        status: Option<ProductStatus>,
        limit: usize,
    ) -> HostResult<Vec<Product>>;

    /// Fetch one product; `None` if the id is unknown
    async fn get_product(&self, id: u64) -> HostResult<Option<Product>>;

    /// Create a product and return it with its assigned id
    async fn create_product(&self, new: NewProduct) -> HostResult<Product>;

    /// Apply a partial update; errors with `NotFound` if the id is unknown
    async fn update_product(&self, id: u64, patch: ProductPatch) -> HostResult<Product>;
}
