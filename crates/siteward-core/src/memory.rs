// In-memory host backends
//
// Design decisions:
// - State sits behind Arc<tokio::sync::RwLock<..>>; clones share it, so the
//   same store can back several agents and a test at once
// - Ids are dense per-store counters assigned under the write lock, starting
//   at 1
// - `seed` inserts fully-formed entities with their ids and advances the
//   counter past them; `clear` drops entities but never rewinds the counter
// - Semantic checks that belong to the host (slug uniqueness, SKU uniqueness,
//   non-negative prices, active-theme removal) live here and surface as
//   `HostError::Invalid`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::entities::{
    slugify, Comment, CommentStatus, NewPost, NewProduct, Post, PostPatch, PostStatus, Product,
    ProductPatch, ProductStatus, Theme, User, UserRole,
};
use crate::error::{HostError, HostResult};
use crate::traits::{CatalogStore, CommentStore, ContentStore, ThemeStore, UserStore};

// ============================================================================
// Content
// ============================================================================

/// Post storage backed by a shared map
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    posts: Arc<RwLock<HashMap<u64, Post>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert pre-built posts, advancing the id counter past them
    pub async fn seed(&self, posts: impl IntoIterator<Item = Post>) {
        let mut guard = self.posts.write().await;
        for post in posts {
            self.next_id.fetch_max(post.id, Ordering::SeqCst);
            guard.insert(post.id, post);
        }
    }

    /// Drop all posts
    pub async fn clear(&self) {
        self.posts.write().await.clear();
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn create_post(&self, new: NewPost) -> HostResult<Post> {
        if new.title.trim().is_empty() {
            return Err(HostError::invalid("Title must not be empty"));
        }
        let mut posts = self.posts.write().await;
        let id = self.alloc_id();

        let base = match new.slug.as_deref() {
            Some(s) if !slugify(s).is_empty() => slugify(s),
            _ => slugify(&new.title),
        };
        let base = if base.is_empty() {
            format!("post-{id}")
        } else {
            base
        };
        let mut slug = base.clone();
        let mut n = 2;
        while posts.values().any(|p| p.slug == slug) {
            slug = format!("{base}-{n}");
            n += 1;
        }

        let now = Utc::now();
        let post = Post {
            id,
            title: new.title,
            content: new.content,
            slug,
            excerpt: new.excerpt,
            meta_description: new.meta_description,
            status: new.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: u64, patch: PostPatch) -> HostResult<Post> {
        if patch.is_empty() {
            return Err(HostError::invalid("No fields to update"));
        }
        let mut posts = self.posts.write().await;
        let post = posts
            .get_mut(&id)
            .ok_or_else(|| HostError::not_found(format!("Post not found: {id}")))?;

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(slug) = patch.slug {
            post.slug = slugify(&slug);
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(meta) = patch.meta_description {
            post.meta_description = Some(meta);
        }
        if let Some(status) = patch.status {
            post.status = status;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn get_post(&self, id: u64) -> HostResult<Option<Post>> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list_posts(&self, status: Option<PostStatus>, limit: usize) -> HostResult<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut out: Vec<Post> = posts
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.id.cmp(&a.id));
        out.truncate(limit);
        Ok(out)
    }

    async fn delete_post(&self, id: u64) -> HostResult<bool> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }
}

// ============================================================================
// Comments
// ============================================================================

/// Comment storage backed by a shared map.
///
/// Comments arrive from outside the agent surface, so there is no create
/// method on the trait; tests and hosts insert via `seed`.
#[derive(Clone, Default)]
pub struct InMemoryCommentStore {
    comments: Arc<RwLock<HashMap<u64, Comment>>>,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert pre-built comments keyed by their ids
    pub async fn seed(&self, comments: impl IntoIterator<Item = Comment>) {
        let mut guard = self.comments.write().await;
        for comment in comments {
            guard.insert(comment.id, comment);
        }
    }

    /// Drop all comments
    pub async fn clear(&self) {
        self.comments.write().await.clear();
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn list_comments(
        &self,
        status: Option<CommentStatus>,
        post_id: Option<u64>,
        limit: usize,
    ) -> HostResult<Vec<Comment>> {
        let comments = self.comments.read().await;
        let mut out: Vec<Comment> = comments
            .values()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .filter(|c| post_id.is_none_or(|p| c.post_id == p))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.id.cmp(&a.id));
        out.truncate(limit);
        Ok(out)
    }

    async fn get_comment(&self, id: u64) -> HostResult<Option<Comment>> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn set_comment_status(&self, id: u64, status: CommentStatus) -> HostResult<Comment> {
        let mut comments = self.comments.write().await;
        let comment = comments
            .get_mut(&id)
            .ok_or_else(|| HostError::not_found(format!("Comment not found: {id}")))?;
        comment.status = status;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: u64) -> HostResult<bool> {
        Ok(self.comments.write().await.remove(&id).is_some())
    }
}

// ============================================================================
// Themes
// ============================================================================

#[derive(Default)]
struct ThemeState {
    themes: HashMap<String, Theme>,
    archives: HashMap<String, Vec<u8>>,
}

/// Theme storage backed by a shared map; archive bytes are retained so a
/// host could unpack them later
#[derive(Clone, Default)]
pub struct InMemoryThemeStore {
    state: Arc<RwLock<ThemeState>>,
}

impl InMemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert pre-built themes as-is (active flags included)
    pub async fn seed(&self, themes: impl IntoIterator<Item = Theme>) {
        let mut state = self.state.write().await;
        for theme in themes {
            state.themes.insert(theme.slug.clone(), theme);
        }
    }

    /// Drop all themes and stored archives
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.themes.clear();
        state.archives.clear();
    }

    /// Stored archive bytes for a theme, if any
    pub async fn archive(&self, slug: &str) -> Option<Vec<u8>> {
        self.state.read().await.archives.get(slug).cloned()
    }
}

#[async_trait]
impl ThemeStore for InMemoryThemeStore {
    async fn list_themes(&self) -> HostResult<Vec<Theme>> {
        let state = self.state.read().await;
        let mut out: Vec<Theme> = state.themes.values().cloned().collect();
        out.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(out)
    }

    async fn get_theme(&self, slug: &str) -> HostResult<Option<Theme>> {
        Ok(self.state.read().await.themes.get(slug).cloned())
    }

    async fn active_theme(&self) -> HostResult<Option<Theme>> {
        Ok(self
            .state
            .read()
            .await
            .themes
            .values()
            .find(|t| t.active)
            .cloned())
    }

    async fn switch_theme(&self, slug: &str) -> HostResult<Theme> {
        let mut state = self.state.write().await;
        if !state.themes.contains_key(slug) {
            return Err(HostError::not_found(format!("Theme not found: {slug}")));
        }
        for theme in state.themes.values_mut() {
            theme.active = theme.slug == slug;
        }
        Ok(state.themes[slug].clone())
    }

    async fn install_theme(&self, slug: &str, name: &str, archive: &[u8]) -> HostResult<Theme> {
        let mut state = self.state.write().await;
        if state.themes.contains_key(slug) {
            return Err(HostError::invalid(format!(
                "Theme already installed: {slug}"
            )));
        }
        let theme = Theme {
            slug: slug.to_string(),
            name: name.to_string(),
            active: false,
            size_bytes: archive.len() as u64,
            installed_at: Utc::now(),
        };
        state.themes.insert(slug.to_string(), theme.clone());
        state.archives.insert(slug.to_string(), archive.to_vec());
        Ok(theme)
    }

    async fn remove_theme(&self, slug: &str) -> HostResult<()> {
        let mut state = self.state.write().await;
        let Some(theme) = state.themes.get(slug) else {
            return Err(HostError::not_found(format!("Theme not found: {slug}")));
        };
        if theme.active {
            return Err(HostError::invalid(format!(
                "Cannot remove the active theme: {slug}"
            )));
        }
        state.themes.remove(slug);
        state.archives.remove(slug);
        Ok(())
    }
}

// ============================================================================
// Users
// ============================================================================

/// User account storage backed by a shared map; accounts are seeded, never
/// created through the agent surface
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<u64, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert pre-built user accounts
    pub async fn seed(&self, users: impl IntoIterator<Item = User>) {
        let mut guard = self.users.write().await;
        for user in users {
            guard.insert(user.id, user);
        }
    }

    /// Drop all users
    pub async fn clear(&self) {
        self.users.write().await.clear();
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list_users(&self, role: Option<UserRole>, limit: usize) -> HostResult<Vec<User>> {
        let users = self.users.read().await;
        let mut out: Vec<User> = users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        out.sort_by_key(|u| u.id);
        out.truncate(limit);
        Ok(out)
    }

    async fn get_user(&self, id: u64) -> HostResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn set_user_role(&self, id: u64, role: UserRole) -> HostResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| HostError::not_found(format!("User not found: {id}")))?;
        user.role = role;
        Ok(user.clone())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Product catalog storage backed by a shared map
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<u64, Product>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert pre-built products, advancing the id counter past them
    pub async fn seed(&self, products: impl IntoIterator<Item = Product>) {
        let mut guard = self.products.write().await;
        for product in products {
            self.next_id.fetch_max(product.id, Ordering::SeqCst);
            guard.insert(product.id, product);
        }
    }

    /// Drop all products
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_products(
        &self,
        status: Option<ProductStatus>,
        limit: usize,
    ) -> HostResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut out: Vec<Product> = products
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        out.sort_by_key(|p| p.id);
        out.truncate(limit);
        Ok(out)
    }

    async fn get_product(&self, id: u64) -> HostResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn create_product(&self, new: NewProduct) -> HostResult<Product> {
        if new.name.trim().is_empty() {
            return Err(HostError::invalid("Product name must not be empty"));
        }
        if new.price_cents < 0 {
            return Err(HostError::invalid("Price must be non-negative"));
        }
        if new.stock_quantity < 0 {
            return Err(HostError::invalid("Stock quantity must be non-negative"));
        }
        let mut products = self.products.write().await;
        if let Some(sku) = new.sku.as_deref() {
            if products.values().any(|p| p.sku == sku) {
                return Err(HostError::invalid(format!("SKU already in use: {sku}")));
            }
        }
        let id = self.alloc_id();
        let now = Utc::now();
        let product = Product {
            id,
            name: new.name,
            description: new.description,
            sku: new.sku.unwrap_or_else(|| format!("sku-{id}")),
            price_cents: new.price_cents,
            stock_quantity: new.stock_quantity,
            status: new.status.unwrap_or(ProductStatus::Draft),
            created_at: now,
            updated_at: now,
        };
        products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: u64, patch: ProductPatch) -> HostResult<Product> {
        if patch.is_empty() {
            return Err(HostError::invalid("No fields to update"));
        }
        if patch.price_cents.is_some_and(|p| p < 0) {
            return Err(HostError::invalid("Price must be non-negative"));
        }
        if patch.stock_quantity.is_some_and(|q| q < 0) {
            return Err(HostError::invalid("Stock quantity must be non-negative"));
        }
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| HostError::not_found(format!("Product not found: {id}")))?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price_cents) = patch.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(status) = patch.status {
            product.status = status;
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}
