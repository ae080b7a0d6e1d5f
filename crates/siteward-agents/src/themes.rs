// Theme management agent
//
// Design decisions:
// - Archive downloads are bounded twice: a 30 second overall deadline and a
//   20 MiB size cap, both enforced while streaming the body
// - Hitting either bound fails the install; partial archives are never handed
//   to the store
// - The ZIP signature is checked before the store sees the bytes
// - Slug and display name fall back to the archive filename when omitted

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use siteward_core::{
    slugify, Agent, Capability, CapabilitySet, HostContext, ParamKind, ParamSpec, Tool,
    ToolArguments, ToolOutcome, ToolSchema,
};

/// Timeout for connection establishment
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall deadline for one archive download
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted theme archive
pub const MAX_ARCHIVE_BYTES: usize = 20 * 1024 * 1024;

const SYSTEM_PROMPT: &str = r#"# Theme Management

You manage the site's installed themes.

## What you can do

- List installed themes and show which one is active
- Switch the active theme
- Install a theme from an archive URL
- Remove an installed theme

## Guidelines

- Confirm before switching or removing; both change the live site
- The active theme cannot be removed; switch away from it first
- Install only from URLs the user explicitly provided
- After an install, list the themes so the user sees the result
"#;

// ============================================================================
// Archive download
// ============================================================================

/// Streaming downloader for theme archives with a deadline and a size cap
#[derive(Debug, Clone)]
pub struct ThemeFetcher {
    timeout: Duration,
    max_bytes: usize,
}

impl ThemeFetcher {
    pub fn new() -> Self {
        Self {
            timeout: DOWNLOAD_TIMEOUT,
            max_bytes: MAX_ARCHIVE_BYTES,
        }
    }

    /// Override the overall download deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the archive size cap
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download an archive, failing on any exceeded bound.
    ///
    /// The deadline covers the whole transfer; each chunk wait is clamped to
    /// the time left so a stalled stream cannot hang past it.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("Invalid URL: must start with http:// or https://".to_string());
        }

        let client = match reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Failed to create HTTP client: {}", e);
                return Err("Failed to create HTTP client".to_string());
            }
        };

        let deadline = Instant::now() + self.timeout;

        let response = match tokio::time::timeout(self.timeout, client.get(url).send()).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                tracing::error!("Theme download failed for {}: {}", url, e);
                return Err(if e.is_timeout() {
                    "Theme download timed out".to_string()
                } else if e.is_connect() {
                    "Failed to connect to server".to_string()
                } else {
                    format!("Download failed: {}", e)
                });
            }
            Err(_) => return Err("Theme download timed out".to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Download failed: HTTP {}", status.as_u16()));
        }

        // Reject oversized archives before streaming when the server says so
        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(format!(
                    "Theme archive too large: {} bytes (limit {} bytes)",
                    length, self.max_bytes
                ));
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err("Theme download timed out".to_string());
            }
            let chunk = match tokio::time::timeout(remaining, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    tracing::error!("Error reading theme archive chunk: {}", e);
                    return Err("Download failed while reading the response".to_string());
                }
                Ok(None) => break,
                Err(_) => return Err("Theme download timed out".to_string()),
            };
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(format!(
                    "Theme archive too large: {} bytes (limit {} bytes)",
                    bytes.len() + chunk.len(),
                    self.max_bytes
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

impl Default for ThemeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// ZIP local-file-header and empty-archive signatures
const ZIP_SIGNATURES: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

fn is_zip_archive(bytes: &[u8]) -> bool {
    ZIP_SIGNATURES.iter().any(|sig| bytes.starts_with(&sig[..]))
}

/// Derive a theme slug from the archive filename in the URL
fn slug_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let stem = last.strip_suffix(".zip").unwrap_or(last);
    let slug = slugify(stem);
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Turn a slug into a presentable display name
fn name_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Agent
// ============================================================================

/// Builtin agent gated on `manage_themes`
pub struct ThemeManagerAgent {
    fetcher: ThemeFetcher,
}

impl ThemeManagerAgent {
    pub fn new() -> Self {
        Self {
            fetcher: ThemeFetcher::new(),
        }
    }

    /// Swap in a fetcher with different bounds
    pub fn with_fetcher(mut self, fetcher: ThemeFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }
}

impl Default for ThemeManagerAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ThemeManagerAgent {
    fn id(&self) -> &str {
        "theme-manager"
    }

    fn name(&self) -> &str {
        "Theme Manager"
    }

    fn description(&self) -> &str {
        "Installs, activates, and removes themes"
    }

    fn icon(&self) -> &str {
        "palette"
    }

    fn category(&self) -> &str {
        "appearance"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::manage_themes()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some("I manage your themes. Want to see what's installed?".to_string())
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "List installed themes".to_string(),
            "Which theme is active?".to_string(),
            "Install a theme from a URL".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ListThemesTool),
            Arc::new(ActiveThemeTool),
            Arc::new(SwitchThemeTool),
            Arc::new(InstallThemeTool {
                fetcher: self.fetcher.clone(),
            }),
            Arc::new(RemoveThemeTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.themes.is_some() {
            Ok(())
        } else {
            Err("The themes backend is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct ListThemesTool;

#[async_trait]
impl Tool for ListThemesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_themes", "List installed themes")
    }

    async fn execute(&self, _args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.themes.as_ref() else {
            return ToolOutcome::failure("The themes backend is not active");
        };

        match store.list_themes().await {
            Ok(themes) => {
                let count = themes.len();
                ToolOutcome::success(json!({ "themes": themes, "count": count }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct ActiveThemeTool;

#[async_trait]
impl Tool for ActiveThemeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("active_theme", "Show the currently active theme")
    }

    async fn execute(&self, _args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.themes.as_ref() else {
            return ToolOutcome::failure("The themes backend is not active");
        };

        match store.active_theme().await {
            Ok(theme) => ToolOutcome::success(json!({ "theme": theme })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct SwitchThemeTool;

#[async_trait]
impl Tool for SwitchThemeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("switch_theme", "Activate an installed theme").param(ParamSpec::required(
            "slug",
            ParamKind::String,
            "Slug of the theme to activate",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.themes.as_ref() else {
            return ToolOutcome::failure("The themes backend is not active");
        };
        let Some(slug) = args.str("slug") else {
            return ToolOutcome::failure("Missing required parameter: slug");
        };

        match store.switch_theme(slug).await {
            Ok(theme) => ToolOutcome::success(json!({ "theme": theme })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct InstallThemeTool {
    fetcher: ThemeFetcher,
}

#[async_trait]
impl Tool for InstallThemeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("install_theme", "Download a theme archive and install it")
            .param(ParamSpec::required(
                "url",
                ParamKind::String,
                "HTTP or HTTPS URL of the theme archive (ZIP)",
            ))
            .param(ParamSpec::optional(
                "slug",
                ParamKind::String,
                "Slug to install under; derived from the archive filename when omitted",
            ))
            .param(ParamSpec::optional(
                "name",
                ParamKind::String,
                "Display name; derived from the slug when omitted",
            ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.themes.as_ref() else {
            return ToolOutcome::failure("The themes backend is not active");
        };
        let Some(url) = args.str("url") else {
            return ToolOutcome::failure("Missing required parameter: url");
        };

        let slug = match args.str("slug").map(slugify) {
            Some(slug) if !slug.is_empty() => slug,
            Some(_) => return ToolOutcome::failure("Invalid slug"),
            None => match slug_from_url(url) {
                Some(slug) => slug,
                None => {
                    return ToolOutcome::failure(
                        "Provide a slug: none could be derived from the URL",
                    )
                }
            },
        };
        let name = match args.str("name") {
            Some(name) => name.to_string(),
            None => name_from_slug(&slug),
        };

        let archive = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(message) => return ToolOutcome::failure(message),
        };
        if !is_zip_archive(&archive) {
            return ToolOutcome::failure("The download is not a valid theme archive (ZIP)");
        }

        match store.install_theme(&slug, &name, &archive).await {
            Ok(theme) => ToolOutcome::success(json!({ "theme": theme })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct RemoveThemeTool;

#[async_trait]
impl Tool for RemoveThemeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("remove_theme", "Remove an installed theme").param(ParamSpec::required(
            "slug",
            ParamKind::String,
            "Slug of the theme to remove",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.themes.as_ref() else {
            return ToolOutcome::failure("The themes backend is not active");
        };
        let Some(slug) = args.str("slug") else {
            return ToolOutcome::failure("Missing required parameter: slug");
        };

        match store.remove_theme(slug).await {
            Ok(()) => ToolOutcome::success(json!({ "removed": slug })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}
