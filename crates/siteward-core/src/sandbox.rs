// Sandboxed file access rooted at a single directory
//
// Design decisions:
// - Paths are normalized lexically first: both separator styles are split,
//   empty and `.` segments dropped, `..` and drive-prefixed segments rejected
//   before the filesystem is touched
// - The normalized path is then joined to the root and the deepest existing
//   ancestor is canonicalized; the result must still live under the root, so
//   symlinks cannot escape either
// - Paths are presented sandbox-absolute ('/' is the root), matching how the
//   tools describe them to the model
// - Writes go through a temp file in the target directory and a rename; the
//   temp file is removed on every failure path
// - Violations are `HostError::Invalid` so tools surface them in-band

use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HostError, HostResult};

/// Default cap on file reads (1 MiB); larger files are refused in-band
pub const DEFAULT_MAX_READ_BYTES: u64 = 1024 * 1024;

/// How file content crosses the tool boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEncoding {
    /// UTF-8 text, passed through verbatim
    Text,
    /// Binary content, base64-encoded
    Base64,
}

impl std::fmt::Display for FileEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileEncoding::Text => write!(f, "text"),
            FileEncoding::Base64 => write!(f, "base64"),
        }
    }
}

impl std::str::FromStr for FileEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FileEncoding::Text),
            "base64" => Ok(FileEncoding::Base64),
            other => Err(format!("Unknown encoding: {}", other)),
        }
    }
}

/// Content of a read file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    /// Sandbox-absolute path
    pub path: String,
    /// Text content, or base64 when the file is not valid UTF-8
    pub content: String,
    pub encoding: FileEncoding,
    pub size_bytes: u64,
}

/// Metadata of a file or directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStat {
    /// Sandbox-absolute path
    pub path: String,
    pub is_directory: bool,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// One entry of a directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntryInfo {
    pub name: String,
    /// Sandbox-absolute path
    pub path: String,
    pub is_directory: bool,
    pub size_bytes: u64,
}

/// File access confined to one base directory.
///
/// Every operation takes a sandbox-absolute or relative path string from the
/// model, normalizes it, and verifies the resolved location stays under the
/// base even through symlinks. The sandbox never follows a path outside its
/// root; attempts come back as in-band `Invalid` errors.
#[derive(Debug)]
pub struct FileSandbox {
    root: PathBuf,
    max_read_bytes: u64,
}

impl FileSandbox {
    /// Create a sandbox rooted at `root`, creating the directory if needed.
    ///
    /// The root is canonicalized once here so later containment checks
    /// compare canonical paths on both sides.
    pub fn new(root: impl AsRef<Path>) -> HostResult<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = dunce::canonicalize(root.as_ref())?;
        Ok(Self {
            root,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        })
    }

    /// Override the read size cap
    pub fn with_max_read_bytes(mut self, max: u64) -> Self {
        self.max_read_bytes = max;
        self
    }

    /// The canonicalized base directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file, size-capped.
    ///
    /// UTF-8 content comes back as text; anything else is base64-encoded and
    /// flagged via `encoding`.
    pub async fn read_file(&self, path: &str) -> HostResult<FileContent> {
        let rel = self.normalize(path)?;
        if rel.as_os_str().is_empty() {
            return Err(HostError::invalid(
                "Path '/' is a directory, not a file".to_string(),
            ));
        }
        let full = self.confine(&rel)?;

        let meta = match tokio::fs::metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HostError::not_found(format!(
                    "File not found: {}",
                    rel_display(&rel)
                )))
            }
            Err(e) => return Err(HostError::Io(e)),
        };
        if meta.is_dir() {
            return Err(HostError::invalid(format!(
                "Path '{}' is a directory, not a file. Use list_files instead.",
                rel_display(&rel)
            )));
        }
        if meta.len() > self.max_read_bytes {
            return Err(HostError::invalid(format!(
                "File too large: {} bytes (limit {} bytes)",
                meta.len(),
                self.max_read_bytes
            )));
        }

        let bytes = tokio::fs::read(&full).await?;
        let size_bytes = bytes.len() as u64;
        let (content, encoding) = match String::from_utf8(bytes) {
            Ok(text) => (text, FileEncoding::Text),
            Err(e) => (BASE64.encode(e.into_bytes()), FileEncoding::Base64),
        };

        Ok(FileContent {
            path: rel_display(&rel),
            content,
            encoding,
            size_bytes,
        })
    }

    /// Create or replace a file, creating parent directories as needed.
    ///
    /// The content lands via a temp file plus rename; on any failure the temp
    /// file is removed and the previous file content is untouched.
    pub async fn write_file(
        &self,
        path: &str,
        content: &str,
        encoding: FileEncoding,
    ) -> HostResult<FileStat> {
        let rel = self.normalize(path)?;
        if rel.as_os_str().is_empty() {
            return Err(HostError::invalid(
                "Path '/' is a directory, not a file".to_string(),
            ));
        }
        let bytes = match encoding {
            FileEncoding::Text => content.as_bytes().to_vec(),
            FileEncoding::Base64 => BASE64
                .decode(content)
                .map_err(|_| HostError::invalid("Invalid base64 content"))?,
        };
        let full = self.confine(&rel)?;

        if let Ok(meta) = tokio::fs::metadata(&full).await {
            if meta.is_dir() {
                return Err(HostError::invalid(format!(
                    "Path '{}' is a directory, not a file",
                    rel_display(&rel)
                )));
            }
        }
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let tmp = full.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::now_v7().simple()));

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(HostError::Io(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(HostError::Io(e));
        }

        Ok(FileStat {
            path: rel_display(&rel),
            is_directory: false,
            size_bytes: bytes.len() as u64,
            modified: Some(Utc::now()),
        })
    }

    /// List a directory, entries sorted by name
    pub async fn list_dir(&self, path: &str) -> HostResult<Vec<DirEntryInfo>> {
        let rel = self.normalize(path)?;
        let full = self.confine(&rel)?;

        let meta = match tokio::fs::metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HostError::not_found(format!(
                    "Directory not found: {}",
                    rel_display(&rel)
                )))
            }
            Err(e) => return Err(HostError::Io(e)),
        };
        if !meta.is_dir() {
            return Err(HostError::invalid(format!(
                "Path '{}' is a file, not a directory. Use read_file instead.",
                rel_display(&rel)
            )));
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&full).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_meta = entry.metadata().await?;
            entries.push(DirEntryInfo {
                path: rel_display(&rel.join(&name)),
                name,
                is_directory: entry_meta.is_dir(),
                size_bytes: if entry_meta.is_dir() {
                    0
                } else {
                    entry_meta.len()
                },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Delete a file, or a directory when `recursive` covers its contents.
    ///
    /// Deleting the root itself is invalid; a non-empty directory without
    /// `recursive` is refused in-band.
    pub async fn delete(&self, path: &str, recursive: bool) -> HostResult<()> {
        let rel = self.normalize(path)?;
        if rel.as_os_str().is_empty() {
            return Err(HostError::invalid("Cannot delete the sandbox root"));
        }
        let full = self.confine(&rel)?;

        let meta = match tokio::fs::symlink_metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HostError::not_found(format!(
                    "File not found: {}",
                    rel_display(&rel)
                )))
            }
            Err(e) => return Err(HostError::Io(e)),
        };

        if meta.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&full).await?;
            } else {
                let mut reader = tokio::fs::read_dir(&full).await?;
                if reader.next_entry().await?.is_some() {
                    return Err(HostError::invalid(format!(
                        "Directory not empty: {} (pass recursive to delete it)",
                        rel_display(&rel)
                    )));
                }
                tokio::fs::remove_dir(&full).await?;
            }
        } else {
            tokio::fs::remove_file(&full).await?;
        }
        Ok(())
    }

    /// Metadata of a path; `None` when nothing exists there
    pub async fn stat(&self, path: &str) -> HostResult<Option<FileStat>> {
        let rel = self.normalize(path)?;
        let full = self.confine(&rel)?;

        let meta = match tokio::fs::metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HostError::Io(e)),
        };

        Ok(Some(FileStat {
            path: rel_display(&rel),
            is_directory: meta.is_dir(),
            size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }))
    }

    /// Lexical normalization: reject traversal before touching the filesystem.
    ///
    /// Leading separators are dropped, so '/notes.txt' and 'notes.txt' name
    /// the same sandbox location.
    fn normalize(&self, path: &str) -> HostResult<PathBuf> {
        if path.contains('\0') {
            return Err(HostError::invalid(format!("Invalid path: {:?}", path)));
        }
        let mut rel = PathBuf::new();
        for segment in path.split(['/', '\\']) {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if segment == ".." || segment.contains(':') {
                return Err(HostError::invalid(format!("Invalid path: {}", path)));
            }
            rel.push(segment);
        }
        Ok(rel)
    }

    /// Join to the root and verify the canonicalized location stays inside.
    ///
    /// The deepest existing ancestor is canonicalized (the target itself when
    /// it exists), which resolves symlinks before the containment check.
    fn confine(&self, rel: &Path) -> HostResult<PathBuf> {
        let full = self.root.join(rel);
        let mut probe = full.as_path();
        let mut pending: Vec<std::ffi::OsString> = Vec::new();

        let canonical = loop {
            match dunce::canonicalize(probe) {
                Ok(c) => break c,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    match (probe.parent(), probe.file_name()) {
                        (Some(parent), Some(name)) => {
                            pending.push(name.to_os_string());
                            probe = parent;
                        }
                        _ => {
                            return Err(HostError::invalid(format!(
                                "Invalid path: {}",
                                rel_display(rel)
                            )))
                        }
                    }
                }
                Err(e) => return Err(HostError::Io(e)),
            }
        };

        if !canonical.starts_with(&self.root) {
            return Err(HostError::invalid(format!(
                "Invalid path: {}",
                rel_display(rel)
            )));
        }

        let mut resolved = canonical;
        for segment in pending.iter().rev() {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

/// Render a normalized relative path sandbox-absolute (rooted at '/')
fn rel_display(rel: &Path) -> String {
    let joined = rel
        .iter()
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}
