use crate::document::types::Document;
use crate::error::Result;

use std::future::Future;
use std::path::PathBuf;

pub const FIELD_TEXT: &str = "text";
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_VIDEO: &str = "video";

/// Read-only blob store keyed by filename.
pub trait MediaStore: Send + Sync {
    fn fetch(&self, filename: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}

/// Media files laid out under a root directory, usually one folder per article.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Depth-first search for a file with exactly this name.
    async fn locate(&self, filename: &str) -> Result<Option<PathBuf>> {
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if entry.file_name() == filename {
                    return Ok(Some(entry.path()));
                }
            }
        }
        Ok(None)
    }
}

impl MediaStore for FsMediaStore {
    async fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            tracing::warn!("Rejected media filename '{}'", filename);
            return Ok(None);
        }
        match self.locate(filename).await? {
            Some(path) => Ok(Some(tokio::fs::read(path).await?)),
            None => Ok(None),
        }
    }
}

/// Filenames an article references, in text, image, video order.
///
/// `image` is a comma-separated list and may end with a trailing comma;
/// an empty `video` means the article has none.
pub fn media_filenames(article: &Document) -> Vec<String> {
    let mut names = Vec::new();
    for field in [FIELD_TEXT, FIELD_IMAGE, FIELD_VIDEO] {
        if let Some(value) = article.get(field).and_then(|v| v.as_str()) {
            names.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }
    }
    names
}
