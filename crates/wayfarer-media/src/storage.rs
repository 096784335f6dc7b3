use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid path: {0}")]
    BadPath(String),
    #[error("invalid filename")]
    InvalidFilename,
}

/// A blob loaded from the store, ready to serve.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Basename for the Content-Disposition header.
    pub filename: String,
}

/// Filesystem-backed blob store under a single upload root.
///
/// Filenames are always server-generated (`<uuid><ext>`); the client-supplied
/// name only contributes its extension. Blobs for an event live in a
/// `<root>/<event_id>/` partition.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `data` under a fresh generated name, optionally partitioned by
    /// event. Returns the public URL path (`/api/uploads/<relative>`).
    pub async fn store(
        &self,
        data: &[u8],
        original_name: &str,
        event_id: Option<&str>,
    ) -> Result<String, MediaError> {
        if original_name.contains('\0') {
            return Err(MediaError::InvalidFilename);
        }

        let ext = extension_of(original_name);
        let generated = match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let (dir, relative) = match event_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if !id.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                    return Err(MediaError::BadPath(id.to_string()));
                }
                (self.root.join(id), format!("{id}/{generated}"))
            }
            None => (self.root.clone(), generated.clone()),
        };

        fs::create_dir_all(&dir).await?;

        // Write through a temp name and rename, so a crash mid-write never
        // leaves a half-written blob under the served name.
        let target = dir.join(&generated);
        let tmp = dir.join(format!(".{generated}.tmp"));
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp, &target).await?;

        tracing::debug!(path = %target.display(), size = data.len(), "stored media object");
        Ok(format!("/api/uploads/{relative}"))
    }

    /// Load the blob at `relative` (as previously returned by `store`, minus
    /// the URL prefix). Paths that would escape the upload root are rejected.
    pub async fn load(&self, relative: &str) -> Result<LoadedFile, MediaError> {
        let safe = self.resolve(relative)?;
        let bytes = match fs::read(&safe).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::NotFound(relative.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let filename = safe
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let content_type = content_type_for(&filename);

        Ok(LoadedFile {
            bytes,
            content_type,
            filename,
        })
    }

    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        let safe = self.resolve(relative)?;
        match fs::remove_file(&safe).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(relative.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Map a relative request path to a path under the root. Every component
    /// must be a plain name: `..`, absolute prefixes, and embedded NULs are
    /// all rejected before touching the filesystem.
    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        if relative.is_empty() || relative.contains('\0') {
            return Err(MediaError::BadPath(relative.to_string()));
        }
        let path = Path::new(relative);
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(MediaError::BadPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = name.rsplit_once('.')?.1;
    if ext.is_empty() || !ext.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension-based content type; anything unknown serves as octet-stream.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
