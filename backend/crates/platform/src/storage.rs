//! Object Storage
//!
//! Images (avatars, course thumbnails) live in an object store; database
//! rows only keep the object key (`<prefix>/<uuid>.<ext>`).

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use kernel::error::app_error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Default upload limit for images (2 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Route prefix under which the API serves stored objects
pub const MEDIA_ROUTE_PREFIX: &str = "/api/media";

/// URL clients use to fetch `key`
pub fn media_url(key: &str) -> String {
    format!("{}/{}", MEDIA_ROUTE_PREFIX, key)
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload is empty")]
    Empty,

    #[error("Upload exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Content does not match declared type {0}")]
    ContentMismatch(&'static str),

    #[error("Invalid object key")]
    InvalidKey,

    #[error("Object not found")]
    NotFound,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err {
            StorageError::Empty | StorageError::InvalidKey => AppError::bad_request(message),
            StorageError::TooLarge { .. } => AppError::payload_too_large(message),
            StorageError::UnsupportedType(_) | StorageError::ContentMismatch(_) => {
                AppError::unsupported_media_type(message)
                    .with_action("Upload a PNG, JPEG, WebP or GIF image")
            }
            StorageError::NotFound => AppError::not_found(message),
            StorageError::Io(e) => AppError::internal("Storage unavailable").with_source(e),
        }
    }
}

// ============================================================================
// Image uploads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Ignore parameters such as "; charset=..."
        let essence = content_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// Magic-number check
    fn matches(&self, bytes: &[u8]) -> bool {
        match self {
            Self::Png => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Webp => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
            Self::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        }
    }
}

/// A validated image body
#[derive(Debug, Clone)]
pub struct ImageUpload {
    kind: ImageKind,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        content_type: Option<&str>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(StorageError::TooLarge { max: max_bytes });
        }

        let declared = content_type.unwrap_or("application/octet-stream");
        let kind = ImageKind::from_content_type(declared)
            .ok_or_else(|| StorageError::UnsupportedType(declared.to_string()))?;

        if !kind.matches(&bytes) {
            return Err(StorageError::ContentMismatch(kind.content_type()));
        }

        Ok(Self { kind, bytes })
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Fresh key under `prefix`, e.g. `avatars/<uuid>.png`
    pub fn new_key(&self, prefix: &str) -> String {
        format!("{}/{}.{}", prefix, Uuid::new_v4(), self.kind.extension())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// An object read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Keys are relative, `/`-separated, made of `[A-Za-z0-9._-]` segments
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.len() > 255 || key.starts_with('/') {
        return Err(StorageError::InvalidKey);
    }
    let valid = key.split('/').all(|segment| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey)
    }
}

fn content_type_for_key(key: &str) -> String {
    key.rsplit_once('.')
        .and_then(|(_, ext)| ImageKind::from_extension(ext))
        .map(|kind| kind.content_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

// ============================================================================
// Store trait
// ============================================================================

/// Store port; only the `Send` variant is re-exported so method calls
/// resolve to a single trait
pub mod port {
    use super::{StorageError, StoredObject};

    #[trait_variant::make(ObjectStore: Send)]
    pub trait LocalObjectStore {
        async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

        async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

        /// Deleting a missing object is not an error
        async fn delete(&self, key: &str) -> Result<(), StorageError>;
    }
}

pub use port::ObjectStore;

/// Filesystem-backed store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey);
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(key = %key, "Object stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(StoredObject {
                content_type: content_type_for_key(key),
                bytes,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map(|bytes| StoredObject {
                content_type: content_type_for_key(key),
                bytes: bytes.clone(),
            })
            .ok_or(StorageError::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Store selected at start-up
#[derive(Debug, Clone)]
pub enum ObjectStorage {
    Local(FsObjectStore),
    Memory(MemoryObjectStore),
}

impl ObjectStore for ObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        match self {
            Self::Local(store) => store.put(key, bytes).await,
            Self::Memory(store) => store.put(key, bytes).await,
        }
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        match self {
            Self::Local(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(store) => store.delete(key).await,
            Self::Memory(store) => store.delete(key).await,
        }
    }
}
