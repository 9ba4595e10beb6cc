use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

/// Default cache file name, created in the configured cache directory.
pub const CACHE_FILE_NAME: &str = ".wechat_token_cache.json";

/// The single persisted record: which app the token belongs to, the token
/// itself, and its absolute expiration. Overwritten on every re-issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub appid: String,
    pub access_token: String,
    pub expires_at: i64,
}

/// Storage backend for the credential cache. File-backed in production,
/// in-memory for tests, so cache behavior is testable without filesystem
/// side effects.
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    async fn load(&self) -> Option<CacheRecord>;
    async fn save(&self, record: &CacheRecord);
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Option<CacheRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pre-seeded, as if a previous process had persisted `record`.
    pub fn with_record(record: CacheRecord) -> Self {
        Self {
            inner: Mutex::new(Some(record)),
        }
    }
}

#[async_trait]
impl CredentialStorage for MemoryStorage {
    async fn load(&self) -> Option<CacheRecord> {
        self.inner.lock().expect("storage lock poisoned").clone()
    }

    async fn save(&self, record: &CacheRecord) {
        *self.inner.lock().expect("storage lock poisoned") = Some(record.clone());
    }
}

/// File-backed storage holding one JSON record.
///
/// Write failures are logged and swallowed: a missing cache only costs an
/// extra issuance on the next restart, it never fails the current request.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Cache file under `dir`, using the default file name.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CACHE_FILE_NAME),
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStorage for FileStorage {
    async fn load(&self) -> Option<CacheRecord> {
        let bytes = fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("discarding unreadable token cache {}: {err}", self.path.display());
                None
            }
        }
    }

    async fn save(&self, record: &CacheRecord) {
        let body = match serde_json::to_vec(record) {
            Ok(body) => body,
            Err(err) => {
                warn!("token cache serialization failed: {err}");
                return;
            }
        };
        match fs::write(&self.path, body).await {
            Ok(()) => debug!("token cache written to {}", self.path.display()),
            Err(err) => warn!("token cache write to {} failed: {err}", self.path.display()),
        }
    }
}
