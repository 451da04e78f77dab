//! Storage configuration types.
//!
//! Every backend is configured through the same named block, tagged by
//! `type`:
//!
//! ```toml
//! [storage]
//! type = "object_store"
//! bucket = "documents"
//! region = "eu-central-1"
//! access_key_id = "..."
//! secret_access_key = "..."
//! key_prefix = "wopi/"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackend {
    /// Rooted native directory tree.
    #[serde(rename = "filesystem")]
    FileSystem(FileSystemOptions),
    /// S3-compatible bucket under a key prefix.
    ObjectStore(ObjectStoreOptions),
}

impl StorageBackend {
    /// Create filesystem backend config.
    #[must_use]
    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self::FileSystem(FileSystemOptions { root: root.into() })
    }

    /// Create object-store backend config with an empty key prefix.
    #[must_use]
    pub fn object_store(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::ObjectStore(ObjectStoreOptions::new(
            bucket,
            region,
            access_key_id,
            secret_access_key,
        ))
    }

    /// Get the backend name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FileSystem(_) => "filesystem",
            Self::ObjectStore(_) => "object_store",
        }
    }
}

/// Filesystem backend options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSystemOptions {
    /// Root directory. Relative roots are resolved against the application
    /// base directory at startup.
    pub root: PathBuf,
}

impl FileSystemOptions {
    /// Resolve the configured root against `base` if it is relative.
    #[must_use]
    pub fn resolve_root(&self, base: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            base.join(&self.root)
        }
    }
}

/// Object-store backend options.
#[derive(Clone, Serialize, Deserialize)]
pub struct ObjectStoreOptions {
    /// Bucket name.
    pub bucket: String,
    /// Region name, e.g. `eu-central-1`.
    pub region: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Endpoint for S3-compatible stores; AWS when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key prefix that plays the role of the root folder.
    #[serde(default)]
    pub key_prefix: String,
    /// Owner reported for every object; the bucket name when unset.
    #[serde(default)]
    pub owner: Option<String>,
}

impl ObjectStoreOptions {
    /// Create options with an empty key prefix and no endpoint override.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint: None,
            key_prefix: String::new(),
            owner: None,
        }
    }

    /// Set endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Key prefix without a leading `/` and, unless empty, with exactly one
    /// trailing `/`.
    #[must_use]
    pub fn normalized_key_prefix(&self) -> String {
        let trimmed = self.key_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    }

    /// Owner reported for every descriptor.
    #[must_use]
    pub fn resolved_owner(&self) -> String {
        self.owner.clone().unwrap_or_else(|| self.bucket.clone())
    }
}

impl fmt::Debug for ObjectStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreOptions")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[hidden]")
            .field("endpoint", &self.endpoint)
            .field("key_prefix", &self.key_prefix)
            .field("owner", &self.owner)
            .finish()
    }
}
