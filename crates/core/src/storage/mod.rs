//! Document storage behind a single provider contract.
//!
//! Two backends implement [`StorageProvider`]:
//! - [`FileSystemProvider`] - a rooted native directory tree
//! - [`ObjectStoreProvider`] - an S3-compatible bucket under a key prefix (Apache OpenDAL)
//!
//! # Identifiers
//!
//! Files and folders are addressed by opaque, URL-safe identifiers that encode
//! a `/`-separated path relative to the provider root. The root is the empty
//! identifier.
//!
//! ```text
//! "docs/report.pdf"  <->  "ZG9jcy9yZXBvcnQucGRm"
//! ""                 <->  ""   (root)
//! ```

pub mod codec;
mod config;
mod error;
mod fs;
mod object_store;
mod owner;
mod provider;
mod types;

#[cfg(test)]
mod codec_props;

use std::path::Path;
use std::sync::Arc;

pub use codec::Identifier;
pub use config::{FileSystemOptions, ObjectStoreOptions, StorageBackend};
pub use error::StorageError;
pub use fs::FileSystemProvider;
pub use object_store::{DOCUMENT_EXTENSIONS, ObjectStoreProvider};
pub use owner::{OwnerResolver, UnsupportedOwnerResolver, platform_default};
#[cfg(unix)]
pub use owner::UnixOwnerResolver;
pub use provider::{ByteStream, StorageProvider};
pub use types::{File, FileBuilder, Folder, UNSUPPORTED_OWNER};

/// Build the provider selected by configuration.
///
/// Relative filesystem roots are resolved against `base_dir`. Object stores
/// are checked for reachability before this returns.
///
/// # Errors
///
/// Returns `BackendUnavailable` if the object store cannot be reached.
pub async fn connect(
    backend: &StorageBackend,
    base_dir: &Path,
) -> Result<Arc<dyn StorageProvider>, StorageError> {
    let provider: Arc<dyn StorageProvider> = match backend {
        StorageBackend::FileSystem(options) => {
            Arc::new(FileSystemProvider::from_options(options, base_dir))
        }
        StorageBackend::ObjectStore(options) => {
            Arc::new(ObjectStoreProvider::connect(options).await?)
        }
    };

    tracing::info!(backend = provider.backend_name(), root = %provider.root().name, "Storage provider ready");
    Ok(provider)
}
