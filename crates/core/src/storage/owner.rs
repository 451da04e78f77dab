//! File owner resolution for the filesystem backend.
//!
//! The resolver is picked once per platform when the backend is built, so
//! descriptors never branch on the operating system themselves.

use std::fmt;
use std::fs::Metadata;
use std::sync::Arc;

use super::types::UNSUPPORTED_OWNER;

/// Resolves the storage-level owner of a file from its metadata.
///
/// Resolution never fails: when the owner cannot be determined the resolver
/// returns a sentinel instead.
pub trait OwnerResolver: Send + Sync + fmt::Debug {
    /// Owner of the file described by `metadata`.
    fn owner_of(&self, metadata: &Metadata) -> String;
}

/// Resolves the owning user's name from the file's uid, falling back to the
/// numeric uid when no user entry exists.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixOwnerResolver;

#[cfg(unix)]
impl OwnerResolver for UnixOwnerResolver {
    fn owner_of(&self, metadata: &Metadata) -> String {
        use nix::unistd::{Uid, User};
        use std::os::unix::fs::MetadataExt;

        let uid = metadata.uid();
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(Some(user)) => user.name,
            Ok(None) => uid.to_string(),
            Err(err) => {
                tracing::debug!(uid, error = %err, "User lookup failed");
                uid.to_string()
            }
        }
    }
}

/// Used on platforms with no owner support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedOwnerResolver;

impl OwnerResolver for UnsupportedOwnerResolver {
    fn owner_of(&self, _metadata: &Metadata) -> String {
        UNSUPPORTED_OWNER.to_string()
    }
}

/// The resolver for the platform this binary was built for.
#[must_use]
pub fn platform_default() -> Arc<dyn OwnerResolver> {
    #[cfg(unix)]
    {
        Arc::new(UnixOwnerResolver)
    }
    #[cfg(not(unix))]
    {
        Arc::new(UnsupportedOwnerResolver)
    }
}
