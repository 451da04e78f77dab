//! File and folder descriptors.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::codec::{self, Identifier};

/// Owner reported when the platform cannot supply one.
pub const UNSUPPORTED_OWNER: &str = "unsupported";

/// A single file as read from the backend.
///
/// Descriptors are snapshots: they are built fresh per request and never
/// cached. Two descriptors are equal when their identifiers are equal.
#[derive(Debug, Clone, Serialize)]
pub struct File {
    /// Opaque identifier.
    pub identifier: Identifier,
    /// Last path segment, extension included.
    pub name: String,
    /// Extension without the leading dot; empty when there is none.
    pub extension: String,
    /// Size in bytes.
    pub length: u64,
    /// Content checksum, when the backend supplied one for this read.
    pub content_hash: Option<String>,
    /// Last write time.
    pub last_write_time_utc: DateTime<Utc>,
    /// Storage-level owner.
    pub owner: String,
    /// Whether the object existed when the snapshot was taken.
    pub exists: bool,
}

impl File {
    /// Start a descriptor for the file at a native path.
    #[must_use]
    pub fn builder(path: &str) -> FileBuilder {
        FileBuilder::new(path)
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for File {}

impl Hash for File {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Builder for [`File`] that derives identifier, name and extension from the
/// native path.
#[derive(Debug, Clone)]
pub struct FileBuilder {
    file: File,
}

impl FileBuilder {
    fn new(path: &str) -> Self {
        Self {
            file: File {
                identifier: codec::encode(path),
                name: codec::file_name(path).to_string(),
                extension: codec::extension(path).to_string(),
                length: 0,
                content_hash: None,
                last_write_time_utc: DateTime::<Utc>::UNIX_EPOCH,
                owner: UNSUPPORTED_OWNER.to_string(),
                exists: true,
            },
        }
    }

    /// Set size in bytes.
    #[must_use]
    pub fn length(mut self, length: u64) -> Self {
        self.file.length = length;
        self
    }

    /// Set content checksum.
    #[must_use]
    pub fn content_hash(mut self, hash: Option<String>) -> Self {
        self.file.content_hash = hash;
        self
    }

    /// Set last write time.
    #[must_use]
    pub fn last_write_time_utc(mut self, time: DateTime<Utc>) -> Self {
        self.file.last_write_time_utc = time;
        self
    }

    /// Set owner.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.file.owner = owner.into();
        self
    }

    /// Finish the descriptor.
    #[must_use]
    pub fn build(self) -> File {
        self.file
    }
}

/// A single folder.
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    /// Opaque identifier.
    pub identifier: Identifier,
    /// Display name.
    pub name: String,
}

impl Folder {
    /// Folder at a native path, named after its last segment.
    #[must_use]
    pub fn at(path: &str) -> Self {
        Self {
            identifier: codec::encode(path),
            name: codec::file_name(path).to_string(),
        }
    }

    /// The root folder, with a backend-chosen display name.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            identifier: Identifier::root(),
            name: name.into(),
        }
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Folder {}

impl Hash for Folder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}
