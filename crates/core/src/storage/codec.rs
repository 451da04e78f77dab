//! Reversible identifier codec.
//!
//! Native paths are relative, `/`-separated, with no leading or trailing
//! separator (`docs/report.pdf`). The root is the empty path and encodes to
//! the empty identifier. Identifiers are unpadded base64url of the path's
//! UTF-8 bytes, so they only ever contain `A-Z a-z 0-9 - _` and can be
//! dropped into a URL path segment as-is.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Separator used by native paths on every backend.
pub const SEPARATOR: char = '/';

/// Opaque, URL-safe handle for a file or folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// The identifier of the storage root.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Returns true if this identifies the storage root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode a native path into an identifier.
#[must_use]
pub fn encode(path: &str) -> Identifier {
    Identifier(base64_url::encode(path))
}

/// Decode an identifier back into the native path that produced it.
///
/// The empty identifier decodes to the root (empty path).
///
/// # Errors
///
/// Returns `MalformedIdentifier` if the text is not canonical codec output,
/// is not UTF-8 once decoded, or names a path outside the root.
pub fn decode(identifier: &str) -> Result<String, StorageError> {
    if identifier.is_empty() {
        return Ok(String::new());
    }

    let bytes = base64_url::decode(identifier)
        .map_err(|e| StorageError::malformed(format!("'{identifier}': {e}")))?;

    // Only one spelling per path.
    if base64_url::encode(&bytes) != identifier {
        return Err(StorageError::malformed(format!(
            "'{identifier}': non-canonical encoding"
        )));
    }

    let path = String::from_utf8(bytes)
        .map_err(|_| StorageError::malformed(format!("'{identifier}': not valid UTF-8")))?;

    validate_path(&path)?;
    Ok(path)
}

/// Check that a native path stays under the root.
///
/// # Errors
///
/// Returns `MalformedIdentifier` for absolute paths, `.`/`..` or empty
/// segments, backslashes and NUL bytes.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() {
        return Ok(());
    }

    if path.contains('\\') || path.contains('\0') {
        return Err(StorageError::malformed(format!(
            "'{path}': forbidden character"
        )));
    }

    for segment in path.split(SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::malformed(format!(
                "'{path}': path escapes the storage root"
            )));
        }
    }

    // Platform prefixes (drive letters) and root markers.
    if !Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(StorageError::malformed(format!(
            "'{path}': path escapes the storage root"
        )));
    }

    Ok(())
}

/// Join a child name onto a native folder path.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}

/// Last segment of a native path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Extension of the last segment, without the dot. Empty when there is none;
/// a leading dot (`.profile`) does not start an extension.
#[must_use]
pub fn extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}
