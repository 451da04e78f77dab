//! Storage provider contract.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::types::{File, Folder};

/// Byte stream handed out by [`StorageProvider::read_stream`] and accepted by
/// [`StorageProvider::write_stream`]. Dropping it releases the underlying
/// handle.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Access to files and folders by opaque identifier.
///
/// Every operation takes an identifier produced by the codec; the empty
/// identifier means the root. Implementations hold no per-request state and
/// are safe to call concurrently.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Describe a file.
    ///
    /// Fails with `NotFound` if nothing exists under the identifier or it
    /// names a folder.
    async fn get_file(&self, identifier: &str) -> Result<File, StorageError>;

    /// Describe a folder. Always succeeds for the root unless the backend
    /// cannot resolve it (`RootUnavailable`).
    async fn get_folder(&self, identifier: &str) -> Result<Folder, StorageError>;

    /// Direct child files of a folder, ordered by name.
    async fn list_files(&self, folder_identifier: &str) -> Result<Vec<File>, StorageError>;

    /// Direct child folders of a folder, ordered by name.
    async fn list_folders(&self, folder_identifier: &str) -> Result<Vec<Folder>, StorageError>;

    /// Open a file for reading.
    async fn read_stream(&self, identifier: &str) -> Result<ByteStream, StorageError>;

    /// Replace the content of an existing file.
    ///
    /// Either the whole new content becomes visible or an error is returned
    /// and the previous content stays in place. Fails with `NotFound` if the
    /// file does not exist yet.
    async fn write_stream(&self, identifier: &str, content: ByteStream)
    -> Result<(), StorageError>;

    /// The root folder.
    fn root(&self) -> Folder;

    /// Short backend name for logs and health reporting.
    fn backend_name(&self) -> &'static str;
}
