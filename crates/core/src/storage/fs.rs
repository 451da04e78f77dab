//! Filesystem backend over a rooted native directory tree.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::codec;
use super::config::FileSystemOptions;
use super::error::StorageError;
use super::owner::{self, OwnerResolver};
use super::provider::{ByteStream, StorageProvider};
use super::types::{File, Folder};

/// Suffix of staging files written next to a file being replaced.
const STAGING_SUFFIX: &str = ".docgate-tmp";

/// Read buffer for hashing.
const HASH_CHUNK: usize = 64 * 1024;

/// Storage provider backed by a local directory.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    root: PathBuf,
    root_name: String,
    owners: Arc<dyn OwnerResolver>,
}

impl FileSystemProvider {
    /// Create a provider rooted at an absolute directory, using the owner
    /// resolver for the current platform.
    ///
    /// The directory does not have to exist yet; it is created on first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_owner_resolver(root, owner::platform_default())
    }

    /// Create a provider with an explicit owner resolver.
    #[must_use]
    pub fn with_owner_resolver(root: impl Into<PathBuf>, owners: Arc<dyn OwnerResolver>) -> Self {
        let root = root.into();
        let root_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| root.display().to_string(), str::to_string);
        Self {
            root,
            root_name,
            owners,
        }
    }

    /// Create a provider from options, resolving a relative root against
    /// `base_dir`.
    #[must_use]
    pub fn from_options(options: &FileSystemOptions, base_dir: &Path) -> Self {
        Self::new(options.resolve_root(base_dir))
    }

    /// Absolute root directory.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Decode an identifier into its native path and absolute location.
    fn resolve(&self, identifier: &str) -> Result<(String, PathBuf), StorageError> {
        let path = codec::decode(identifier)?;
        let native = if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&path)
        };
        Ok((path, native))
    }

    async fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::root_unavailable(format!("{}: {e}", self.root.display()))
        })
    }

    /// Resolve a folder identifier, creating the root if needed.
    async fn resolve_folder(&self, identifier: &str) -> Result<(String, PathBuf), StorageError> {
        let (path, native) = self.resolve(identifier)?;
        if path.is_empty() {
            self.ensure_root().await?;
            return Ok((path, native));
        }

        let metadata = fs::metadata(&native)
            .await
            .map_err(|e| StorageError::from_io(&e, &path))?;
        if !metadata.is_dir() {
            return Err(StorageError::not_found(path));
        }
        Ok((path, native))
    }

    /// Resolve a file identifier and take one metadata snapshot of it.
    async fn resolve_file(
        &self,
        identifier: &str,
    ) -> Result<(String, PathBuf, Metadata), StorageError> {
        let (path, native) = self.resolve(identifier)?;
        if path.is_empty() {
            return Err(StorageError::not_found(path));
        }

        let metadata = fs::metadata(&native)
            .await
            .map_err(|e| StorageError::from_io(&e, &path))?;
        if !metadata.is_file() {
            return Err(StorageError::not_found(path));
        }
        Ok((path, native, metadata))
    }

    fn describe(&self, path: &str, metadata: &Metadata, content_hash: Option<String>) -> File {
        let modified = metadata
            .modified()
            .map_or(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::from);

        File::builder(path)
            .length(metadata.len())
            .content_hash(content_hash)
            .last_write_time_utc(modified)
            .owner(self.owners.owner_of(metadata))
            .build()
    }

    /// Direct children of a directory with their (symlink-following)
    /// metadata, sorted by name.
    async fn read_children(
        &self,
        path: &str,
        native: &Path,
    ) -> Result<Vec<(String, Metadata)>, StorageError> {
        let mut entries = fs::read_dir(native)
            .await
            .map_err(|e| StorageError::from_io(&e, path))?;

        let mut children = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(&e, path))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(parent = %path, name = ?file_name, "Skipping entry with non UTF-8 name");
                continue;
            };
            if is_staging_name(name) {
                continue;
            }
            let child = codec::join(path, name);
            if codec::validate_path(&child).is_err() {
                warn!(parent = %path, name, "Skipping entry with unaddressable name");
                continue;
            }

            match fs::metadata(entry.path()).await {
                Ok(metadata) => children.push((child, metadata)),
                // Removed between read_dir and stat, or a dangling link.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::from_io(&e, &child)),
            }
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }
}

/// Fixed-length staging name, independent of the target's name length.
fn staging_name() -> String {
    format!(".{}{STAGING_SUFFIX}", Uuid::new_v4())
}

/// Whether `name` has the exact shape produced by [`staging_name`].
fn is_staging_name(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(STAGING_SUFFIX))
        .is_some_and(|id| Uuid::parse_str(id).is_ok())
}

/// Stream a file through a fresh SHA-256 hasher.
async fn sha256_of(native: &Path) -> io::Result<String> {
    let mut file = fs::File::open(native).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(base64::engine::general_purpose::STANDARD.encode(hasher.finalize()))
}

/// Copy `content` into a staging file and move it over `target`.
async fn replace_file(
    staging: &Path,
    target: &Path,
    permissions: std::fs::Permissions,
    content: &mut ByteStream,
) -> io::Result<u64> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await?;
    let written = tokio::io::copy(content, &mut file).await?;
    file.sync_all().await?;
    drop(file);

    fs::set_permissions(staging, permissions).await?;
    fs::rename(staging, target).await?;
    Ok(written)
}

#[async_trait]
impl StorageProvider for FileSystemProvider {
    async fn get_file(&self, identifier: &str) -> Result<File, StorageError> {
        let (path, native, metadata) = self.resolve_file(identifier).await?;
        let hash = sha256_of(&native)
            .await
            .map_err(|e| StorageError::from_io(&e, &path))?;

        debug!(path = %path, length = metadata.len(), "Described file");
        Ok(self.describe(&path, &metadata, Some(hash)))
    }

    async fn get_folder(&self, identifier: &str) -> Result<Folder, StorageError> {
        let (path, _) = self.resolve_folder(identifier).await?;
        if path.is_empty() {
            return Ok(self.root());
        }
        Ok(Folder::at(&path))
    }

    async fn list_files(&self, folder_identifier: &str) -> Result<Vec<File>, StorageError> {
        let (path, native) = self.resolve_folder(folder_identifier).await?;
        let children = self.read_children(&path, &native).await?;

        // Owner lookups may hit NSS; keep them off the async workers.
        let provider = self.clone();
        let files: Vec<File> = tokio::task::spawn_blocking(move || {
            children
                .into_iter()
                .filter(|(_, metadata)| metadata.is_file())
                .map(|(child, metadata)| provider.describe(&child, &metadata, None))
                .collect()
        })
        .await
        .map_err(|e| StorageError::io(format!("{path}: {e}")))?;

        debug!(folder = %path, count = files.len(), "Listed files");
        Ok(files)
    }

    async fn list_folders(&self, folder_identifier: &str) -> Result<Vec<Folder>, StorageError> {
        let (path, native) = self.resolve_folder(folder_identifier).await?;
        let folders: Vec<Folder> = self
            .read_children(&path, &native)
            .await?
            .into_iter()
            .filter(|(_, metadata)| metadata.is_dir())
            .map(|(child, _)| Folder::at(&child))
            .collect();

        debug!(folder = %path, count = folders.len(), "Listed folders");
        Ok(folders)
    }

    async fn read_stream(&self, identifier: &str) -> Result<ByteStream, StorageError> {
        let (path, native, _) = self.resolve_file(identifier).await?;
        let file = fs::File::open(&native)
            .await
            .map_err(|e| StorageError::from_io(&e, &path))?;
        Ok(Box::new(file))
    }

    async fn write_stream(
        &self,
        identifier: &str,
        mut content: ByteStream,
    ) -> Result<(), StorageError> {
        let (path, native, metadata) = self.resolve_file(identifier).await?;
        let parent = native
            .parent()
            .ok_or_else(|| StorageError::not_found(path.clone()))?;
        let staging = parent.join(staging_name());

        match replace_file(&staging, &native, metadata.permissions(), &mut content).await {
            Ok(written) => {
                debug!(path = %path, bytes = written, "Replaced file content");
                Ok(())
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_file(&staging).await {
                    if cleanup.kind() != io::ErrorKind::NotFound {
                        warn!(staging = ?staging, error = %cleanup, "Failed to remove staging file");
                    }
                }
                error!(path = %path, error = %err, "Failed to replace file content");
                Err(StorageError::from_io(&err, &path))
            }
        }
    }

    fn root(&self) -> Folder {
        Folder::root(self.root_name.clone())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::future::join_all;
    use tokio::io::AsyncReadExt;

    use crate::storage::owner::UnsupportedOwnerResolver;
    use crate::storage::types::UNSUPPORTED_OWNER;

    fn provider(root: &Path) -> FileSystemProvider {
        FileSystemProvider::new(root)
    }

    fn seed(root: &Path, path: &str, content: &[u8]) {
        let native = root.join(path);
        std::fs::create_dir_all(native.parent().unwrap()).unwrap();
        std::fs::write(native, content).unwrap();
    }

    async fn read_all(provider: &FileSystemProvider, identifier: &str) -> Vec<u8> {
        let mut stream = provider.read_stream(identifier).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_scenario_docs_report_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        seed(&root, "docs/report.pdf", b"%PDF-1.7");
        let provider = provider(&root);

        let id = codec::encode("docs/report.pdf");
        let file = provider.get_file(id.as_str()).await.unwrap();

        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.extension, "pdf");
        assert_eq!(file.length, 8);
        assert!(file.exists);
        assert_eq!(file.identifier, id);
        assert_eq!(codec::decode(id.as_str()).unwrap(), "docs/report.pdf");
    }

    #[tokio::test]
    async fn test_get_file_hash_is_sha256() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.docx", b"hello");
        let provider = provider(dir.path());

        let file = provider
            .get_file(codec::encode("a.docx").as_str())
            .await
            .unwrap();

        // sha256("hello"), standard base64
        assert_eq!(
            file.content_hash.as_deref(),
            Some("LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=")
        );
    }

    #[tokio::test]
    async fn test_get_file_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        let err = provider
            .get_file(codec::encode("missing.pdf").as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_file_on_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let provider = provider(dir.path());

        let err = provider
            .get_file(codec::encode("docs").as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));

        let err = provider.get_file("").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        let escaping = base64_url::encode("../outside.pdf");
        assert!(matches!(
            provider.get_file(&escaping).await,
            Err(StorageError::MalformedIdentifier(_))
        ));
        assert!(matches!(
            provider.list_files("not base64!").await,
            Err(StorageError::MalformedIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_root_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not-yet");
        let provider = provider(&root);

        let folder = provider.get_folder("").await.unwrap();
        assert!(folder.identifier.is_root());
        assert_eq!(folder.name, "not-yet");
        assert!(root.is_dir());
        assert_eq!(provider.root(), folder);
    }

    #[tokio::test]
    async fn test_empty_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(&dir.path().join("empty"));

        assert!(provider.list_files("").await.unwrap().is_empty());
        assert!(provider.list_folders("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_folder_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.pdf", b"x");
        let provider = provider(dir.path());

        assert!(matches!(
            provider.get_folder(codec::encode("nope").as_str()).await,
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(
            provider.get_folder(codec::encode("a.pdf").as_str()).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_listing_missing_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.pdf", b"x");
        let provider = provider(dir.path());

        for id in [codec::encode("missing"), codec::encode("a.pdf")] {
            assert!(matches!(
                provider.list_files(id.as_str()).await,
                Err(StorageError::NotFound { .. })
            ));
            assert!(matches!(
                provider.list_folders(id.as_str()).await,
                Err(StorageError::NotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_listing_is_direct_children_only() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "b.xlsx", b"b");
        seed(dir.path(), "a.docx", b"a");
        seed(dir.path(), "docs/report.pdf", b"r");
        seed(dir.path(), "docs/2026/deep.pptx", b"d");
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        let provider = provider(dir.path());

        let files = provider.list_files("").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.docx", "b.xlsx"]);
        assert!(files.iter().all(|f| f.content_hash.is_none()));

        let folders = provider.list_folders("").await.unwrap();
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["archive", "docs"]);

        let docs = &folders[1];
        let nested = provider.list_files(docs.identifier.as_str()).await.unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(
            codec::decode(nested[0].identifier.as_str()).unwrap(),
            "docs/report.pdf"
        );

        let sub = provider.list_folders(docs.identifier.as_str()).await.unwrap();
        assert_eq!(sub, vec![Folder::at("docs/2026")]);
    }

    #[tokio::test]
    async fn test_listed_identifiers_resolve() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "with space/ünïcode file.docx", b"content");
        let provider = provider(dir.path());

        let folders = provider.list_folders("").await.unwrap();
        let files = provider
            .list_files(folders[0].identifier.as_str())
            .await
            .unwrap();
        let file = provider
            .get_file(files[0].identifier.as_str())
            .await
            .unwrap();
        assert_eq!(file.name, "ünïcode file.docx");
        assert_eq!(file.length, 7);
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "docs/report.docx", b"old content");
        let provider = provider(dir.path());
        let id = codec::encode("docs/report.docx");

        let before = provider.get_file(id.as_str()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let new_content = b"brand new and longer content".to_vec();
        provider
            .write_stream(id.as_str(), Box::new(std::io::Cursor::new(new_content.clone())))
            .await
            .unwrap();

        assert_eq!(read_all(&provider, id.as_str()).await, new_content);
        let after = provider.get_file(id.as_str()).await.unwrap();
        assert_eq!(after.length, new_content.len() as u64);
        assert!(after.last_write_time_utc >= before.last_write_time_utc);
        assert_ne!(after.content_hash, before.content_hash);

        // No staging leftovers.
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("docs"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_long_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("{}.docx", "a".repeat(220));
        seed(dir.path(), &name, b"old");
        let provider = provider(dir.path());
        let id = codec::encode(&name);

        provider
            .write_stream(id.as_str(), Box::new(std::io::Cursor::new(b"new".to_vec())))
            .await
            .unwrap();

        assert_eq!(read_all(&provider, id.as_str()).await, b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_staging_name_shape() {
        let staging = staging_name();
        assert!(is_staging_name(&staging));
        assert!(!is_staging_name("report.docgate-tmp"));
        assert!(!is_staging_name(".report.docgate-tmp"));
        assert!(!is_staging_name(&staging[1..]));
    }

    #[tokio::test]
    async fn test_user_files_with_staging_suffix_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "notes.docgate-tmp", b"user file");
        seed(dir.path(), &staging_name(), b"partial");
        let provider = provider(dir.path());

        let files = provider.list_files("").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["notes.docgate-tmp"]);
    }

    #[tokio::test]
    async fn test_write_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        let err = provider
            .write_stream(
                codec::encode("new.docx").as_str(),
                Box::new(std::io::Cursor::new(b"x".to_vec())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!dir.path().join("new.docx").exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_content() {
        struct FailingReader;

        impl tokio::io::AsyncRead for FailingReader {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Err(io::Error::other("connection reset")))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.docx", b"previous");
        let provider = provider(dir.path());
        let id = codec::encode("a.docx");

        let err = provider
            .write_stream(id.as_str(), Box::new(FailingReader))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(read_all(&provider, id.as_str()).await, b"previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_read_stream_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        assert!(matches!(
            provider.read_stream(codec::encode("gone.pdf").as_str()).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_owner_resolver_is_used() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.pdf", b"x");
        let provider =
            FileSystemProvider::with_owner_resolver(dir.path(), Arc::new(UnsupportedOwnerResolver));

        let file = provider
            .get_file(codec::encode("a.pdf").as_str())
            .await
            .unwrap();
        assert_eq!(file.owner, UNSUPPORTED_OWNER);
    }

    #[tokio::test]
    async fn test_concurrent_listings_are_consistent() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            seed(dir.path(), &format!("docs/file-{i}.docx"), b"x");
            std::fs::create_dir_all(dir.path().join(format!("docs/sub-{i}"))).unwrap();
        }
        let provider = Arc::new(provider(dir.path()));
        let docs = codec::encode("docs");

        let tasks = (0..32).map(|_| {
            let provider = Arc::clone(&provider);
            let docs = docs.clone();
            tokio::spawn(async move {
                let files = provider.list_files(docs.as_str()).await.unwrap();
                let folders = provider.list_folders(docs.as_str()).await.unwrap();
                (files, folders)
            })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        let (first_files, first_folders) = &results[0];
        assert_eq!(first_files.len(), 10);
        assert_eq!(first_folders.len(), 10);
        for (files, folders) in &results {
            assert_eq!(files, first_files);
            assert_eq!(folders, first_folders);
        }
    }
}
