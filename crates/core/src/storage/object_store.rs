//! Object-store backend using Apache OpenDAL.
//!
//! The bucket is a flat key space. Folders are simulated with common-prefix
//! listing under a fixed key prefix that plays the role of the root:
//!
//! ```text
//! key_prefix = "wopi/"
//!
//! wopi/report.pdf          -> file   "report.pdf"
//! wopi/docs/               -> folder "docs"      (marker or common prefix)
//! wopi/docs/budget.xlsx    -> file   "docs/budget.xlsx"
//! wopi/docs/notes.txt      -> hidden (extension not served)
//! ```

use async_trait::async_trait;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use opendal::{Entry, Metadata, Operator, services};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, error, info};

use super::codec::{self, SEPARATOR};
use super::config::ObjectStoreOptions;
use super::error::StorageError;
use super::provider::{ByteStream, StorageProvider};
use super::types::{File, Folder};

/// Extensions of the document types served to editing clients. Objects with
/// any other extension are not listed.
pub const DOCUMENT_EXTENSIONS: [&str; 4] = ["pdf", "docx", "xlsx", "pptx"];

/// Storage provider backed by an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct ObjectStoreProvider {
    operator: Operator,
    key_prefix: String,
    root_name: String,
    owner: String,
}

impl ObjectStoreProvider {
    /// Build the S3 operator and verify the bucket is reachable with the
    /// configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the operator cannot be built or the
    /// bucket cannot be reached. There is no lazy retry.
    pub async fn connect(options: &ObjectStoreOptions) -> Result<Self, StorageError> {
        let operator = Self::create_operator(options)?;

        operator.check().await.map_err(|e| {
            StorageError::backend_unavailable(format!("bucket '{}': {e}", options.bucket))
        })?;

        info!(
            bucket = %options.bucket,
            region = %options.region,
            key_prefix = %options.normalized_key_prefix(),
            "Object store connected"
        );
        Ok(Self::with_operator(operator, options))
    }

    /// Wrap an existing operator. No reachability check is made.
    #[must_use]
    pub fn with_operator(operator: Operator, options: &ObjectStoreOptions) -> Self {
        let key_prefix = options.normalized_key_prefix();
        let root_name = match key_prefix.trim_end_matches(SEPARATOR) {
            "" => options.bucket.clone(),
            prefix => codec::file_name(prefix).to_string(),
        };

        Self {
            operator,
            key_prefix,
            root_name,
            owner: options.resolved_owner(),
        }
    }

    /// Create OpenDAL operator from options.
    fn create_operator(options: &ObjectStoreOptions) -> Result<Operator, StorageError> {
        let mut builder = services::S3::default()
            .bucket(&options.bucket)
            .region(&options.region)
            .access_key_id(&options.access_key_id)
            .secret_access_key(&options.secret_access_key);
        if let Some(endpoint) = &options.endpoint {
            builder = builder.endpoint(endpoint);
        }

        Ok(Operator::new(builder)
            .map_err(|e| StorageError::backend_unavailable(e.to_string()))?
            .finish())
    }

    /// Key of the object at a native path.
    fn object_key(&self, path: &str) -> String {
        format!("{}{path}", self.key_prefix)
    }

    /// Listing prefix of the folder at a native path.
    fn folder_key(&self, path: &str) -> String {
        let key = if path.is_empty() {
            self.key_prefix.clone()
        } else {
            format!("{}{path}{SEPARATOR}", self.key_prefix)
        };
        if key.is_empty() { SEPARATOR.to_string() } else { key }
    }

    /// Native path of a listed entry, if it is a direct child of `folder_key`.
    fn child_path(&self, folder_key: &str, entry: &Entry) -> Option<String> {
        let key = entry.path().trim_start_matches(SEPARATOR);
        let folder_key = folder_key.trim_start_matches(SEPARATOR);
        let name = key
            .strip_prefix(folder_key)?
            .trim_end_matches(SEPARATOR);
        if name.is_empty() || name.contains(SEPARATOR) {
            return None;
        }

        let path = key
            .strip_prefix(self.key_prefix.as_str())?
            .trim_end_matches(SEPARATOR)
            .to_string();
        codec::validate_path(&path).ok()?;
        Some(path)
    }

    /// Decode a file identifier and stat its object.
    async fn resolve_file(&self, identifier: &str) -> Result<(String, Metadata), StorageError> {
        let path = codec::decode(identifier)?;
        if path.is_empty() {
            return Err(StorageError::not_found(path));
        }

        let key = self.object_key(&path);
        let metadata = self
            .operator
            .stat(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &path))?;
        if metadata.is_dir() {
            return Err(StorageError::not_found(path));
        }
        Ok((path, metadata))
    }

    /// Decode a folder identifier and list its direct entries.
    ///
    /// A non-root prefix with no keys under it is not a folder.
    async fn list_folder(&self, identifier: &str) -> Result<(String, String, Vec<Entry>), StorageError> {
        let path = codec::decode(identifier)?;
        let folder_key = self.folder_key(&path);
        let entries = match self.operator.list(&folder_key).await {
            Ok(entries) => entries,
            // An empty prefix is still the root.
            Err(e) if path.is_empty() && e.kind() == opendal::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StorageError::from_opendal(&e, &path)),
        };
        if !path.is_empty() && entries.is_empty() {
            return Err(StorageError::not_found(path));
        }
        Ok((path, folder_key, entries))
    }

    fn describe(&self, path: &str, metadata: &Metadata) -> File {
        File::builder(path)
            .length(metadata.content_length())
            .content_hash(entity_tag(metadata))
            .last_write_time_utc(last_modified(metadata))
            .owner(self.owner.clone())
            .build()
    }
}

/// Entity tag without the surrounding quotes.
///
/// Not a content digest for multipart uploads; it still changes whenever the
/// object is rewritten, which is what clients use it for.
fn entity_tag(metadata: &Metadata) -> Option<String> {
    metadata
        .etag()
        .map(|tag| tag.trim_matches('"').to_string())
        .filter(|tag| !tag.is_empty())
}

/// Last write time; the epoch when the store reports none.
fn last_modified(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .last_modified()
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |t| {
            DateTime::<Utc>::from(SystemTime::from(t))
        })
}

/// Whether a listed object is served: non-empty and of a document type.
fn is_served_document(name: &str, length: u64) -> bool {
    let extension = codec::extension(name);
    length > 0
        && DOCUMENT_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
}

/// Listings may omit size and time; those entries are re-read with `stat`.
fn is_partial(metadata: &Metadata) -> bool {
    metadata.content_length() == 0 && metadata.last_modified().is_none()
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    async fn get_file(&self, identifier: &str) -> Result<File, StorageError> {
        let (path, metadata) = self.resolve_file(identifier).await?;
        debug!(path = %path, length = metadata.content_length(), "Described object");
        Ok(self.describe(&path, &metadata))
    }

    async fn get_folder(&self, identifier: &str) -> Result<Folder, StorageError> {
        let (path, _, _) = self.list_folder(identifier).await?;
        if path.is_empty() {
            return Ok(self.root());
        }
        Ok(Folder::at(&path))
    }

    async fn list_files(&self, folder_identifier: &str) -> Result<Vec<File>, StorageError> {
        let (path, folder_key, entries) = self.list_folder(folder_identifier).await?;

        let mut files = Vec::new();
        for entry in &entries {
            if !entry.metadata().is_file() {
                continue;
            }
            let Some(child) = self.child_path(&folder_key, entry) else {
                continue;
            };
            if codec::extension(&child).is_empty() {
                continue;
            }

            let file = if is_partial(entry.metadata()) {
                match self.operator.stat(entry.path()).await {
                    Ok(metadata) => self.describe(&child, &metadata),
                    // Deleted since the listing.
                    Err(e) if e.kind() == opendal::ErrorKind::NotFound => continue,
                    Err(e) => return Err(StorageError::from_opendal(&e, &child)),
                }
            } else {
                self.describe(&child, entry.metadata())
            };

            if is_served_document(&file.name, file.length) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(folder = %path, count = files.len(), "Listed objects");
        Ok(files)
    }

    async fn list_folders(&self, folder_identifier: &str) -> Result<Vec<Folder>, StorageError> {
        let (path, folder_key, entries) = self.list_folder(folder_identifier).await?;

        let mut folders: Vec<Folder> = entries
            .iter()
            .filter(|entry| entry.metadata().is_dir())
            .filter_map(|entry| self.child_path(&folder_key, entry))
            .map(|child| Folder::at(&child))
            .collect();

        folders.sort_by(|a, b| a.name.cmp(&b.name));
        folders.dedup();
        debug!(folder = %path, count = folders.len(), "Listed prefixes");
        Ok(folders)
    }

    async fn read_stream(&self, identifier: &str) -> Result<ByteStream, StorageError> {
        let (path, _) = self.resolve_file(identifier).await?;
        let stream = self
            .operator
            .reader(&self.object_key(&path))
            .await
            .map_err(|e| StorageError::from_opendal(&e, &path))?
            .into_bytes_stream(..)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &path))?;
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn write_stream(
        &self,
        identifier: &str,
        mut content: ByteStream,
    ) -> Result<(), StorageError> {
        let (path, _) = self.resolve_file(identifier).await?;

        // Single PUT: readers see the old object or the new one, never a mix.
        let mut body = Vec::new();
        content
            .read_to_end(&mut body)
            .await
            .map_err(|e| StorageError::from_io(&e, &path))?;
        drop(content);

        let length = body.len();
        self.operator
            .write(&self.object_key(&path), body)
            .await
            .map_err(|e| {
                error!(path = %path, error = %e, "Failed to put object");
                StorageError::from_opendal(&e, &path)
            })?;

        debug!(path = %path, bytes = length, "Replaced object");
        Ok(())
    }

    fn root(&self) -> Folder {
        Folder::root(self.root_name.clone())
    }

    fn backend_name(&self) -> &'static str {
        "object_store"
    }
}
