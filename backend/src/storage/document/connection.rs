use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Collection holding one YAML document per category
pub const CATEGORIES: &str = "categories";
/// Collection holding cash flow records, written by the cash flow subsystem
pub const CASH_FLOWS: &str = "cash_flows";

const DOCUMENT_EXTENSION: &str = "yaml";

/// DocumentConnection manages the on-disk layout of the document store
///
/// Every collection is a directory under the base directory and every
/// document is a single YAML file named after its key.
#[derive(Clone)]
pub struct DocumentConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentConnection {
    /// Open a document store rooted at `base_directory`, creating the collection
    /// directories if they don't exist
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        for collection in [CATEGORIES, CASH_FLOWS] {
            let dir = base_path.join(collection);
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create collection directory {:?}", dir))?;
            }
        }

        info!(path = ?base_path, "Opened document store");

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn collection_directory(&self, collection: &str) -> PathBuf {
        self.base_directory.join(collection)
    }

    /// Serialise mutations across every repository sharing this connection
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Keys become file names, so only a conservative character set is accepted
    fn document_path(&self, collection: &str, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return None;
        }
        Some(
            self.collection_directory(collection)
                .join(format!("{}.{}", key, DOCUMENT_EXTENSION)),
        )
    }

    /// Read a single document. Missing documents and unusable keys read as `None`.
    pub async fn read_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(path) = self.document_path(collection, key) else {
            debug!(collection, key, "Rejected document key");
            return Ok(None);
        };

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
        };

        let document = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(Some(document))
    }

    /// Read every document in a collection
    ///
    /// Files without the document extension are ignored. A document that fails
    /// to parse is an error: callers count and guard on these collections.
    pub async fn read_collection<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let dir = self.collection_directory(collection);
        let mut documents = Vec::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?dir, "Collection directory doesn't exist, returning empty list");
                return Ok(documents);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to list {:?}", dir)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                // Removed between listing and reading
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
            };

            let document = serde_yaml::from_str(&content).map_err(|e| {
                warn!(?path, error = %e, "Unreadable document in collection");
                anyhow::Error::new(e).context(format!("Failed to parse {:?}", path))
            })?;
            documents.push(document);
        }

        Ok(documents)
    }

    /// Write a document through a temporary file and an atomic rename
    pub async fn write_document<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        document: &T,
    ) -> Result<()> {
        let path = self
            .document_path(collection, key)
            .ok_or_else(|| anyhow::anyhow!("Invalid document key: {:?}", key))?;
        let temp_path = path.with_extension(format!("{}.tmp", DOCUMENT_EXTENSION));

        let content = serde_yaml::to_string(document)?;
        fs::write(&temp_path, content)
            .await
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to move {:?} into place", temp_path))?;

        debug!(collection, key, "Wrote document");
        Ok(())
    }

    /// Remove a document. Returns false if it did not exist.
    pub async fn remove_document(&self, collection: &str, key: &str) -> Result<bool> {
        let Some(path) = self.document_path(collection, key) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
        }
    }

    /// Remove every document in a collection, keeping the directory
    pub async fn clear_collection(&self, collection: &str) -> Result<u64> {
        let dir = self.collection_directory(collection);
        let mut removed = 0;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {:?}", dir)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {:?}", path))?;
                removed += 1;
            }
        }

        info!(collection, removed, "Cleared collection");
        Ok(removed)
    }
}
