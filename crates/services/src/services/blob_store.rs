//! Category-organized blob storage on local disk.
//!
//! Blobs are addressed by a key of the form `<category>/<file name>`, e.g.
//! `gallery/1729350000000-1a2b3c4d.jpg`, relative to the store root. The same
//! key, prefixed with `<public base url>/uploads/`, is the URL handed to
//! clients.

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

use super::upload::{IncomingFile, stored_file_name};

const MAX_NAME_ATTEMPTS: usize = 8;
pub const PUBLIC_MOUNT: &str = "/uploads";

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
    #[error("Could not find a free file name after {0} attempts")]
    NameExhausted(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobCategory {
    Gallery,
    Teams,
}

impl BlobCategory {
    pub const ALL: [BlobCategory; 2] = [BlobCategory::Gallery, BlobCategory::Teams];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Teams => "teams",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRemoval {
    Removed,
    AlreadyMissing,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    pub fn new(root: PathBuf, public_base_url: &str) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the category directories up front so static serving works
    /// before the first upload.
    pub async fn initialize(&self) -> Result<(), BlobStoreError> {
        for category in BlobCategory::ALL {
            fs::create_dir_all(self.root.join(category.dir_name())).await?;
        }
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.public_base_url, PUBLIC_MOUNT, key)
    }

    /// Resolve a key to a path under the root, refusing anything that could
    /// escape it.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let relative = Path::new(key);
        let is_clean = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_clean {
            return Err(BlobStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Write a new blob. Files are opened create-new, so an existing blob is
    /// never overwritten; a clash draws a fresh name.
    pub async fn put(
        &self,
        category: BlobCategory,
        file: &IncomingFile,
    ) -> Result<StoredBlob, BlobStoreError> {
        let dir = self.root.join(category.dir_name());
        fs::create_dir_all(&dir).await?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = stored_file_name(file.original_name.as_deref(), file.kind);
            let path = dir.join(&file_name);

            let mut handle = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(handle) => handle,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("Blob name {} taken, retrying", file_name);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let written = async {
                handle.write_all(&file.bytes).await?;
                handle.sync_all().await
            }
            .await;
            if let Err(err) = written {
                drop(handle);
                let _ = fs::remove_file(&path).await;
                return Err(err.into());
            }

            let key = format!("{}/{}", category.dir_name(), file_name);
            tracing::debug!("Wrote blob: {} ({} bytes)", key, file.bytes.len());
            return Ok(StoredBlob {
                url: self.public_url(&key),
                key,
            });
        }

        Err(BlobStoreError::NameExhausted(MAX_NAME_ATTEMPTS))
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        Ok(fs::read(self.path_for(key)?).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        Ok(fs::try_exists(self.path_for(key)?).await?)
    }

    pub async fn delete(&self, key: &str) -> Result<BlobRemoval, BlobStoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted blob: {}", key);
                Ok(BlobRemoval::Removed)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BlobRemoval::AlreadyMissing),
            Err(err) => Err(err.into()),
        }
    }

    /// Keys of every regular file in a category directory.
    pub async fn list(&self, category: BlobCategory) -> Result<Vec<String>, BlobStoreError> {
        let dir = self.root.join(category.dir_name());
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(format!("{}/{}", category.dir_name(), name));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bytes::Bytes;
    use test_support::TempRoot;

    use super::*;
    use crate::services::upload::ImageKind;

    fn jpeg(name: &str, body: &'static [u8]) -> IncomingFile {
        IncomingFile {
            original_name: Some(name.to_string()),
            kind: ImageKind::Jpeg,
            bytes: Bytes::from_static(body),
        }
    }

    async fn create_test_store() -> (BlobStore, TempRoot) {
        let temp = TempRoot::new();
        let store = BlobStore::new(temp.path().join("uploads"), "https://dept.example/");
        store.initialize().await.unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn put_then_read_is_byte_identical() {
        let (store, _temp) = create_test_store().await;

        let blob = store
            .put(BlobCategory::Gallery, &jpeg("a.jpg", b"\xff\xd8\xffjpeg"))
            .await
            .unwrap();

        assert!(blob.key.starts_with("gallery/"));
        assert!(blob.key.ends_with(".jpg"));
        assert_eq!(
            blob.url,
            format!("https://dept.example/uploads/{}", blob.key)
        );
        assert_eq!(store.read(&blob.key).await.unwrap(), b"\xff\xd8\xffjpeg");
    }

    #[tokio::test]
    async fn put_creates_missing_category_directory() {
        let temp = TempRoot::new();
        let store = BlobStore::new(temp.path().join("fresh"), "");

        let blob = store
            .put(BlobCategory::Teams, &jpeg("me.jpg", b"x"))
            .await
            .unwrap();
        assert!(blob.key.starts_with("teams/"));
        assert_eq!(blob.url, format!("/uploads/{}", blob.key));
        assert!(store.exists(&blob.key).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_puts_of_same_name_never_overwrite() {
        let (store, _temp) = create_test_store().await;

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let file = IncomingFile {
                    original_name: Some("same.jpg".to_string()),
                    kind: ImageKind::Jpeg,
                    bytes: Bytes::from(vec![i; 32]),
                };
                (i, store.put(BlobCategory::Gallery, &file).await.unwrap())
            }));
        }

        let mut keys = HashSet::new();
        for handle in handles {
            let (i, blob) = handle.await.unwrap();
            assert_eq!(store.read(&blob.key).await.unwrap(), vec![i; 32]);
            keys.insert(blob.key);
        }
        assert_eq!(keys.len(), 16);
        assert_eq!(store.list(BlobCategory::Gallery).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn delete_reports_missing_blobs() {
        let (store, _temp) = create_test_store().await;
        let blob = store
            .put(BlobCategory::Gallery, &jpeg("a.jpg", b"x"))
            .await
            .unwrap();

        assert_eq!(store.delete(&blob.key).await.unwrap(), BlobRemoval::Removed);
        assert!(!store.exists(&blob.key).await.unwrap());
        assert_eq!(
            store.delete(&blob.key).await.unwrap(),
            BlobRemoval::AlreadyMissing
        );
    }

    #[tokio::test]
    async fn rejects_keys_outside_root() {
        let (store, _temp) = create_test_store().await;
        for key in ["", "../etc/passwd", "/etc/passwd", "gallery/../../x"] {
            assert!(matches!(
                store.path_for(key),
                Err(BlobStoreError::InvalidKey(_))
            ));
        }
        assert!(store.path_for("gallery/a.jpg").is_ok());
    }

    #[tokio::test]
    async fn list_ignores_directories_and_other_categories() {
        let (store, _temp) = create_test_store().await;
        store
            .put(BlobCategory::Gallery, &jpeg("a.jpg", b"x"))
            .await
            .unwrap();
        store
            .put(BlobCategory::Teams, &jpeg("b.jpg", b"y"))
            .await
            .unwrap();
        fs::create_dir_all(store.root().join("gallery/nested"))
            .await
            .unwrap();

        let gallery = store.list(BlobCategory::Gallery).await.unwrap();
        assert_eq!(gallery.len(), 1);
        assert!(gallery[0].starts_with("gallery/"));
    }
}
