use chrono::Utc;
use db::{
    DatabaseConnection, DbErr, TransactionTrait,
    models::gallery_image::{CreateGalleryImage, GalleryImage},
};
use thiserror::Error;
use uuid::Uuid;

use super::{
    blob_store::{BlobCategory, BlobRemoval, BlobStore, BlobStoreError, StoredBlob},
    upload::{IncomingFile, MAX_GALLERY_FILES, UploadError},
};

pub const DEFAULT_TITLE_PREFIX: &str = "Uploaded Image";

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error("Image not found")]
    NotFound,
    #[error("Image record deleted but blob {key} could not be removed: {source}")]
    BlobCleanup {
        key: String,
        #[source]
        source: BlobStoreError,
    },
}

#[derive(Debug, Clone)]
pub struct GalleryService {
    blobs: BlobStore,
}

impl GalleryService {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }

    pub async fn list(&self, db: &DatabaseConnection) -> Result<Vec<GalleryImage>, GalleryError> {
        Ok(GalleryImage::find_all(db).await?)
    }

    /// Store every file and insert one record per file. Either all records
    /// are created or none are, and blobs written for a failed request are
    /// removed again.
    pub async fn create(
        &self,
        db: &DatabaseConnection,
        files: Vec<IncomingFile>,
        title: Option<&str>,
    ) -> Result<Vec<GalleryImage>, GalleryError> {
        if files.is_empty() {
            return Err(UploadError::NoFilesProvided.into());
        }
        if files.len() > MAX_GALLERY_FILES {
            return Err(UploadError::TooManyFiles {
                max: MAX_GALLERY_FILES,
            }
            .into());
        }

        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let stamp = Utc::now().timestamp_millis();
        let batch = files.len();

        let mut stored: Vec<StoredBlob> = Vec::with_capacity(batch);
        for file in &files {
            match self.blobs.put(BlobCategory::Gallery, file).await {
                Ok(blob) => stored.push(blob),
                Err(err) => {
                    self.discard(&stored).await;
                    return Err(err.into());
                }
            }
        }

        let inserted = async {
            let tx = db.begin().await?;
            let mut images = Vec::with_capacity(batch);
            for (index, blob) in stored.iter().enumerate() {
                let title = match title {
                    Some(title) => title.to_string(),
                    None => default_title(stamp, index, batch),
                };
                let data = CreateGalleryImage {
                    url: blob.url.clone(),
                    title,
                    blob_key: blob.key.clone(),
                };
                images.push(GalleryImage::create(&tx, &data).await?);
            }
            tx.commit().await?;
            Ok::<_, DbErr>(images)
        }
        .await;

        match inserted {
            Ok(images) => {
                tracing::info!("Stored {} gallery image(s)", images.len());
                Ok(images)
            }
            Err(err) => {
                self.discard(&stored).await;
                Err(err.into())
            }
        }
    }

    /// Remove the record, then its blob. A blob that is already gone is only
    /// logged; any other blob failure is returned after the record is gone.
    pub async fn delete(&self, db: &DatabaseConnection, id: Uuid) -> Result<GalleryImage, GalleryError> {
        let image = GalleryImage::delete(db, id)
            .await?
            .ok_or(GalleryError::NotFound)?;

        match self.blobs.delete(&image.blob_key).await {
            Ok(BlobRemoval::Removed) => {}
            Ok(BlobRemoval::AlreadyMissing) => {
                tracing::warn!(image_id = %id, key = %image.blob_key, "Gallery blob was already missing");
            }
            Err(source) => {
                return Err(GalleryError::BlobCleanup {
                    key: image.blob_key,
                    source,
                });
            }
        }

        Ok(image)
    }

    async fn discard(&self, stored: &[StoredBlob]) {
        for blob in stored {
            if let Err(err) = self.blobs.delete(&blob.key).await {
                tracing::warn!(key = %blob.key, error = %err, "Failed to discard blob from failed upload");
            }
        }
    }
}

fn default_title(stamp: i64, index: usize, batch: usize) -> String {
    if batch > 1 {
        format!("{DEFAULT_TITLE_PREFIX} {stamp} #{}", index + 1)
    } else {
        format!("{DEFAULT_TITLE_PREFIX} {stamp}")
    }
}
