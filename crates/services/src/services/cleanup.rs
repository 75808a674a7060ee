use std::collections::HashSet;

use db::{
    ConnectionTrait, DbErr,
    models::{gallery_image::GalleryImage, team_member::TeamMember},
};
use thiserror::Error;

use super::blob_store::{BlobCategory, BlobStore, BlobStoreError};

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
}

/// Delete every blob no record points at. Orphans are left behind when a
/// process dies between a record delete and its blob delete, or when a blob
/// delete fails.
///
/// Nothing is deleted while both tables are empty: stored files next to an
/// empty database usually mean the database was swapped, not that every
/// upload is orphaned.
pub async fn sweep_orphan_blobs<C: ConnectionTrait>(
    db: &C,
    blobs: &BlobStore,
) -> Result<usize, CleanupError> {
    let mut referenced: HashSet<String> = GalleryImage::blob_keys(db).await?.into_iter().collect();
    referenced.extend(TeamMember::blob_keys(db).await?);

    let mut orphans = Vec::new();
    for category in BlobCategory::ALL {
        orphans.extend(
            blobs
                .list(category)
                .await?
                .into_iter()
                .filter(|key| !referenced.contains(key)),
        );
    }

    if referenced.is_empty() && !orphans.is_empty() {
        tracing::warn!(
            blobs = orphans.len(),
            "Database has no records but the upload directory has files; skipping orphan sweep"
        );
        return Ok(0);
    }

    let mut removed = 0;
    for key in orphans {
        match blobs.delete(&key).await {
            Ok(_) => removed += 1,
            Err(err) => tracing::warn!(key = %key, error = %err, "Failed to remove orphan blob"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, "Removed orphan blobs");
    }
    Ok(removed)
}
