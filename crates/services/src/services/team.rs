use db::{
    DatabaseConnection, DbErr,
    models::team_member::{CreateTeamMember, TeamMember},
};
use thiserror::Error;
use uuid::Uuid;

use super::{
    blob_store::{BlobCategory, BlobRemoval, BlobStore, BlobStoreError},
    upload::{IncomingFile, UploadError},
};

#[derive(Debug, Error)]
pub enum TeamError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error("Team member not found")]
    NotFound,
    #[error("Team member deleted but blob {key} could not be removed: {source}")]
    BlobCleanup {
        key: String,
        #[source]
        source: BlobStoreError,
    },
}

/// Fields collected from an add-member form; every one is required.
#[derive(Debug, Default)]
pub struct NewTeamMember {
    pub name: Option<String>,
    pub role: Option<String>,
    pub image: Option<IncomingFile>,
}

#[derive(Debug, Clone)]
pub struct TeamService {
    blobs: BlobStore,
}

impl TeamService {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }

    pub async fn list(&self, db: &DatabaseConnection) -> Result<Vec<TeamMember>, TeamError> {
        Ok(TeamMember::find_all(db).await?)
    }

    pub async fn create(
        &self,
        db: &DatabaseConnection,
        form: NewTeamMember,
    ) -> Result<TeamMember, TeamError> {
        let name = required(form.name, "name")?;
        let role = required(form.role, "role")?;
        let image = form.image.ok_or(UploadError::MissingField("image"))?;

        let blob = self.blobs.put(BlobCategory::Teams, &image).await?;
        let data = CreateTeamMember {
            name,
            role,
            image: blob.url.clone(),
            blob_key: blob.key.clone(),
        };

        match TeamMember::create(db, &data).await {
            Ok(member) => {
                tracing::info!(member_id = %member.id, "Added team member");
                Ok(member)
            }
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete(&blob.key).await {
                    tracing::warn!(key = %blob.key, error = %cleanup, "Failed to discard team photo");
                }
                Err(err.into())
            }
        }
    }

    pub async fn delete(&self, db: &DatabaseConnection, id: Uuid) -> Result<TeamMember, TeamError> {
        let member = TeamMember::delete(db, id).await?.ok_or(TeamError::NotFound)?;

        match self.blobs.delete(&member.blob_key).await {
            Ok(BlobRemoval::Removed) => {}
            Ok(BlobRemoval::AlreadyMissing) => {
                tracing::warn!(member_id = %id, key = %member.blob_key, "Team photo was already missing");
            }
            Err(source) => {
                return Err(TeamError::BlobCleanup {
                    key: member.blob_key,
                    source,
                });
            }
        }

        Ok(member)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, UploadError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(UploadError::MissingField(field))
}
