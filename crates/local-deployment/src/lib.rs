use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use secrecy::ExposeSecret;
use services::services::{
    blob_store::BlobStore,
    cleanup::sweep_orphan_blobs,
    config::{AccessControlMode, Config},
    gallery::GalleryService,
    team::TeamService,
    upload::UploadPolicy,
};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    blobs: BlobStore,
    upload_policy: UploadPolicy,
    gallery: GalleryService,
    team: TeamService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(config.database_url.expose_secret()).await?;

        let blobs = BlobStore::new(config.upload_dir.clone(), &config.public_base_url);
        blobs.initialize().await?;

        // Runs before serving: an upload in flight has its blob on disk
        // before its record exists and would look orphaned.
        let removed = sweep_orphan_blobs(&db.pool, &blobs).await?;
        tracing::debug!(removed, "Startup orphan sweep finished");

        if config.access_control.mode() == AccessControlMode::Disabled {
            tracing::warn!("ADMIN_TOKEN is not set; upload and delete routes are unauthenticated");
        }

        let upload_policy = UploadPolicy::new(config.max_upload_bytes);

        Ok(Self {
            gallery: GalleryService::new(blobs.clone()),
            team: TeamService::new(blobs.clone()),
            config: Arc::new(config),
            db,
            blobs,
            upload_policy,
        })
    }

    fn config(&self) -> &Arc<Config> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    fn gallery(&self) -> &GalleryService {
        &self.gallery
    }

    fn team(&self) -> &TeamService {
        &self.team
    }
}
