use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    blob_store::{BlobStore, BlobStoreError},
    cleanup::CleanupError,
    config::{Config, ConfigError},
    gallery::GalleryService,
    team::TeamService,
    upload::UploadPolicy,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

/// Everything a request handler may touch. Built once before the server
/// starts and shared through router state.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: Config) -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<Config>;

    fn db(&self) -> &DBService;

    fn blobs(&self) -> &BlobStore;

    fn upload_policy(&self) -> &UploadPolicy;

    fn gallery(&self) -> &GalleryService;

    fn team(&self) -> &TeamService;
}
