use axum::{
    Router,
    extract::{Multipart, Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::gallery_image::GalleryImage;
use deployment::Deployment;
use services::services::{
    gallery::GalleryError,
    upload::{MAX_GALLERY_FILES, UploadError},
};
use utils_core::response::MessageResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, routes::upload::read_image};

pub async fn list_gallery(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<Vec<GalleryImage>>, ApiError> {
    let images = deployment
        .gallery()
        .list(&deployment.db().pool)
        .await
        .map_err(|err| ApiError::from(err).context("Error fetching images"))?;
    Ok(ResponseJson(images))
}

/// Accepts up to ten files under `images` (or `images[]`) plus an optional
/// shared `title`. Every file is validated before any of them is stored.
pub async fn upload_gallery(
    State(deployment): State<DeploymentImpl>,
    mut multipart: Multipart,
) -> Result<ResponseJson<Vec<GalleryImage>>, ApiError> {
    let policy = *deployment.upload_policy();
    let mut files = Vec::new();
    let mut title = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("images") | Some("images[]") => {
                let Some(file) = read_image(field, &policy).await? else {
                    continue;
                };
                if files.len() == MAX_GALLERY_FILES {
                    return Err(UploadError::TooManyFiles {
                        max: MAX_GALLERY_FILES,
                    }
                    .into());
                }
                files.push(file);
            }
            Some("title") => title = Some(field.text().await?),
            _ => {}
        }
    }

    let images = deployment
        .gallery()
        .create(&deployment.db().pool, files, title.as_deref())
        .await
        .map_err(|err| ApiError::from(err).context("Error uploading images"))?;
    Ok(ResponseJson(images))
}

pub async fn delete_gallery_image(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| GalleryError::NotFound)?;
    deployment
        .gallery()
        .delete(&deployment.db().pool, id)
        .await
        .map_err(|err| ApiError::from(err).context("Error deleting image"))?;
    Ok(ResponseJson(MessageResponse::new("Image deleted")))
}

pub fn public_router() -> Router<DeploymentImpl> {
    Router::new().route("/gallery", get(list_gallery))
}

pub fn admin_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/uploadgallery", post(upload_gallery))
        .route("/gallery/{id}", delete(delete_gallery_image))
}
