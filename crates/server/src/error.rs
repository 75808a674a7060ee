use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{gallery::GalleryError, team::TeamError, upload::UploadError};
use thiserror::Error;
use utils_core::response::MessageResponse;

pub const MISSING_TEAM_FIELDS: &str = "Name, role, and image are required.";
pub const NO_IMAGES: &str = "Please upload at least one image.";

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Team(#[from] TeamError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    /// A server-side failure reported to the client under the message of the
    /// operation that failed.
    #[error("{message}: {source}")]
    Failed {
        message: &'static str,
        #[source]
        source: Box<ApiError>,
    },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Replace the client-facing message of a 5xx error. Client errors and
    /// blob cleanup failures keep their own message.
    pub fn context(self, message: &'static str) -> Self {
        let (status, _) = self.classify();
        if status.is_server_error() && !self.is_blob_cleanup() {
            ApiError::Failed {
                message,
                source: Box::new(self),
            }
        } else {
            self
        }
    }

    fn is_blob_cleanup(&self) -> bool {
        matches!(
            self,
            ApiError::Gallery(GalleryError::BlobCleanup { .. })
                | ApiError::Team(TeamError::BlobCleanup { .. })
        )
    }

    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Gallery(err) => match err {
                GalleryError::Upload(err) => upload_status(err),
                GalleryError::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
                GalleryError::BlobCleanup { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "BlobCleanupFailed")
                }
                GalleryError::BlobStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BlobStoreError"),
                GalleryError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Team(err) => match err {
                TeamError::Upload(err) => upload_status(err),
                TeamError::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
                TeamError::BlobCleanup { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "BlobCleanupFailed")
                }
                TeamError::BlobStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BlobStoreError"),
                TeamError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Upload(err) => upload_status(err),
            // 413 when the body outgrew the request limit, 400 for malformed input.
            ApiError::Multipart(err) => (err.status(), "MultipartError"),
            ApiError::Failed { source, .. } => (StatusCode::INTERNAL_SERVER_ERROR, source.classify().1),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "InvalidCredentials"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Gallery(GalleryError::Upload(err))
            | ApiError::Team(TeamError::Upload(err))
            | ApiError::Upload(err) => upload_message(err),
            ApiError::Gallery(GalleryError::NotFound) => "Image not found".to_string(),
            ApiError::Team(TeamError::NotFound) => "Team member not found".to_string(),
            ApiError::Gallery(GalleryError::BlobCleanup { .. }) => {
                "Image deleted, but its file could not be removed".to_string()
            }
            ApiError::Team(TeamError::BlobCleanup { .. }) => {
                "Team member deleted, but their photo could not be removed".to_string()
            }
            ApiError::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Upload is too large.".to_string()
            }
            ApiError::Multipart(_) => {
                "Failed to read upload. Please ensure the form is valid and try again.".to_string()
            }
            ApiError::Failed { message, .. } => message.to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Gallery(_) | ApiError::Team(_) => "Internal server error".to_string(),
        }
    }
}

fn upload_status(err: &UploadError) -> (StatusCode, &'static str) {
    match err {
        UploadError::InvalidFileType(_) => (StatusCode::BAD_REQUEST, "InvalidFileType"),
        UploadError::FileTooLarge { .. } => (StatusCode::BAD_REQUEST, "FileTooLarge"),
        UploadError::NoFilesProvided => (StatusCode::BAD_REQUEST, "NoFilesProvided"),
        UploadError::TooManyFiles { .. } => (StatusCode::BAD_REQUEST, "TooManyFiles"),
        UploadError::MissingField(_) => (StatusCode::BAD_REQUEST, "MissingField"),
        UploadError::DuplicateFile(_) => (StatusCode::BAD_REQUEST, "DuplicateFile"),
    }
}

fn upload_message(err: &UploadError) -> String {
    match err {
        UploadError::InvalidFileType(_) => {
            "This file type is not supported. Please upload a JPEG, PNG, or GIF image.".to_string()
        }
        UploadError::FileTooLarge { size, max } => format!(
            "This image is too large ({:.1} MB). Maximum file size is {:.1} MB.",
            *size as f64 / 1_048_576.0,
            *max as f64 / 1_048_576.0
        ),
        UploadError::NoFilesProvided => NO_IMAGES.to_string(),
        UploadError::TooManyFiles { max } => format!("At most {max} images can be uploaded at once."),
        UploadError::MissingField(_) => MISSING_TEAM_FIELDS.to_string(),
        UploadError::DuplicateFile(field) => format!("Only one {field} can be uploaded."),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.classify();
        let error_message = self.client_message();

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        (status_code, Json(MessageResponse::new(error_message))).into_response()
    }
}
