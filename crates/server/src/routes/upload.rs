use axum::extract::multipart::Field;
use bytes::BytesMut;
use services::services::upload::{IncomingFile, UploadPolicy};

use crate::error::ApiError;

/// Read one file part into memory. The declared type is checked before any
/// bytes are read and the size limit while the part streams in, so a rejected
/// file is never buffered in full.
///
/// Browsers submit an empty file input as a part with an empty file name;
/// that yields `None`.
pub async fn read_image(
    mut field: Field<'_>,
    policy: &UploadPolicy,
) -> Result<Option<IncomingFile>, ApiError> {
    let original_name = field.file_name().map(str::to_owned);
    if original_name.as_deref() == Some("") {
        return Ok(None);
    }

    let kind = policy.check_type(field.content_type())?;

    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        policy.check_size((buf.len() + chunk.len()) as u64)?;
        buf.extend_from_slice(&chunk);
    }

    Ok(Some(IncomingFile {
        original_name,
        kind,
        bytes: buf.freeze(),
    }))
}
