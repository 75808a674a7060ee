use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_GALLERY_FILES: usize = 10;
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },
    #[error("No files provided")]
    NoFilesProvided,
    #[error("Too many files: at most {max} per upload")]
    TooManyFiles { max: usize },
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Only one {0} file may be uploaded")]
    DuplicateFile(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Parses a declared content type, ignoring case and any `;` parameters.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Gif => ".gif",
        }
    }

    /// File extensions (lowercase, without the dot) a stored blob of this
    /// kind may carry. Static serving derives the response type from it.
    pub fn allows_extension(self, ext: &str) -> bool {
        match self {
            Self::Jpeg => matches!(ext, "jpg" | "jpeg"),
            Self::Png => ext == "png",
            Self::Gif => ext == "gif",
        }
    }
}

/// A validated upload, held in memory until it is written to the blob store.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: Option<String>,
    pub kind: ImageKind,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check_type(&self, content_type: Option<&str>) -> Result<ImageKind, UploadError> {
        let declared = content_type.unwrap_or_default();
        ImageKind::from_content_type(declared)
            .ok_or_else(|| UploadError::InvalidFileType(declared.to_string()))
    }

    pub fn check_size(&self, size: u64) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Type first, then size: a disallowed type is reported as such even when
    /// it is also oversized.
    pub fn validate(&self, content_type: Option<&str>, size: u64) -> Result<ImageKind, UploadError> {
        let kind = self.check_type(content_type)?;
        self.check_size(size)?;
        Ok(kind)
    }

    pub fn accept(
        &self,
        original_name: Option<String>,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<IncomingFile, UploadError> {
        let kind = self.validate(content_type, bytes.len() as u64)?;
        Ok(IncomingFile {
            original_name,
            kind,
            bytes,
        })
    }
}

/// `<unix-millis>-<8 hex><ext>`. The random part keeps two uploads landing in
/// the same millisecond apart.
pub fn stored_file_name(original_name: Option<&str>, kind: ImageKind) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        &token[..8],
        file_extension(original_name, kind)
    )
}

fn file_extension(original_name: Option<&str>, kind: ImageKind) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| kind.allows_extension(ext))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| kind.extension().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_three_image_types() {
        let policy = UploadPolicy::default();
        for mime in ALLOWED_MIME_TYPES {
            assert!(policy.validate(Some(mime), 10).is_ok(), "{mime}");
        }
        assert_eq!(
            policy.validate(Some("IMAGE/PNG; charset=binary"), 10).unwrap(),
            ImageKind::Png
        );

        for mime in ["application/pdf", "image/webp", "text/plain", ""] {
            assert!(matches!(
                policy.validate(Some(mime), 10),
                Err(UploadError::InvalidFileType(_))
            ));
        }
        assert!(matches!(
            policy.validate(None, 10),
            Err(UploadError::InvalidFileType(_))
        ));
    }

    #[test]
    fn enforces_size_limit_inclusively() {
        let policy = UploadPolicy::new(100);
        assert!(policy.validate(Some("image/gif"), 100).is_ok());
        assert!(matches!(
            policy.validate(Some("image/gif"), 101),
            Err(UploadError::FileTooLarge { size: 101, max: 100 })
        ));
    }

    #[test]
    fn invalid_type_wins_over_size() {
        let policy = UploadPolicy::new(1);
        assert!(matches!(
            policy.validate(Some("application/pdf"), 1_000),
            Err(UploadError::InvalidFileType(_))
        ));
    }

    #[test]
    fn default_limit_is_ten_mebibytes() {
        assert_eq!(UploadPolicy::default().max_bytes(), 10_485_760);
    }

    #[test]
    fn stored_name_keeps_a_sane_original_extension() {
        let name = stored_file_name(Some("Campus Photo.JPEG"), ImageKind::Jpeg);
        assert!(name.ends_with(".jpeg"), "{name}");

        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 8 + ".jpeg".len());
    }

    #[test]
    fn stored_name_falls_back_to_mime_extension() {
        assert!(stored_file_name(None, ImageKind::Gif).ends_with(".gif"));
        assert!(stored_file_name(Some("noext"), ImageKind::Png).ends_with(".png"));
        assert!(stored_file_name(Some("x.p/ng"), ImageKind::Png).ends_with(".png"));
        assert!(stored_file_name(Some("weird.ext-ension"), ImageKind::Jpeg).ends_with(".jpg"));
    }

    #[test]
    fn stored_name_never_keeps_an_extension_foreign_to_the_kind() {
        assert!(stored_file_name(Some("evil.html"), ImageKind::Jpeg).ends_with(".jpg"));
        assert!(stored_file_name(Some("x.svg"), ImageKind::Png).ends_with(".png"));
        assert!(stored_file_name(Some("x.htm"), ImageKind::Gif).ends_with(".gif"));
        assert!(stored_file_name(Some("photo.png"), ImageKind::Jpeg).ends_with(".jpg"));
        assert!(stored_file_name(Some("anim.GIF"), ImageKind::Gif).ends_with(".gif"));
    }

    #[test]
    fn stored_names_do_not_collide_within_a_millisecond() {
        let names: std::collections::HashSet<String> = (0..1_000)
            .map(|_| stored_file_name(Some("same.jpg"), ImageKind::Jpeg))
            .collect();
        assert_eq!(names.len(), 1_000);
    }

    #[test]
    fn accept_wraps_bytes() {
        let file = UploadPolicy::default()
            .accept(
                Some("a.png".to_string()),
                Some("image/png"),
                Bytes::from_static(b"png"),
            )
            .unwrap();
        assert_eq!(file.kind, ImageKind::Png);
        assert_eq!(file.bytes.as_ref(), b"png");
    }
}
