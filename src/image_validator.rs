// src/image_validator.rs
use std::fmt;

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF87_SIGNATURE: &[u8] = b"GIF87a";
const GIF89_SIGNATURE: &[u8] = b"GIF89a";

#[derive(Debug, Clone)]
pub struct ImageValidationError {
    pub error_type: ImageErrorType,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageErrorType {
    EmptyFile,
    CorruptedFile,
    WrongFormat,
    UnreadableFile,
}

impl ImageErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "IMAGE_EMPTY",
            Self::CorruptedFile => "IMAGE_CORRUPTED",
            Self::WrongFormat => "IMAGE_WRONG_FORMAT",
            Self::UnreadableFile => "IMAGE_UNREADABLE",
        }
    }
}

impl fmt::Display for ImageValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.error_type.code())
    }
}

impl std::error::Error for ImageValidationError {}

pub struct ImageValidator;

impl ImageValidator {
    /// MIME type from the file signature, if it is one the preview can embed
    pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some("image/png")
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some("image/jpeg")
        } else if bytes.starts_with(GIF87_SIGNATURE) || bytes.starts_with(GIF89_SIGNATURE) {
            Some("image/gif")
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some("image/webp")
        } else {
            None
        }
    }

    /// Check that a photo can be drawn by the rasterizer.
    ///
    /// Uploads are never rejected; this only runs at export time so a broken
    /// photo fails the export with a readable reason instead of a compiler dump.
    pub fn validate_for_raster(bytes: &[u8], mime: &str) -> Result<(), ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError {
                error_type: ImageErrorType::EmptyFile,
                message: "Profile photo is empty".to_string(),
                suggestion: "Upload the photo again".to_string(),
            });
        }

        if bytes.len() < 8 {
            return Err(ImageValidationError {
                error_type: ImageErrorType::CorruptedFile,
                message: "Profile photo is too small or corrupted".to_string(),
                suggestion: "Please upload a valid image file".to_string(),
            });
        }

        match (mime, Self::sniff_mime(bytes)) {
            (_, None) => Err(ImageValidationError {
                error_type: ImageErrorType::WrongFormat,
                message: format!("Unsupported photo format: {}", mime),
                suggestion: "Please use PNG, JPEG, GIF or WebP".to_string(),
            }),
            (declared, Some(actual)) if declared != actual => Err(ImageValidationError {
                error_type: ImageErrorType::WrongFormat,
                message: format!("Photo is {} but was declared as {}", actual, declared),
                suggestion: "Upload the photo again so its type is detected".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_mime() {
        assert_eq!(
            ImageValidator::sniff_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
        assert_eq!(
            ImageValidator::sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
        assert_eq!(ImageValidator::sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(
            ImageValidator::sniff_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            Some("image/webp")
        );
        assert_eq!(ImageValidator::sniff_mime(b"<svg></svg>"), None);
    }

    #[test]
    fn test_validate_for_raster() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49];
        assert!(ImageValidator::validate_for_raster(&jpeg, "image/jpeg").is_ok());

        let err = ImageValidator::validate_for_raster(&[], "image/png").unwrap_err();
        assert_eq!(err.error_type, ImageErrorType::EmptyFile);

        let err = ImageValidator::validate_for_raster(&jpeg, "image/png").unwrap_err();
        assert_eq!(err.error_type, ImageErrorType::WrongFormat);

        let err =
            ImageValidator::validate_for_raster(b"plain text file", "text/plain").unwrap_err();
        assert_eq!(err.error_type.code(), "IMAGE_WRONG_FORMAT");
    }
}
