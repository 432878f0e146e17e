use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::ImageError;
use crate::provider::ImageAttachment;

/// Resolve an image path as written in the document against the document's
/// own directory. The path is brought to NFC so decomposed spellings find
/// files saved under composed names. Absolute paths are kept as they are.
pub fn resolve_image_path(document_dir: &Path, raw: &str) -> PathBuf {
    let raw: String = raw.trim().nfc().collect();
    let path = Path::new(&raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        document_dir.join(path)
    }
}

/// Check that the referenced file exists, decodes as an image and fits under
/// `max_size`, then read it.
pub fn load_image(
    raw_path: &str,
    resolved: &Path,
    max_size: u64,
) -> Result<ImageAttachment, ImageError> {
    if !resolved.is_file() {
        return Err(ImageError::Missing {
            raw_path: raw_path.to_string(),
            resolved: resolved.to_path_buf(),
            location: snafu::Location::default(),
        });
    }

    let invalid = |message: String| ImageError::Invalid {
        raw_path: raw_path.to_string(),
        resolved: resolved.to_path_buf(),
        message,
        location: snafu::Location::default(),
    };

    let reader = image::ImageReader::open(resolved)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| invalid(e.to_string()))?;
    let Some(format) = reader.format() else {
        return Err(invalid("unrecognized image format".to_string()));
    };
    reader
        .into_dimensions()
        .map_err(|e| invalid(e.to_string()))?;

    let size = std::fs::metadata(resolved)
        .map_err(|e| invalid(e.to_string()))?
        .len();
    if size > max_size {
        return Err(ImageError::Oversized {
            resolved: resolved.to_path_buf(),
            size,
            limit: max_size,
            location: snafu::Location::default(),
        });
    }

    let bytes = std::fs::read(resolved).map_err(|e| invalid(e.to_string()))?;
    Ok(ImageAttachment {
        bytes,
        media_type: format.to_mime_type().to_string(),
    })
}
