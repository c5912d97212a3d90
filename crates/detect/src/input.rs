//! Detection inputs.

use crate::ocr::ImagePayload;
use cue_core::AppResult;
use std::path::Path;

/// What a detection call is asked to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionInput {
    /// Text to analyze directly
    Text(String),

    /// Image to run through OCR first
    Image(ImagePayload),

    /// Bytes of a type the detector cannot read
    Unsupported { mime_type: String },
}

impl DetectionInput {
    pub fn text(text: impl Into<String>) -> Self {
        DetectionInput::Text(text.into())
    }

    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        DetectionInput::Image(ImagePayload::new(mime_type, data))
    }

    /// Classify raw bytes by MIME type.
    ///
    /// `text/*` is decoded as UTF-8 (lossily), `image/*` goes to OCR, and
    /// everything else is unsupported.
    pub fn from_bytes(mime_type: &str, data: Vec<u8>) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim()
            .to_lowercase();

        if essence.starts_with("text/") {
            DetectionInput::Text(String::from_utf8_lossy(&data).into_owned())
        } else if essence.starts_with("image/") {
            DetectionInput::Image(ImagePayload::new(essence, data))
        } else {
            DetectionInput::Unsupported {
                mime_type: essence,
            }
        }
    }

    /// Read a file, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(guess_mime_type(path), data))
    }

    /// Short label used in logs and result metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionInput::Text(_) => "text",
            DetectionInput::Image(_) => "image",
            DetectionInput::Unsupported { .. } => "unsupported",
        }
    }
}

impl From<&str> for DetectionInput {
    fn from(text: &str) -> Self {
        DetectionInput::Text(text.to_string())
    }
}

impl From<String> for DetectionInput {
    fn from(text: String) -> Self {
        DetectionInput::Text(text)
    }
}

/// MIME type for a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "text" | "md" | "markdown" | "log" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_bytes_by_mime() {
        assert_eq!(
            DetectionInput::from_bytes("text/plain; charset=utf-8", b"Why us?".to_vec()),
            DetectionInput::text("Why us?")
        );
        assert!(matches!(
            DetectionInput::from_bytes("IMAGE/PNG", vec![1]),
            DetectionInput::Image(ref img) if img.mime_type == "image/png"
        ));
        assert_eq!(
            DetectionInput::from_bytes("application/pdf", vec![1]).kind(),
            "unsupported"
        );
    }

    #[test]
    fn test_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let notes = temp_dir.path().join("notes.md");
        fs::write(&notes, "What is a monad?").unwrap();
        let shot = temp_dir.path().join("shot.PNG");
        fs::write(&shot, [0x89, b'P', b'N', b'G']).unwrap();

        assert_eq!(
            DetectionInput::from_path(&notes).unwrap(),
            DetectionInput::text("What is a monad?")
        );
        assert_eq!(DetectionInput::from_path(&shot).unwrap().kind(), "image");
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(DetectionInput::from_path(Path::new("/definitely/not/here.txt")).is_err());
    }
}
