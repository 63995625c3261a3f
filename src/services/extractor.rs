//! Text extraction from images.
//!
//! The OCR engine is an external collaborator. The maintainer only sees the
//! [`TextExtractor`] trait; [`TesseractExtractor`] drives the `tesseract`
//! command-line engine.

use crate::error::{ExtractError, ExtractResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Produces text from an image file.
///
/// Implementations may block; the maintainer calls them from the blocking
/// thread pool.
pub trait TextExtractor: Send + Sync {
    /// Extracts text from the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns an `ExtractError` if the file cannot be read, is not an image
    /// the engine understands, or the engine itself fails.
    fn extract(&self, path: &Path) -> ExtractResult<String>;
}

/// Image extensions tesseract (via leptonica) can decode.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "pbm", "pgm", "ppm", "pnm",
];

/// Extractor that shells out to `tesseract <image> stdout`.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    binary: PathBuf,
    language: Option<String>,
}

impl TesseractExtractor {
    /// Uses `tesseract` from `PATH` with the engine's default language.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: None,
        }
    }

    /// Uses a specific tesseract binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Passes `-l <language>` to the engine.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn check_supported(path: &Path) -> ExtractResult<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(ExtractError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<String> {
        Self::check_supported(path)?;

        // Surface unreadable files as such rather than as an engine error
        File::open(path).map_err(|source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg(path).arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }

        debug!(path = %path.display(), binary = %self.binary.display(), "Running OCR");

        let output = cmd.output().map_err(|e| ExtractError::Engine {
            path: path.to_path_buf(),
            message: format!("failed to run {}: {e}", self.binary.display()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Engine {
                path: path.to_path_buf(),
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_extension() {
        let extractor = TesseractExtractor::new();
        let err = extractor.extract(Path::new("/tmp/diagram.svg")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let extractor = TesseractExtractor::new();
        let err = extractor
            .extract(&dir.path().join("ghost.png"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable { .. }));
    }

    #[test]
    fn test_missing_binary_is_engine_error() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("shot.png");
        std::fs::write(&image, b"not really a png").unwrap();

        let extractor =
            TesseractExtractor::new().with_binary(dir.path().join("no-such-tesseract"));
        let err = extractor.extract(&image).unwrap_err();
        assert_eq!(err.code(), "ENGINE_ERROR");
    }
}
