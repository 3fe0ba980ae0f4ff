//! # Media Selection Module
//!
//! Questo modulo gestisce la selezione del file video da pubblicare.
//!
//! ## Responsabilità:
//! - Ispezione del file (dimensione, nome, tipo MIME)
//! - Rifiuto dei file che non sono video (`video/*`)
//! - Rifiuto dei file oltre il limite di dimensione (default 500 MB)
//! - Derivazione del titolo di default dal nome del file
//!
//! ## Esempio:
//! ```rust,ignore
//! let selector = MediaSelector::new(config.max_video_bytes);
//! let media = selector.select(&path).await?;
//! wizard.select_video(media)?;
//! ```

use crate::progress::format_size;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Motivi di rifiuto di un file da parte del selettore
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaRejection {
    #[error("Please select a video file (got {mime})")]
    NotAVideo { mime: String },

    #[error("File size exceeds the {} limit ({} selected)", human_size(.max), human_size(.size))]
    TooLarge { size: u64, max: u64 },

    #[error("The selected file is empty")]
    EmptyFile,

    #[error("Cannot read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

fn human_size(bytes: &u64) -> String {
    format_size(*bytes)
}

/// A video file as seen by the selector, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMedia {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime: String,
}

/// Validates candidate video files
#[derive(Debug, Clone)]
pub struct MediaSelector {
    max_bytes: u64,
}

impl MediaSelector {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Read file metadata and guess its MIME type from the extension
    pub async fn inspect(path: &Path) -> Result<SelectedMedia, MediaRejection> {
        let metadata = fs::metadata(path).await.map_err(|e| MediaRejection::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !metadata.is_file() {
            return Err(MediaRejection::Unreadable {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(SelectedMedia {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
            mime,
        })
    }

    /// Apply the type and size constraints to a candidate
    pub fn accept(&self, candidate: SelectedMedia) -> Result<SelectedMedia, MediaRejection> {
        if !candidate.mime.starts_with("video/") {
            return Err(MediaRejection::NotAVideo { mime: candidate.mime });
        }

        if candidate.size == 0 {
            return Err(MediaRejection::EmptyFile);
        }

        if candidate.size > self.max_bytes {
            return Err(MediaRejection::TooLarge {
                size: candidate.size,
                max: self.max_bytes,
            });
        }

        debug!(
            "Accepted {} ({}, {})",
            candidate.file_name,
            candidate.mime,
            format_size(candidate.size)
        );
        Ok(candidate)
    }

    /// Inspect then accept
    pub async fn select(&self, path: &Path) -> Result<SelectedMedia, MediaRejection> {
        let candidate = Self::inspect(path).await?;
        self.accept(candidate)
    }
}

/// Title derived from a file name: the name without its last extension
pub fn default_title(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[..idx].to_string(),
        _ => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_VIDEO_BYTES;
    use tempfile::TempDir;

    fn candidate(mime: &str, size: u64) -> SelectedMedia {
        SelectedMedia {
            path: PathBuf::from("clip.mp4"),
            file_name: "clip.mp4".to_string(),
            size,
            mime: mime.to_string(),
        }
    }

    #[test]
    fn test_rejects_non_video_mime() {
        let selector = MediaSelector::new(DEFAULT_MAX_VIDEO_BYTES);
        for mime in ["image/png", "audio/mpeg", "application/pdf", "text/plain"] {
            let result = selector.accept(candidate(mime, 1024));
            assert!(matches!(result, Err(MediaRejection::NotAVideo { .. })), "{}", mime);
        }
    }

    #[test]
    fn test_size_limit_boundary() {
        let selector = MediaSelector::new(DEFAULT_MAX_VIDEO_BYTES);
        assert!(selector.accept(candidate("video/mp4", DEFAULT_MAX_VIDEO_BYTES)).is_ok());

        let result = selector.accept(candidate("video/mp4", DEFAULT_MAX_VIDEO_BYTES + 1));
        assert_eq!(
            result,
            Err(MediaRejection::TooLarge {
                size: DEFAULT_MAX_VIDEO_BYTES + 1,
                max: DEFAULT_MAX_VIDEO_BYTES,
            })
        );
    }

    #[test]
    fn test_rejects_empty_file() {
        let selector = MediaSelector::new(DEFAULT_MAX_VIDEO_BYTES);
        assert_eq!(
            selector.accept(candidate("video/webm", 0)),
            Err(MediaRejection::EmptyFile)
        );
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title("holiday.mp4"), "holiday");
        assert_eq!(default_title("my.trip.final.mov"), "my.trip.final");
        assert_eq!(default_title("README"), "README");
        assert_eq!(default_title(".hidden"), ".hidden");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = tokio_test::block_on(MediaSelector::inspect(temp_dir.path()));
        assert!(matches!(result, Err(MediaRejection::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_select_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let video = temp_dir.path().join("demo.mp4");
        tokio::fs::write(&video, vec![0u8; 2048]).await.unwrap();
        let text = temp_dir.path().join("notes.txt");
        tokio::fs::write(&text, b"hello").await.unwrap();

        let selector = MediaSelector::new(DEFAULT_MAX_VIDEO_BYTES);
        let media = selector.select(&video).await.unwrap();
        assert_eq!(media.file_name, "demo.mp4");
        assert_eq!(media.size, 2048);
        assert_eq!(media.mime, "video/mp4");

        assert!(matches!(
            selector.select(&text).await,
            Err(MediaRejection::NotAVideo { .. })
        ));
        assert!(matches!(
            selector.select(&temp_dir.path().join("missing.mp4")).await,
            Err(MediaRejection::Unreadable { .. })
        ));
    }
}
