//! # Upload Wizard Module
//!
//! Questo modulo gestisce il wizard di pubblicazione a tre step.
//!
//! ## Stati:
//! - `Upload`: nessun video selezionato
//! - `Details`: titolo, descrizione, tag, thumbnail
//! - `Review`: riepilogo e invio
//! - `Submitted`: terminale, la bozza è stata scartata
//!
//! ## Transizioni:
//! - `Upload → Details`: automatica quando un video valido viene accettato
//! - `Details → Review`: solo con titolo non vuoto E thumbnail presente
//! - `Details/Review → Upload`: "change video", azzera la selezione del video
//! - `Details → Upload` / `Review → Details`: indietro, sempre consentito
//! - `Review → Submitted`: solo dopo un upload completato
//!
//! ## Bozza (`UploadDraft`):
//! Vive quanto il wizard; nessuna persistenza. Il thumbnail croppato viene
//! scritto in un file temporaneo di anteprima, rimosso quando viene sostituito
//! o quando la bozza viene scartata.

use crate::crop::ThumbnailBlob;
use crate::error::UploadError;
use crate::media_selector::{default_title, SelectedMedia};
use crate::upload::backend::TranscriptPayload;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Step corrente del wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Upload,
    Details,
    Review,
    Submitted,
}

/// Everything the user has entered for one video
#[derive(Debug, Default)]
pub struct UploadDraft {
    video: Option<SelectedMedia>,
    video_preview: Option<PathBuf>,
    thumbnail: Option<ThumbnailBlob>,
    thumbnail_preview: Option<NamedTempFile>,
    pub title: String,
    pub description: String,
    pub tags_input: String,
    pub is_short: bool,
    pub transcript: Option<TranscriptPayload>,
}

impl UploadDraft {
    pub fn video(&self) -> Option<&SelectedMedia> {
        self.video.as_ref()
    }

    /// Local handle used to preview the selected video
    pub fn video_preview(&self) -> Option<&Path> {
        self.video_preview.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&ThumbnailBlob> {
        self.thumbnail.as_ref()
    }

    /// Temporary file holding the cropped thumbnail
    pub fn thumbnail_preview(&self) -> Option<&Path> {
        self.thumbnail_preview.as_ref().map(|file| file.path())
    }

    /// Tags parsed from the raw comma-separated input
    pub fn tags(&self) -> Vec<String> {
        parse_tags(&self.tags_input)
    }

    fn clear_video(&mut self) {
        self.video = None;
        self.video_preview = None;
    }
}

/// Split comma-separated tags, trimming and dropping empties and duplicates
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// State machine driving the upload screen
#[derive(Debug)]
pub struct WizardController {
    step: WizardStep,
    draft: UploadDraft,
    uploading: bool,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Upload,
            draft: UploadDraft::default(),
            uploading: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &UploadDraft {
        &self.draft
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    fn reject(message: impl Into<String>) -> UploadError {
        UploadError::Wizard(message.into())
    }

    fn ensure_editable(&self) -> Result<(), UploadError> {
        match self.step {
            WizardStep::Submitted => Err(Self::reject("This video has already been submitted")),
            _ if self.uploading => Err(Self::reject("An upload is already in progress")),
            _ => Ok(()),
        }
    }

    /// Accept a validated video and advance to `Details`
    pub fn select_video(&mut self, media: SelectedMedia) -> Result<(), UploadError> {
        self.ensure_editable()?;
        if self.step != WizardStep::Upload {
            return Err(Self::reject("Use \"change video\" before selecting another file"));
        }

        if self.draft.title.trim().is_empty() {
            self.draft.title = default_title(&media.file_name);
        }
        self.draft.video_preview = Some(media.path.clone());
        info!("Selected video: {}", media.file_name);
        self.draft.video = Some(media);
        self.step = WizardStep::Details;
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.draft.title = title.to_string();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.draft.description = description.to_string();
        Ok(())
    }

    pub fn set_tags_input(&mut self, raw: &str) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.draft.tags_input = raw.to_string();
        Ok(())
    }

    pub fn set_short(&mut self, is_short: bool) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.draft.is_short = is_short;
        Ok(())
    }

    pub fn set_transcript(&mut self, transcript: Option<TranscriptPayload>) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.draft.transcript = transcript.filter(|t| !t.text.trim().is_empty());
        Ok(())
    }

    /// Store a cropped thumbnail and write its preview file
    pub fn set_thumbnail(&mut self, blob: ThumbnailBlob) -> Result<(), UploadError> {
        self.ensure_editable()?;

        let mut preview = tempfile::Builder::new()
            .prefix("thumbnail-")
            .suffix(".jpg")
            .tempfile()?;
        preview.write_all(&blob.bytes)?;
        preview.flush()?;
        debug!("Thumbnail preview written to {}", preview.path().display());

        // replacing the previous preview drops (and deletes) its file
        self.draft.thumbnail_preview = Some(preview);
        self.draft.thumbnail = Some(blob);
        Ok(())
    }

    /// Guarded `Details → Review`
    pub fn proceed_to_review(&mut self) -> Result<(), UploadError> {
        self.ensure_editable()?;
        if self.step != WizardStep::Details {
            return Err(Self::reject("Review is only reachable from the details step"));
        }
        if self.draft.title.trim().is_empty() {
            return Err(Self::reject("Please enter a title"));
        }
        if self.draft.thumbnail.is_none() {
            return Err(Self::reject("Please add a thumbnail"));
        }
        self.step = WizardStep::Review;
        Ok(())
    }

    /// Unguarded backward step
    pub fn back(&mut self) -> Result<(), UploadError> {
        self.ensure_editable()?;
        self.step = match self.step {
            WizardStep::Details => WizardStep::Upload,
            WizardStep::Review => WizardStep::Details,
            WizardStep::Upload | WizardStep::Submitted => {
                return Err(Self::reject("Already at the first step"))
            }
        };
        Ok(())
    }

    /// Drop the selected video and return to `Upload`
    pub fn change_video(&mut self) -> Result<(), UploadError> {
        self.ensure_editable()?;
        match self.step {
            WizardStep::Details | WizardStep::Review => {
                self.draft.clear_video();
                self.step = WizardStep::Upload;
                Ok(())
            }
            _ => Err(Self::reject("No video selected")),
        }
    }

    /// Mark the upload as in flight; only from `Review`
    pub fn begin_submit(&mut self) -> Result<&UploadDraft, UploadError> {
        self.ensure_editable()?;
        if self.step != WizardStep::Review {
            return Err(Self::reject("Uploads can only start from the review step"));
        }
        self.uploading = true;
        Ok(&self.draft)
    }

    /// Record the upload result: success discards the draft, failure stays on `Review`
    pub fn finish_submit<T>(&mut self, result: &Result<T, UploadError>) {
        self.uploading = false;
        if result.is_ok() && self.step == WizardStep::Review {
            self.draft = UploadDraft::default();
            self.step = WizardStep::Submitted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(name: &str) -> SelectedMedia {
        SelectedMedia {
            path: PathBuf::from(format!("/videos/{}", name)),
            file_name: name.to_string(),
            size: 50 * 1024 * 1024,
            mime: "video/mp4".to_string(),
        }
    }

    fn blob() -> ThumbnailBlob {
        ThumbnailBlob {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 16,
            height: 9,
        }
    }

    #[test]
    fn test_select_advances_and_derives_title() {
        let mut wizard = WizardController::new();
        wizard.select_video(media("trip.final.mp4")).unwrap();

        assert_eq!(wizard.step(), WizardStep::Details);
        assert_eq!(wizard.draft().title, "trip.final");
        assert_eq!(wizard.draft().video_preview(), Some(Path::new("/videos/trip.final.mp4")));
    }

    #[test]
    fn test_existing_title_is_kept() {
        let mut wizard = WizardController::new();
        wizard.set_title("My title").unwrap();
        wizard.select_video(media("clip.mp4")).unwrap();
        assert_eq!(wizard.draft().title, "My title");
    }

    #[test]
    fn test_review_requires_title_and_thumbnail() {
        let mut wizard = WizardController::new();
        wizard.select_video(media("clip.mp4")).unwrap();

        wizard.set_title("   ").unwrap();
        assert!(wizard.proceed_to_review().is_err());
        assert_eq!(wizard.step(), WizardStep::Details);

        wizard.set_title("Demo").unwrap();
        assert!(wizard.proceed_to_review().is_err());
        assert_eq!(wizard.step(), WizardStep::Details);

        wizard.set_thumbnail(blob()).unwrap();
        wizard.proceed_to_review().unwrap();
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_review_not_reachable_from_upload() {
        let mut wizard = WizardController::new();
        wizard.set_title("Demo").unwrap();
        wizard.set_thumbnail(blob()).unwrap();
        assert!(wizard.proceed_to_review().is_err());
        assert_eq!(wizard.step(), WizardStep::Upload);
    }

    #[test]
    fn test_back_and_change_video() {
        let mut wizard = WizardController::new();
        wizard.select_video(media("clip.mp4")).unwrap();
        wizard.set_thumbnail(blob()).unwrap();
        wizard.proceed_to_review().unwrap();

        wizard.back().unwrap();
        assert_eq!(wizard.step(), WizardStep::Details);
        wizard.proceed_to_review().unwrap();

        wizard.change_video().unwrap();
        assert_eq!(wizard.step(), WizardStep::Upload);
        assert!(wizard.draft().video().is_none());
        assert!(wizard.draft().video_preview().is_none());
        // details survive a video change
        assert_eq!(wizard.draft().title, "clip");
        assert!(wizard.draft().thumbnail().is_some());

        assert!(wizard.back().is_err());
        assert!(wizard.change_video().is_err());
    }

    #[test]
    fn test_select_only_from_upload_step() {
        let mut wizard = WizardController::new();
        wizard.select_video(media("a.mp4")).unwrap();
        assert!(wizard.select_video(media("b.mp4")).is_err());
        assert_eq!(wizard.draft().video().unwrap().file_name, "a.mp4");
    }

    #[test]
    fn test_thumbnail_preview_is_replaced() {
        let mut wizard = WizardController::new();
        wizard.set_thumbnail(blob()).unwrap();
        let first = wizard.draft().thumbnail_preview().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&first).unwrap(), blob().bytes);

        wizard.set_thumbnail(blob()).unwrap();
        let second = wizard.draft().thumbnail_preview().unwrap().to_path_buf();
        assert_ne!(first, second);
        assert!(!first.exists());
    }

    #[test]
    fn test_submit_lifecycle() {
        let mut wizard = WizardController::new();
        wizard.select_video(media("clip.mp4")).unwrap();
        assert!(wizard.begin_submit().is_err());

        wizard.set_thumbnail(blob()).unwrap();
        wizard.proceed_to_review().unwrap();
        wizard.begin_submit().unwrap();
        assert!(wizard.is_uploading());
        assert!(wizard.begin_submit().is_err());

        let failed: Result<(), UploadError> = Err(UploadError::Wizard("network".to_string()));
        wizard.finish_submit(&failed);
        assert!(!wizard.is_uploading());
        assert_eq!(wizard.step(), WizardStep::Review);
        assert_eq!(wizard.draft().title, "clip");

        wizard.begin_submit().unwrap();
        let preview = wizard.draft().thumbnail_preview().unwrap().to_path_buf();
        wizard.finish_submit(&Ok::<_, UploadError>(()));
        assert_eq!(wizard.step(), WizardStep::Submitted);
        assert!(wizard.draft().video().is_none());
        assert!(!preview.exists());
        assert!(wizard.set_title("again").is_err());
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(" rust, video ,,tutorial, rust "),
            vec!["rust".to_string(), "video".to_string(), "tutorial".to_string()]
        );
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_blank_transcript_is_dropped() {
        let mut wizard = WizardController::new();
        wizard
            .set_transcript(Some(TranscriptPayload {
                text: "  ".to_string(),
                language: None,
                source: None,
            }))
            .unwrap();
        assert!(wizard.draft().transcript.is_none());
    }
}
