//! # Upload Session Module
//!
//! Questo modulo orchestra il protocollo di upload diretto in quattro fasi.
//!
//! ## Fasi:
//! 1. **Register**: `POST /upload-sessions` con nome, dimensione e MIME del video
//! 2. **Signatures**: grant per video e thumbnail richieste in parallelo e
//!    validate entrambe prima di trasferire qualsiasi byte
//! 3. **Transfer**: prima il video (con progresso), poi il thumbnail
//! 4. **Finalize**: solo i campi dell'allow-list, mai URL dello storage
//!
//! ## Gestione errori:
//! Ogni fase è un passo fallibile; il primo errore interrompe la sequenza e
//! viene annotato con la fase (`UploadError::at`). Nessun retry automatico e
//! nessuna pulizia degli asset già caricati nello storage.
//!
//! ## Progresso:
//! Ogni evento di progresso del video produce una `ProgressEstimate` per
//! l'observer. Ai multipli del 10% parte un report best-effort verso il
//! backend (`tokio::spawn`), i cui errori vengono ignorati.

use crate::crop::ThumbnailBlob;
use crate::error::{UploadError, UploadStage};
use crate::progress::{ProgressEstimate, ProgressSample};
use crate::upload::backend::{FinalizeRequest, SessionRequest, UploadBackend};
use crate::upload::grant::{AssetKind, SignatureGrant};
use crate::upload::reporter::ProgressReportThrottle;
use crate::upload::storage::{AssetPayload, ProgressCallback, StorageTransport};
use crate::wizard::UploadDraft;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

/// Fase corrente dell'upload, notificata all'observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Registering,
    RequestingSignatures,
    UploadingVideo,
    UploadingThumbnail,
    Finalizing,
}

impl UploadPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Registering => "Creating upload session",
            Self::RequestingSignatures => "Requesting upload signatures",
            Self::UploadingVideo => "Uploading video",
            Self::UploadingThumbnail => "Uploading thumbnail",
            Self::Finalizing => "Publishing video",
        }
    }
}

/// Receives phase changes and progress while a session runs
pub trait UploadObserver: Send + Sync {
    fn on_phase(&self, _phase: UploadPhase) {}
    fn on_progress(&self, _estimate: &ProgressEstimate) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct SilentObserver;

impl UploadObserver for SilentObserver {}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub video_id: Option<String>,
}

impl UploadOutcome {
    /// Route the user lands on after publishing
    pub fn route(&self) -> String {
        match &self.video_id {
            Some(id) => format!("/watch/{}", id),
            None => "/dashboard".to_string(),
        }
    }
}

/// Runs the upload protocol for one draft
pub struct UploadSession<B, S> {
    backend: Arc<B>,
    storage: S,
    observer: Arc<dyn UploadObserver>,
    report_step: u8,
}

impl<B, S> UploadSession<B, S>
where
    B: UploadBackend + 'static,
    S: StorageTransport,
{
    pub fn new(backend: B, storage: S) -> Self {
        Self {
            backend: Arc::new(backend),
            storage,
            observer: Arc::new(SilentObserver),
            report_step: 10,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_report_step(mut self, step: u8) -> Self {
        self.report_step = step;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Execute Register → Signatures → Transfer → Finalize
    pub async fn run(&self, draft: &UploadDraft) -> Result<UploadOutcome, UploadError> {
        let video = draft
            .video()
            .ok_or_else(|| UploadError::Wizard("Please select a video".to_string()))?;
        let thumbnail = draft
            .thumbnail()
            .ok_or_else(|| UploadError::Wizard("Please add a thumbnail".to_string()))?;

        // Phase 1
        self.observer.on_phase(UploadPhase::Registering);
        let handle = self
            .backend
            .create_session(&SessionRequest {
                file_name: video.file_name.clone(),
                file_size: video.size,
                mime_type: video.mime.clone(),
            })
            .await
            .map_err(|e| e.at(UploadStage::Register))?;
        info!("Upload session {} registered", handle.session_id);

        // Phase 2
        self.observer.on_phase(UploadPhase::RequestingSignatures);
        let (video_grant, thumbnail_grant) = self
            .fetch_grants()
            .await
            .map_err(|e| e.at(UploadStage::Signatures))?;

        // Phase 3
        self.observer.on_phase(UploadPhase::UploadingVideo);
        let payload = AssetPayload::File {
            path: video.path.clone(),
            file_name: video.file_name.clone(),
            mime: video.mime.clone(),
            size: video.size,
        };
        let progress = self.progress_callback(&handle.session_id);
        let stored_video = self
            .storage
            .upload(&video_grant, payload, Some(progress))
            .await
            .map_err(|e| e.at(UploadStage::VideoTransfer))?;
        debug!("Video stored as {}", stored_video.public_id);

        self.observer.on_phase(UploadPhase::UploadingThumbnail);
        let stored_thumbnail = self
            .storage
            .upload(&thumbnail_grant, thumbnail_payload(thumbnail), None)
            .await
            .map_err(|e| e.at(UploadStage::ThumbnailTransfer))?;
        debug!("Thumbnail stored as {}", stored_thumbnail.public_id);

        // Phase 4
        self.observer.on_phase(UploadPhase::Finalizing);
        let request = FinalizeRequest {
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            tags: draft.tags(),
            video_public_id: stored_video.public_id,
            thumbnail_public_id: stored_thumbnail.public_id,
            duration: stored_video.duration,
            width: stored_video.width,
            height: stored_video.height,
            is_short: draft.is_short,
            transcript: None,
            transcript_language: None,
            transcript_source: None,
        }
        .with_transcript(draft.transcript.as_ref());

        let response = self
            .backend
            .finalize(&handle.session_id, &request)
            .await
            .map_err(|e| e.at(UploadStage::Finalize))?;

        let outcome = UploadOutcome {
            video_id: response.video_id(),
        };
        info!("Upload finalized, routing to {}", outcome.route());
        Ok(outcome)
    }

    async fn fetch_grants(&self) -> Result<(SignatureGrant, SignatureGrant), UploadError> {
        let (video_raw, thumbnail_raw) = tokio::try_join!(
            self.backend.fetch_signature(AssetKind::Video),
            self.backend.fetch_signature(AssetKind::Thumbnail),
        )?;

        let video = SignatureGrant::from_raw(AssetKind::Video, video_raw)?;
        let thumbnail = SignatureGrant::from_raw(AssetKind::Thumbnail, thumbnail_raw)?;
        Ok((video, thumbnail))
    }

    fn progress_callback(&self, session_id: &str) -> ProgressCallback {
        let started = Instant::now();
        let throttle = Mutex::new(ProgressReportThrottle::new(self.report_step));
        let observer = self.observer.clone();
        let backend = self.backend.clone();
        let session_id = session_id.to_string();

        Arc::new(move |loaded, total| {
            let elapsed = started.elapsed().as_secs_f64();
            observer.on_progress(&ProgressSample::new(loaded, total, elapsed).estimate());

            let boundary = match throttle.lock() {
                Ok(mut throttle) => throttle.observe(loaded, total),
                Err(_) => None,
            };
            if let Some(percent) = boundary {
                let backend = backend.clone();
                let session_id = session_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = backend.report_progress(&session_id, loaded).await {
                        debug!("Progress report at {}% ignored: {}", percent, e);
                    }
                });
            }
        })
    }
}

fn thumbnail_payload(blob: &ThumbnailBlob) -> AssetPayload {
    AssetPayload::Bytes {
        bytes: blob.bytes.clone(),
        file_name: ThumbnailBlob::FILE_NAME.to_string(),
        mime: ThumbnailBlob::MIME.to_string(),
    }
}
