//! # Video Uploader Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom e messaggi per l'utente
//! - `media_selector`: Validazione del file video (tipo e dimensione)
//! - `crop`: Pipeline di crop del thumbnail (pan, zoom, rotazione, JPEG)
//! - `wizard`: Macchina a stati Upload → Details → Review → Submitted
//! - `upload`: Protocollo di upload diretto in quattro fasi
//! - `progress`: Stima di velocità/ETA e progress bar
//! - `notifier`: Notifiche transitorie per l'utente
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use video_uploader::{CloudStorage, HttpBackend, UploadSession, WizardController};
//!
//! let mut wizard = WizardController::new();
//! // select_video, set_title, set_thumbnail, proceed_to_review ...
//! let session = UploadSession::new(HttpBackend::new(&api, token)?, CloudStorage::new(&storage)?);
//! wizard.begin_submit()?;
//! let result = session.run(wizard.draft()).await;
//! wizard.finish_submit(&result);
//! ```

pub mod config;
pub mod crop;
pub mod error;
pub mod json_output;
pub mod media_selector;
pub mod notifier;
pub mod progress;
pub mod upload;
pub mod wizard;

pub use config::Config;
pub use crop::{CropModal, CropState, Rotation, ThumbnailBlob};
pub use error::{UploadError, UploadStage};
pub use media_selector::{MediaRejection, MediaSelector, SelectedMedia};
pub use notifier::{NoticeLevel, Notifier};
pub use progress::{ProgressEstimate, ProgressManager, ProgressSample};
pub use upload::{
    CloudStorage, HttpBackend, UploadObserver, UploadOutcome, UploadPhase, UploadSession,
};
pub use wizard::{parse_tags, UploadDraft, WizardController, WizardStep};
