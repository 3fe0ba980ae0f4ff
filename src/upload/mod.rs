//! # Direct Upload Module
//!
//! Protocollo di upload diretto verso lo storage, in sottomoduli:
//! - `backend`: Contratto REST del backend e client HTTP
//! - `grant`: Validazione delle signature grant
//! - `storage`: Trasferimento multipart verso lo storage
//! - `reporter`: Throttle dei report di progresso
//! - `session`: Orchestratore delle quattro fasi

pub mod backend;
pub mod grant;
pub mod reporter;
pub mod session;
pub mod storage;

pub use backend::{FinalizeRequest, HttpBackend, TranscriptPayload, UploadBackend};
pub use grant::{AssetKind, SignatureGrant};
pub use reporter::ProgressReportThrottle;
pub use session::{SilentObserver, UploadObserver, UploadOutcome, UploadPhase, UploadSession};
pub use storage::{AssetPayload, CloudStorage, StorageTransport, StoredAsset};
