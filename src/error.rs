//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `UploadError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//! - Distingue il messaggio tecnico (Display) dal messaggio per l'utente
//!
//! ## Categorie di errori:
//! - `Rejected`: File video rifiutato dal selettore (tipo o dimensione)
//! - `Wizard`: Transizione del wizard non consentita
//! - `Crop`: Errori della pipeline di crop del thumbnail
//! - `Http`: Errori di trasporto (rete, DNS, connessione)
//! - `Server`: Errore applicativo riportato dal backend o dallo storage
//! - `InvalidGrant`: Signature grant incompleta
//! - `Io` / `Image` / `Json`: Errori standard convertiti automaticamente
//!
//! ## Esempio:
//! ```rust,ignore
//! if grant.signature.is_none() {
//!     return Err(UploadError::InvalidGrant("missing signature".to_string()));
//! }
//! ```

use crate::media_selector::MediaRejection;

/// Fase del protocollo di upload in cui si è verificato un errore
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Register,
    Signatures,
    VideoTransfer,
    ThumbnailTransfer,
    Finalize,
}

impl UploadStage {
    /// Messaggio generico mostrato quando il server non fornisce un messaggio
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Register => "Could not start the upload. Please try again.",
            Self::Signatures => "Failed to initialize upload. Please try again.",
            Self::VideoTransfer => "Video upload failed. Please try again.",
            Self::ThumbnailTransfer => "Thumbnail upload failed. Please try again.",
            Self::Finalize => "Failed to publish the video. Please try again.",
        }
    }
}

/// Custom error types for the upload wizard
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error("Invalid signature grant: {0}")]
    InvalidGrant(String),

    #[error("Media rejected: {0}")]
    Rejected(#[from] MediaRejection),

    #[error("Crop error: {0}")]
    Crop(String),

    #[error("Wizard error: {0}")]
    Wizard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage:?} failed: {source}")]
    Stage {
        stage: UploadStage,
        #[source]
        source: Box<UploadError>,
    },
}

impl UploadError {
    /// Annota l'errore con la fase del protocollo in cui è avvenuto
    pub fn at(self, stage: UploadStage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Fase del protocollo, se nota
    pub fn stage(&self) -> Option<UploadStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Messaggio per l'utente: preferisce il messaggio del server, altrimenti
    /// un messaggio generico per la fase
    pub fn user_message(&self) -> String {
        match self {
            Self::Stage { stage, source } => source
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| stage.fallback_message().to_string()),
            Self::Rejected(rejection) => rejection.to_string(),
            Self::Wizard(message) | Self::Crop(message) => message.clone(),
            other => other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Upload failed. Please try again.".to_string()),
        }
    }

    fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message: Some(message), .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            Self::Stage { source, .. } => source.server_message(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = UploadError::Server {
            status: 400,
            message: Some("Upload preset not found".to_string()),
        }
        .at(UploadStage::VideoTransfer);

        assert_eq!(err.user_message(), "Upload preset not found");
        assert_eq!(err.stage(), Some(UploadStage::VideoTransfer));
    }

    #[test]
    fn test_user_message_falls_back_per_stage() {
        let err = UploadError::InvalidGrant("missing cloudName".to_string())
            .at(UploadStage::Signatures);
        assert_eq!(err.user_message(), "Failed to initialize upload. Please try again.");

        let err = UploadError::Server { status: 502, message: None }.at(UploadStage::Finalize);
        assert_eq!(err.user_message(), "Failed to publish the video. Please try again.");
    }

    #[test]
    fn test_stage_annotation_is_not_nested() {
        let err = UploadError::Crop("boom".to_string())
            .at(UploadStage::Register)
            .at(UploadStage::Finalize);
        assert_eq!(err.stage(), Some(UploadStage::Register));
    }
}
