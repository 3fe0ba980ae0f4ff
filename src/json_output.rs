//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per integrazione con altri processi.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout per ogni evento dell'upload
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio upload (file, dimensione, titolo)
//! - `phase`: Cambio di fase del protocollo
//! - `progress`: Progresso del trasferimento video
//! - `complete`: Upload pubblicato con id e route di destinazione
//! - `error`: Errore con messaggio utente e fase

use crate::error::{UploadError, UploadStage};
use crate::progress::ProgressEstimate;
use crate::upload::session::{UploadOutcome, UploadPhase};
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio dell'upload
    #[serde(rename = "start")]
    Start {
        file: PathBuf,
        size: u64,
        title: String,
    },

    /// Nuova fase del protocollo
    #[serde(rename = "phase")]
    Phase { phase: UploadPhase, label: String },

    /// Progresso del video
    #[serde(rename = "progress")]
    Progress {
        bytes_loaded: u64,
        bytes_total: u64,
        percent: u8,
        speed_bytes_per_sec: f64,
        eta_seconds: Option<f64>,
    },

    /// Upload completato
    #[serde(rename = "complete")]
    Complete {
        video_id: Option<String>,
        route: String,
    },

    /// Errore
    #[serde(rename = "error")]
    Error {
        message: String,
        stage: Option<UploadStage>,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(file: PathBuf, size: u64, title: &str) -> Self {
        Self::Start {
            file,
            size,
            title: title.to_string(),
        }
    }

    pub fn phase(phase: UploadPhase) -> Self {
        Self::Phase {
            phase,
            label: phase.label().to_string(),
        }
    }

    pub fn progress(estimate: &ProgressEstimate) -> Self {
        Self::Progress {
            bytes_loaded: estimate.bytes_loaded,
            bytes_total: estimate.bytes_total,
            percent: estimate.percent,
            speed_bytes_per_sec: estimate.speed_bytes_per_sec,
            eta_seconds: estimate.eta_seconds,
        }
    }

    pub fn complete(outcome: &UploadOutcome) -> Self {
        Self::Complete {
            video_id: outcome.video_id.clone(),
            route: outcome.route(),
        }
    }

    /// Messaggio di errore: `message` è il testo per l'utente, `details` quello tecnico
    pub fn error(error: &UploadError) -> Self {
        Self::Error {
            message: error.user_message(),
            stage: error.stage(),
            details: Some(error.to_string()),
        }
    }
}
