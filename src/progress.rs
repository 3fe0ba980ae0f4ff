//! # Progress Estimation and Display Module
//!
//! Questo modulo gestisce la stima del progresso e la sua visualizzazione.
//!
//! ## Responsabilità:
//! - Calcolo percentuale, velocità e tempo residuo da contatori di byte
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Spinner per le fasi indeterminate (sessione, signature, finalize)
//! - Formattazione human-readable di dimensioni, velocità e ETA
//!
//! ## Stima:
//! - **speed**: `bytes_loaded / elapsed_seconds`
//! - **eta**: `(bytes_total - bytes_loaded) / speed`
//! - Nessuno smoothing: ogni evento ricalcola dal tempo assoluto trascorso
//! - "Calculating…" finché la stima non è finita e non negativa
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:42] [========================>---------------] 31.20 MB/50.00 MB (62%) 1.25 MB/s, 15s left
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let estimate = ProgressSample::new(loaded, total, elapsed).estimate();
//! let bar = ProgressManager::new(total);
//! bar.update(&estimate);
//! bar.finish("Video uploaded");
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Testo mostrato quando l'ETA non è ancora calcolabile
pub const CALCULATING: &str = "Calculating…";

/// Raw transfer counters at one progress event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub bytes_loaded: u64,
    pub bytes_total: u64,
    pub elapsed_seconds: f64,
}

/// Values derived from a `ProgressSample`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEstimate {
    pub bytes_loaded: u64,
    pub bytes_total: u64,
    pub percent: u8,
    pub speed_bytes_per_sec: f64,
    /// `None` until the estimate is finite and non-negative
    pub eta_seconds: Option<f64>,
}

impl ProgressSample {
    pub fn new(bytes_loaded: u64, bytes_total: u64, elapsed_seconds: f64) -> Self {
        Self {
            bytes_loaded,
            bytes_total,
            elapsed_seconds,
        }
    }

    /// Percent loaded, rounded to the nearest integer and capped at 100
    pub fn percent(&self) -> u8 {
        loaded_percent(self.bytes_loaded, self.bytes_total)
    }

    pub fn estimate(&self) -> ProgressEstimate {
        let speed = self.bytes_loaded as f64 / self.elapsed_seconds;
        let speed_bytes_per_sec = if speed.is_finite() { speed } else { 0.0 };

        let remaining = self.bytes_total as f64 - self.bytes_loaded as f64;
        let eta = remaining / speed;
        let eta_seconds = if eta.is_finite() && eta >= 0.0 {
            Some(eta)
        } else {
            None
        };

        ProgressEstimate {
            bytes_loaded: self.bytes_loaded,
            bytes_total: self.bytes_total,
            percent: self.percent(),
            speed_bytes_per_sec,
            eta_seconds,
        }
    }
}

/// Rounded whole percent of `loaded` over `total`
pub fn loaded_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (loaded as f64 * 100.0 / total as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

impl ProgressEstimate {
    pub fn eta_label(&self) -> String {
        format_eta(self.eta_seconds)
    }

    pub fn speed_label(&self) -> String {
        format_speed(self.speed_bytes_per_sec)
    }
}

/// Manages the terminal progress bar for the video transfer
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a byte-based progress bar
    pub fn new(total_bytes: u64) -> Self {
        let bar = ProgressBar::new(total_bytes);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Move the bar to the sampled position and show speed and ETA
    pub fn update(&self, estimate: &ProgressEstimate) {
        self.bar.set_position(estimate.bytes_loaded);
        self.bar.set_message(format!(
            "{}, {}",
            estimate.speed_label(),
            match estimate.eta_seconds {
                Some(_) => format!("{} left", estimate.eta_label()),
                None => estimate.eta_label(),
            }
        ));
    }

    /// Set a custom message without moving the bar
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop and clear the bar (used on failure)
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Get human-readable size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Human-readable throughput
pub fn format_speed(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", format_size(bytes_per_sec as u64))
}

/// Human-readable remaining time
pub fn format_eta(eta_seconds: Option<f64>) -> String {
    let Some(eta) = eta_seconds else {
        return CALCULATING.to_string();
    };

    let total = eta.ceil() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
