//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con gli endpoint e i limiti dell'upload
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `api_base_url`: URL base del backend (default: "http://localhost:8000/api")
//! - `api_token`: Bearer token opzionale (anche da `VIDEO_UPLOADER_TOKEN`)
//! - `storage_base_url`: Endpoint di upload diretto (default: Cloudinary)
//! - `max_video_bytes`: Dimensione massima del video (default: 500 MB)
//! - `thumbnail_aspect_width` / `thumbnail_aspect_height`: Aspect ratio del crop (default: 16:9)
//! - `thumbnail_quality`: Qualità JPEG del thumbnail (1-100, default: 90)
//! - `progress_report_step`: Granularità in percentuale dei report al backend (default: 10)
//! - `json_output`: Output JSON per uso programmatico (default: false)
//!
//! ## Validazione:
//! - Controlla che gli URL abbiano schema http/https
//! - Controlla che thumbnail_quality sia 1-100
//! - Controlla che l'aspect ratio sia positivo
//! - Controlla che progress_report_step divida 100
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     api_base_url: "https://videos.example.com/api".to_string(),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Limite massimo per un singolo file video: 500 MB
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;

/// Variabile d'ambiente letta per il token del backend
pub const TOKEN_ENV_VAR: &str = "VIDEO_UPLOADER_TOKEN";

/// Configuration for the upload wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend REST API base URL
    pub api_base_url: String,
    /// Optional bearer token for the backend
    pub api_token: Option<String>,
    /// Object-storage upload endpoint base URL
    pub storage_base_url: String,
    /// Largest accepted video file, in bytes
    pub max_video_bytes: u64,
    /// Thumbnail crop aspect ratio (width component)
    pub thumbnail_aspect_width: u32,
    /// Thumbnail crop aspect ratio (height component)
    pub thumbnail_aspect_height: u32,
    /// JPEG quality for the cropped thumbnail (1-100)
    pub thumbnail_quality: u8,
    /// Report progress to the backend every N percent
    pub progress_report_step: u8,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            storage_base_url: "https://api.cloudinary.com/v1_1".to_string(),
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            thumbnail_aspect_width: 16,
            thumbnail_aspect_height: 9,
            thumbnail_quality: 90,
            progress_report_step: 10,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        Self::validate_url("API base URL", &self.api_base_url)?;
        Self::validate_url("Storage base URL", &self.storage_base_url)?;

        if self.max_video_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum video size must be greater than 0"));
        }

        if self.thumbnail_aspect_width == 0 || self.thumbnail_aspect_height == 0 {
            return Err(anyhow::anyhow!("Thumbnail aspect ratio components must be greater than 0"));
        }

        if self.thumbnail_quality == 0 || self.thumbnail_quality > 100 {
            return Err(anyhow::anyhow!("Thumbnail quality must be between 1 and 100"));
        }

        if self.progress_report_step == 0
            || self.progress_report_step > 100
            || 100 % self.progress_report_step != 0
        {
            return Err(anyhow::anyhow!("Progress report step must be a divisor of 100"));
        }

        Ok(())
    }

    fn validate_url(label: &str, url: &str) -> Result<()> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(anyhow::anyhow!("{} must not be empty", label));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(anyhow::anyhow!("{} must use http or https: {}", label, url));
        }
        Ok(())
    }

    /// Thumbnail aspect ratio as width / height
    pub fn thumbnail_aspect(&self) -> f64 {
        self.thumbnail_aspect_width as f64 / self.thumbnail_aspect_height as f64
    }

    /// Fill the API token from the environment when the file does not carry one
    pub fn with_env_token(mut self) -> Self {
        if self.api_token.is_none() {
            self.api_token = std::env::var(TOKEN_ENV_VAR)
                .ok()
                .filter(|token| !token.trim().is_empty());
        }
        self
    }

    /// Default config file location: ~/.video-uploader/config.json
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".video-uploader");
        Ok(dir.join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.thumbnail_quality = 0;
        assert!(config.validate().is_err());

        config.thumbnail_quality = 90;
        config.progress_report_step = 30;
        assert!(config.validate().is_err());

        config.progress_report_step = 10;
        config.api_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.api_base_url = "https://example.com/api".to_string();
        config.thumbnail_aspect_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_video_bytes, 500 * 1024 * 1024);
        assert_eq!(config.progress_report_step, 10);
        assert_eq!(config.thumbnail_quality, 90);
        assert!((config.thumbnail_aspect() - 16.0 / 9.0).abs() < f64::EPSILON);
        assert!(config.api_token.is_none());
        assert!(!config.json_output);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            api_base_url: "https://videos.example.com/api".to_string(),
            api_token: Some("secret".to_string()),
            thumbnail_quality: 75,
            progress_report_step: 20,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.api_base_url, "https://videos.example.com/api");
        assert_eq!(loaded_config.api_token.as_deref(), Some("secret"));
        assert_eq!(loaded_config.thumbnail_quality, 75);
        assert_eq!(loaded_config.progress_report_step, 20);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.storage_base_url, "https://api.cloudinary.com/v1_1");
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"api_base_url": "https://api.example.com"}"#)
            .await
            .unwrap();

        let config = Config::from_file(&path).await.unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.max_video_bytes, DEFAULT_MAX_VIDEO_BYTES);
    }
}
