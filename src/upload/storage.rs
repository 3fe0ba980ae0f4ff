//! # Object Storage Transfer Module
//!
//! Upload diretto degli asset verso l'endpoint dello storage (Cloudinary-like):
//! `POST {base}/{cloudName}/{resourceType}/upload` con body multipart.
//!
//! ## Responsabilità:
//! - Costruzione del form multipart con il file e i campi della signature grant
//! - Streaming del video da disco con callback di progresso sui byte letti
//! - Mappatura delle risposte non-2xx in `UploadError::Server` con il messaggio
//!   del provider, usato così com'è quando presente

use crate::error::UploadError;
use crate::upload::backend::ensure_success;
use crate::upload::grant::SignatureGrant;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Read buffer for streamed files; one progress event per chunk
pub const STREAM_CHUNK_BYTES: usize = 256 * 1024;

/// Callback invoked with `(bytes_loaded, bytes_total)` while a file streams
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Content handed to the storage endpoint
#[derive(Debug, Clone)]
pub enum AssetPayload {
    /// File streamed from disk
    File {
        path: PathBuf,
        file_name: String,
        mime: String,
        size: u64,
    },
    /// Small in-memory payload
    Bytes {
        bytes: Vec<u8>,
        file_name: String,
        mime: String,
    },
}

impl AssetPayload {
    pub fn size(&self) -> u64 {
        match self {
            Self::File { size, .. } => *size,
            Self::Bytes { bytes, .. } => bytes.len() as u64,
        }
    }
}

/// Storage response for a stored asset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredAsset {
    pub public_id: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Transfers a single asset using a signature grant
#[async_trait]
pub trait StorageTransport: Send + Sync {
    async fn upload(
        &self,
        grant: &SignatureGrant,
        payload: AssetPayload,
        progress: Option<ProgressCallback>,
    ) -> Result<StoredAsset, UploadError>;
}

/// Direct-upload client for the object storage endpoint
#[derive(Clone, Debug)]
pub struct CloudStorage {
    client: Client,
    base_url: String,
}

impl CloudStorage {
    pub fn new(base_url: &str) -> Result<Self, UploadError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload URL for a grant
    pub fn upload_url(&self, grant: &SignatureGrant) -> String {
        format!(
            "{}/{}/{}/upload",
            self.base_url, grant.cloud_name, grant.resource_type
        )
    }

    async fn file_part(
        payload: AssetPayload,
        progress: Option<ProgressCallback>,
    ) -> Result<Part, UploadError> {
        let part = match payload {
            AssetPayload::File {
                path,
                file_name,
                mime,
                size,
            } => {
                let file = tokio::fs::File::open(&path).await?;
                let mut loaded = 0u64;
                let reader = ReaderStream::with_capacity(file, STREAM_CHUNK_BYTES);
                let stream = reader.inspect(move |chunk| {
                    if let (Ok(bytes), Some(callback)) = (chunk, progress.as_ref()) {
                        loaded += bytes.len() as u64;
                        callback(loaded, size);
                    }
                });
                Part::stream_with_length(Body::wrap_stream(stream), size)
                    .file_name(file_name)
                    .mime_str(&mime)?
            }
            AssetPayload::Bytes {
                bytes,
                file_name,
                mime,
            } => Part::bytes(bytes).file_name(file_name).mime_str(&mime)?,
        };
        Ok(part)
    }
}

#[async_trait]
impl StorageTransport for CloudStorage {
    async fn upload(
        &self,
        grant: &SignatureGrant,
        payload: AssetPayload,
        progress: Option<ProgressCallback>,
    ) -> Result<StoredAsset, UploadError> {
        let url = self.upload_url(grant);
        debug!(
            "Uploading {:?} ({} bytes) to {}",
            grant.kind,
            payload.size(),
            url
        );

        let mut form = Form::new().part("file", Self::file_part(payload, progress).await?);
        for (name, value) in grant.form_fields() {
            form = form.text(name, value);
        }

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<StoredAsset>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::grant::{AssetKind, RawSignatureGrant};
    use mockito::Matcher;
    use std::sync::Mutex;

    fn grant(kind: AssetKind) -> SignatureGrant {
        let raw = RawSignatureGrant {
            cloud_name: Some("demo".to_string()),
            signature: Some("sig-1".to_string()),
            api_key: Some(serde_json::json!("key-1")),
            timestamp: Some(serde_json::json!(1700000000)),
            ..Default::default()
        };
        SignatureGrant::from_raw(kind, raw).unwrap()
    }

    #[test]
    fn test_upload_url() {
        let storage = CloudStorage::new("https://api.cloudinary.com/v1_1/").unwrap();
        assert_eq!(
            storage.upload_url(&grant(AssetKind::Video)),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        assert_eq!(
            storage.upload_url(&grant(AssetKind::Thumbnail)),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[tokio::test]
    async fn test_streams_file_with_progress() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mp4");
        tokio::fs::write(&path, vec![7u8; 200_000]).await.unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/demo/video/upload")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("name=\"signature\"".to_string()),
                Matcher::Regex("sig-1".to_string()),
                Matcher::Regex("name=\"api_key\"".to_string()),
                Matcher::Regex("filename=\"clip.mp4\"".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"public_id": "videos/clip", "duration": 12.5, "width": 1920, "height": 1080}"#)
            .create_async()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let callback: ProgressCallback = Arc::new(move |loaded, total| {
            recorder.lock().unwrap().push((loaded, total));
        });

        let storage = CloudStorage::new(&server.url()).unwrap();
        let stored = storage
            .upload(
                &grant(AssetKind::Video),
                AssetPayload::File {
                    path,
                    file_name: "clip.mp4".to_string(),
                    mime: "video/mp4".to_string(),
                    size: 200_000,
                },
                Some(callback),
            )
            .await
            .unwrap();

        assert_eq!(stored.public_id, "videos/clip");
        assert_eq!(stored.width, Some(1920));
        mock.assert_async().await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(seen.last(), Some(&(200_000, 200_000)));
    }

    #[tokio::test]
    async fn test_provider_error_message_is_used_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/demo/image/upload")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Invalid Signature abc. String to sign - 'timestamp=1'."}}"#)
            .create_async()
            .await;

        let storage = CloudStorage::new(&server.url()).unwrap();
        let err = storage
            .upload(
                &grant(AssetKind::Thumbnail),
                AssetPayload::Bytes {
                    bytes: vec![0xFF, 0xD8, 0xFF],
                    file_name: "thumbnail.jpg".to_string(),
                    mime: "image/jpeg".to_string(),
                },
                None,
            )
            .await
            .unwrap_err();

        match err {
            UploadError::Server { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(
                    message.as_deref(),
                    Some("Invalid Signature abc. String to sign - 'timestamp=1'.")
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
