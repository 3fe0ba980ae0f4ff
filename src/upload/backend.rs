//! # Backend API Module
//!
//! Contratto REST del backend video e relativo client HTTP.
//!
//! ## Endpoint:
//! - `POST /upload-sessions` → `{id}`
//! - `GET /upload-signature?type=video|thumbnail` → signature grant
//! - `POST /upload-sessions/{id}/progress` → best-effort, risposta ignorata
//! - `POST /upload-sessions/{id}/finalize` → `{videoId | id}`
//!
//! Il trait `UploadBackend` permette alla sessione di upload di essere testata
//! senza rete; `HttpBackend` è l'implementazione reale su `reqwest`.

use crate::error::UploadError;
use crate::upload::grant::{AssetKind, RawSignatureGrant};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;
use tracing::debug;

/// Body of `POST /upload-sessions`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// Session registered by the backend for one in-flight draft
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSessionHandle {
    pub session_id: String,
    pub created_at: SystemTime,
}

/// Transcript fields sent on finalize
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptPayload {
    pub text: String,
    pub language: Option<String>,
    pub source: Option<String>,
}

/// Allow-listed metadata sent on finalize. Storage URLs are never sent: the
/// backend resolves them from the public ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub video_public_id: String,
    pub thumbnail_public_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub is_short: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_source: Option<String>,
}

impl FinalizeRequest {
    pub fn with_transcript(mut self, transcript: Option<&TranscriptPayload>) -> Self {
        if let Some(transcript) = transcript {
            self.transcript = Some(transcript.text.clone());
            self.transcript_language = transcript.language.clone();
            self.transcript_source = transcript.source.clone();
        }
        self
    }
}

/// Response of the finalize call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub video_id: Option<Value>,
    pub id: Option<Value>,
}

impl FinalizeResponse {
    /// `videoId`, falling back to `id`
    pub fn video_id(&self) -> Option<String> {
        [&self.video_id, &self.id]
            .into_iter()
            .flatten()
            .find_map(id_to_string)
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: Option<Value>,
}

/// Backend operations used by the upload protocol
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<UploadSessionHandle, UploadError>;

    async fn fetch_signature(&self, kind: AssetKind) -> Result<RawSignatureGrant, UploadError>;

    async fn report_progress(&self, session_id: &str, bytes_loaded: u64)
        -> Result<(), UploadError>;

    async fn finalize(
        &self,
        session_id: &str,
        request: &FinalizeRequest,
    ) -> Result<FinalizeResponse, UploadError>;
}

/// Human-readable message from a JSON error body: `error.message`, `message`
/// or a string `error`
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.pointer("/error/message"),
        value.get("message"),
        value.get("error"),
    ];
    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    message
}

/// Turn a non-2xx response into `UploadError::Server`
pub async fn ensure_success(response: Response) -> Result<Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("Request failed with status {}: {}", status, body);
    Err(UploadError::Server {
        status: status.as_u16(),
        message: error_message_from_body(&body),
    })
}

/// HTTP client for the video backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, UploadError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url, token))
    }

    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UploadError> {
        let response = self.apply_auth(request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl UploadBackend for HttpBackend {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<UploadSessionHandle, UploadError> {
        let url = self.build_url("/upload-sessions");
        let created: CreatedSession = self.send_json(self.client.post(&url).json(request)).await?;

        let session_id = created
            .id
            .as_ref()
            .and_then(id_to_string)
            .ok_or_else(|| UploadError::Server {
                status: 200,
                message: Some("Upload session response did not include an id".to_string()),
            })?;

        debug!("Registered upload session {}", session_id);
        Ok(UploadSessionHandle {
            session_id,
            created_at: SystemTime::now(),
        })
    }

    async fn fetch_signature(&self, kind: AssetKind) -> Result<RawSignatureGrant, UploadError> {
        let url = self.build_url("/upload-signature");
        self.send_json(self.client.get(&url).query(&[("type", kind.query_value())]))
            .await
    }

    async fn report_progress(
        &self,
        session_id: &str,
        bytes_loaded: u64,
    ) -> Result<(), UploadError> {
        let url = self.build_url(&format!("/upload-sessions/{}/progress", session_id));
        let request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "bytesLoaded": bytes_loaded }));
        let response = self.apply_auth(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn finalize(
        &self,
        session_id: &str,
        request: &FinalizeRequest,
    ) -> Result<FinalizeResponse, UploadError> {
        let url = self.build_url(&format!("/upload-sessions/{}/finalize", session_id));
        self.send_json(self.client.post(&url).json(request)).await
    }
}
