//! # Signature Grant Module
//!
//! Credenziali monouso emesse dal backend per un singolo upload diretto.
//!
//! La risposta grezza del backend (`RawSignatureGrant`) viene validata in una
//! `SignatureGrant`: servono almeno `cloudName` e `signature`, altrimenti
//! l'upload viene interrotto prima di inviare qualsiasi byte. Il thumbnail usa
//! sempre `resource_type = "image"`, qualunque cosa risponda il backend.

use crate::error::UploadError;
use serde::Deserialize;
use serde_json::Value;

/// Asset caricato nello storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Video,
    Thumbnail,
}

impl AssetKind {
    /// Value of the `type` query parameter on `/upload-signature`
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
        }
    }

    fn default_resource_type(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "image",
        }
    }
}

/// Signature grant as returned by `GET /upload-signature`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignatureGrant {
    pub cloud_name: Option<String>,
    pub resource_type: Option<String>,
    pub signature: Option<String>,
    #[serde(rename = "api_key", alias = "apiKey")]
    pub api_key: Option<Value>,
    pub timestamp: Option<Value>,
    pub upload_preset: Option<String>,
    pub folder: Option<String>,
    pub public_id: Option<String>,
}

/// Validated, single-use upload credentials for one asset
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureGrant {
    pub kind: AssetKind,
    pub cloud_name: String,
    pub resource_type: String,
    pub signature: String,
    pub api_key: Option<String>,
    pub timestamp: Option<String>,
    pub upload_preset: Option<String>,
    pub folder: Option<String>,
    pub public_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Numbers and non-blank strings as a form value
fn scalar(value: Option<Value>) -> Option<String> {
    value.and_then(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl SignatureGrant {
    pub fn from_raw(kind: AssetKind, raw: RawSignatureGrant) -> Result<Self, UploadError> {
        let cloud_name = non_empty(raw.cloud_name).ok_or_else(|| {
            UploadError::InvalidGrant(format!("{} grant is missing cloudName", kind.query_value()))
        })?;
        let signature = non_empty(raw.signature).ok_or_else(|| {
            UploadError::InvalidGrant(format!("{} grant is missing signature", kind.query_value()))
        })?;

        let resource_type = match kind {
            AssetKind::Thumbnail => "image".to_string(),
            AssetKind::Video => non_empty(raw.resource_type)
                .unwrap_or_else(|| kind.default_resource_type().to_string()),
        };

        Ok(Self {
            kind,
            cloud_name,
            resource_type,
            signature,
            api_key: scalar(raw.api_key),
            timestamp: scalar(raw.timestamp),
            upload_preset: non_empty(raw.upload_preset),
            folder: non_empty(raw.folder),
            public_id: non_empty(raw.public_id),
        })
    }

    /// Credential fields attached to the multipart upload, in wire names
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(preset) = &self.upload_preset {
            fields.push(("upload_preset", preset.clone()));
        }
        if let Some(api_key) = &self.api_key {
            fields.push(("api_key", api_key.clone()));
        }
        if let Some(timestamp) = &self.timestamp {
            fields.push(("timestamp", timestamp.clone()));
        }
        fields.push(("signature", self.signature.clone()));
        if let Some(folder) = &self.folder {
            fields.push(("folder", folder.clone()));
        }
        if let Some(public_id) = &self.public_id {
            fields.push(("public_id", public_id.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawSignatureGrant {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_grant_parses() {
        let grant = SignatureGrant::from_raw(
            AssetKind::Video,
            raw(r#"{
                "cloudName": "demo",
                "resourceType": "video",
                "signature": "abc123",
                "api_key": "key-1",
                "timestamp": 1700000000,
                "folder": "uploads/videos",
                "publicId": "vid_42"
            }"#),
        )
        .unwrap();

        assert_eq!(grant.cloud_name, "demo");
        assert_eq!(grant.timestamp.as_deref(), Some("1700000000"));
        assert_eq!(
            grant.form_fields(),
            vec![
                ("api_key", "key-1".to_string()),
                ("timestamp", "1700000000".to_string()),
                ("signature", "abc123".to_string()),
                ("folder", "uploads/videos".to_string()),
                ("public_id", "vid_42".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        let missing_cloud = raw(r#"{"signature": "abc"}"#);
        assert!(matches!(
            SignatureGrant::from_raw(AssetKind::Video, missing_cloud),
            Err(UploadError::InvalidGrant(_))
        ));

        let missing_signature = raw(r#"{"cloudName": "demo", "signature": "  "}"#);
        assert!(matches!(
            SignatureGrant::from_raw(AssetKind::Thumbnail, missing_signature),
            Err(UploadError::InvalidGrant(_))
        ));
    }

    #[test]
    fn test_thumbnail_resource_type_is_forced_to_image() {
        let grant = SignatureGrant::from_raw(
            AssetKind::Thumbnail,
            raw(r#"{"cloudName": "demo", "signature": "s", "resourceType": "video"}"#),
        )
        .unwrap();
        assert_eq!(grant.resource_type, "image");
    }

    #[test]
    fn test_video_resource_type_defaults() {
        let grant = SignatureGrant::from_raw(
            AssetKind::Video,
            raw(r#"{"cloudName": "demo", "signature": "s", "timestamp": "1700"}"#),
        )
        .unwrap();
        assert_eq!(grant.resource_type, "video");
        assert_eq!(grant.timestamp.as_deref(), Some("1700"));
    }

    #[test]
    fn test_numeric_api_key_is_accepted() {
        let grant = SignatureGrant::from_raw(
            AssetKind::Video,
            raw(r#"{"cloudName": "demo", "signature": "s", "api_key": 123456789012345, "timestamp": 1700}"#),
        )
        .unwrap();
        assert_eq!(grant.api_key.as_deref(), Some("123456789012345"));

        let grant = SignatureGrant::from_raw(
            AssetKind::Video,
            raw(r#"{"cloudName": "demo", "signature": "s", "apiKey": "  "}"#),
        )
        .unwrap();
        assert_eq!(grant.api_key, None);
    }

    #[test]
    fn test_upload_preset_is_sent_first() {
        let grant = SignatureGrant::from_raw(
            AssetKind::Video,
            raw(r#"{"cloudName": "demo", "signature": "s", "uploadPreset": "unsigned"}"#),
        )
        .unwrap();
        assert_eq!(grant.form_fields()[0], ("upload_preset", "unsigned".to_string()));
    }
}
