/// Cloudinary-backed media store
///
/// Implements [`MediaStore`](super::MediaStore) against the Cloudinary upload
/// API. Requests are authenticated with the account's API key plus a SHA-256
/// signature over the sorted request parameters and the API secret.
///
/// Endpoints used:
///
/// ```text
/// POST {base}/v1_1/{cloud_name}/{resource_type}/upload    multipart form
/// POST {base}/v1_1/{cloud_name}/{resource_type}/destroy   form
/// ```
///
/// There are no retries here: a failed upload surfaces to the controller,
/// and failed deletes are retried by the reconciliation sweep.

use async_trait::async_trait;
use bookery_shared::models::orphaned_asset::AssetKind;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use super::{MediaAsset, MediaError, MediaStore, UploadRequest};
use crate::config::MediaConfig;

/// Cloudinary API client
#[derive(Clone)]
pub struct Cloudinary {
    /// HTTP client
    client: Client,
    /// Account name, part of every endpoint path
    cloud_name: String,
    /// API key, sent with every request
    api_key: String,
    /// API secret, used only for signing
    api_secret: String,
    /// API base URL
    api_base: String,
}

impl std::fmt::Debug for Cloudinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloudinary")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// Successful upload response (fields we consume)
#[derive(Debug, Deserialize)]
struct UploadApiResponse {
    secure_url: String,
    public_id: String,
}

/// Destroy response
#[derive(Debug, Deserialize)]
struct DestroyApiResponse {
    result: String,
}

impl Cloudinary {
    /// Creates a new client from the media host configuration
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, kind: AssetKind, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base,
            self.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Builds the canonical string the request signature covers: parameters
    /// sorted by name, joined as `k=v&k2=v2`. The file payload, the API key,
    /// and the resource type are excluded per the signing protocol.
    fn string_to_sign(params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// SHA-256 signature over the canonical parameter string + API secret
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::string_to_sign(params).as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaStore for Cloudinary {
    #[instrument(skip(self, request), fields(folder = %request.folder, public_id = %request.public_id))]
    async fn upload(&self, request: UploadRequest) -> Result<MediaAsset, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();

        let mut params: Vec<(&str, String)> = vec![
            ("folder", request.folder.clone()),
            ("public_id", request.public_id.clone()),
            ("timestamp", timestamp.clone()),
            ("signature_algorithm", "sha256".to_string()),
        ];
        if let Some(ref format) = request.format {
            params.push(("format", format.clone()));
        }
        let signature = self.sign(&params);

        let bytes = tokio::fs::read(&request.path).await?;

        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(bytes).file_name(request.public_id.clone()),
            )
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (name, value) in params {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(self.endpoint(request.kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Api(format!("upload returned {}: {}", status, body)));
        }

        let result: UploadApiResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Request(format!("malformed upload response: {}", e)))?;

        debug!(url = %result.secure_url, "Asset uploaded");

        Ok(MediaAsset {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    #[instrument(skip(self), fields(public_id = %public_id, kind = %kind.as_str()))]
    async fn destroy(&self, public_id: &str, kind: AssetKind) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();

        let params: Vec<(&str, String)> = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
            ("signature_algorithm", "sha256".to_string()),
        ];
        let signature = self.sign(&params);

        let mut form_fields: Vec<(&str, String)> = params;
        form_fields.push(("api_key", self.api_key.clone()));
        form_fields.push(("signature", signature));

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&form_fields)
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Api(format!("destroy returned {}: {}", status, body)));
        }

        let result: DestroyApiResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Request(format!("malformed destroy response: {}", e)))?;

        // "not found" counts as success: the object is gone either way, which
        // keeps the reconciliation sweep idempotent.
        match result.result.as_str() {
            "ok" | "not found" => {
                debug!(result = %result.result, "Asset destroyed");
                Ok(())
            }
            other => Err(MediaError::Api(format!("destroy returned result {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_client() -> Cloudinary {
        Cloudinary::new(&MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base: "https://api.cloudinary.com/".to_string(),
        })
    }

    #[test]
    fn test_endpoint_paths() {
        let client = test_client();
        assert_eq!(
            client.endpoint(AssetKind::Image, "upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            client.endpoint(AssetKind::Raw, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/raw/destroy"
        );
    }

    #[test]
    fn test_string_to_sign_is_sorted() {
        let params = vec![
            ("timestamp", "123".to_string()),
            ("folder", "book-covers".to_string()),
            ("public_id", "abc".to_string()),
        ];

        assert_eq!(
            Cloudinary::string_to_sign(&params),
            "folder=book-covers&public_id=abc&timestamp=123"
        );
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let client = test_client();
        let params = vec![("public_id", "abc".to_string()), ("timestamp", "123".to_string())];

        let sig = client.sign(&params);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));

        // Deterministic for identical input
        assert_eq!(sig, client.sign(&params));
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let a = test_client();
        let b = Cloudinary::new(&MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "other-secret".to_string(),
            api_base: "https://api.cloudinary.com".to_string(),
        });

        let params = vec![("public_id", "abc".to_string()), ("timestamp", "123".to_string())];
        assert_ne!(a.sign(&params), b.sign(&params));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let client = Cloudinary::new(&MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key-1234567890".to_string(),
            api_secret: "super-secret-value".to_string(),
            api_base: "https://api.cloudinary.com".to_string(),
        });

        let debug = format!("{:?}", client);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("key-1234567890"));
    }

    #[test]
    fn test_upload_request_carries_format_for_images() {
        let request = UploadRequest {
            path: PathBuf::from("/tmp/x"),
            public_id: "abc".to_string(),
            folder: "book-covers".to_string(),
            kind: AssetKind::Image,
            format: Some("png".to_string()),
        };
        assert_eq!(request.format.as_deref(), Some("png"));
    }
}
