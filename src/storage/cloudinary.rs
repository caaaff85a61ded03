use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use url::Url;

use super::{ObjectStorage, ResourceType, StorageError, StoredObject, UploadRequest};
use crate::config::StorageConfig;

/// Cloudinary upload API client
pub struct CloudinaryStorage {
    client: reqwest::Client,
    api_base: Url,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    upload_preset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.cloud_name.is_empty() {
            return Err(StorageError::NotConfigured("CLOUDINARY_CLOUD_NAME"));
        }
        // Unsigned uploads need a preset, everything else needs the key pair
        if config.api_secret.is_empty() && config.upload_preset.is_none() {
            return Err(StorageError::NotConfigured("CLOUDINARY_API_SECRET"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: Url::parse(&config.base_url)?,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            upload_preset: config.upload_preset.clone(),
        })
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> Result<Url, StorageError> {
        let path = format!(
            "v1_1/{}/{}/{}",
            self.cloud_name,
            resource_type.as_str(),
            action
        );
        Ok(self.api_base.join(&path)?)
    }

    fn is_signed(&self) -> bool {
        !self.api_secret.is_empty()
    }

    /// Add timestamp, api_key and signature when a secret is configured
    fn finish_params(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        if self.is_signed() {
            params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
            let signature = sign(&params, &self.api_secret);
            params.insert("api_key", self.api_key.clone());
            params.insert("signature", signature);
        }
        params
    }

    async fn post_form(
        &self,
        url: Url,
        form: &BTreeMap<&'static str, String>,
    ) -> Result<reqwest::Response, StorageError> {
        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(StorageError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        let url = self.endpoint(request.resource_type, "upload")?;

        let mut params = BTreeMap::new();
        params.insert("folder", request.folder.clone());
        if let Some(preset) = &self.upload_preset {
            params.insert("upload_preset", preset.clone());
        }
        let mut form = self.finish_params(params);
        // `file` is never part of the signature
        form.insert("file", data_uri(&request.content_type, &request.data));

        let body: UploadResponse = self.post_form(url, &form).await?.json().await?;

        tracing::info!(
            "Uploaded {} bytes to {} as {}",
            request.data.len(),
            request.folder,
            body.public_id
        );
        Ok(StoredObject {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<(), StorageError> {
        if !self.is_signed() {
            return Err(StorageError::NotConfigured("CLOUDINARY_API_SECRET"));
        }
        let url = self.endpoint(resource_type, "destroy")?;

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let form = self.finish_params(params);

        let body: DestroyResponse = self.post_form(url, &form).await?.json().await?;
        match body.result.as_str() {
            "ok" => {
                tracing::info!("Destroyed stored object {}", public_id);
                Ok(())
            }
            "not found" => {
                tracing::warn!("Stored object {} was already gone", public_id);
                Ok(())
            }
            other => Err(StorageError::Remote {
                status: 200,
                message: format!("destroy of {} returned '{}'", public_id, other),
            }),
        }
    }
}

/// Sorted `key=value` pairs joined by `&`, as the signature expects
fn string_to_sign(params: &BTreeMap<&'static str, String>) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn data_uri(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}
