// storage/mod.rs - Remote object storage seam
//
// The upload pipeline only needs two calls from the storage service: push a
// blob into a folder and get back its delivery URL plus identifier, and
// destroy a blob by identifier. Cloudinary is the production backend.

pub mod cloudinary;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cloudinary::CloudinaryStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage rejected request ({status}): {message}")]
    Remote { status: u16, message: String },
}

/// How the storage service treats the blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    /// Stored byte-for-byte (PDF certificates)
    Raw,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: String,
    pub resource_type: ResourceType,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Identifiers returned by the storage service for one blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError>;

    async fn destroy(&self, public_id: &str, resource_type: ResourceType)
        -> Result<(), StorageError>;
}
