// upload/mod.rs - Image/document upload pipeline
//
// multipart form -> validate -> resize/re-encode (images) -> object storage
// -> identifiers handed back to the handler for persistence. Removal of the
// stored objects on replace/delete goes through `destroy_all`.

pub mod form;
pub mod image;

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::ImageRef;
use crate::storage::{ObjectStorage, ResourceType, StorageError, StoredObject, UploadRequest};

pub use self::image::{ImageKind, ImageSettings};
pub use form::{read_form, FileField, FormData, FormSpec, UploadedFile};

const MB: usize = 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];
pub const DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

pub const PRODUCT_FORM: FormSpec = FormSpec {
    files: &[FileField {
        name: "images",
        accept: IMAGE_TYPES,
        max_count: 20,
        max_bytes: 20 * MB,
    }],
};

pub const PROJECT_FORM: FormSpec = FormSpec {
    files: &[FileField {
        name: "images",
        accept: IMAGE_TYPES,
        max_count: 5,
        max_bytes: 10 * MB,
    }],
};

pub const CERTIFICATE_FORM: FormSpec = FormSpec {
    files: &[
        FileField {
            name: "file",
            accept: DOCUMENT_TYPES,
            max_count: 1,
            max_bytes: 10 * MB,
        },
        FileField {
            name: "logo",
            accept: IMAGE_TYPES,
            max_count: 1,
            max_bytes: 10 * MB,
        },
    ],
};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '{content_type}' for field '{field}'")]
    UnsupportedType { field: String, content_type: String },

    #[error("Too many files for field '{field}' (max {max})")]
    TooManyFiles { field: String, max: usize },

    #[error("File '{file_name}' exceeds the {limit_bytes} byte limit")]
    TooLarge { file_name: String, limit_bytes: usize },

    #[error("Unexpected file field '{0}'")]
    UnexpectedField(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image processing failed: {0}")]
    Processing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct UploadPipeline {
    storage: Arc<dyn ObjectStorage>,
    settings: ImageSettings,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn ObjectStorage>, settings: ImageSettings) -> Self {
        Self { storage, settings }
    }

    /// Re-encode one image and push it into `folder`
    pub async fn store_image(&self, file: UploadedFile, folder: &str) -> Result<StoredObject, UploadError> {
        let kind = ImageKind::from_content_type(&file.content_type).ok_or_else(|| {
            UploadError::UnsupportedType {
                field: file.field.clone(),
                content_type: file.content_type.clone(),
            }
        })?;

        let settings = self.settings;
        let original_len = file.data.len();
        let data = tokio::task::spawn_blocking(move || image::optimize(&file.data, kind, &settings))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))??;

        tracing::debug!(
            "Optimized image {} -> {} bytes ({})",
            original_len,
            data.len(),
            kind.content_type()
        );

        let stored = self
            .storage
            .upload(UploadRequest {
                folder: folder.to_string(),
                resource_type: ResourceType::Image,
                content_type: kind.content_type().to_string(),
                data,
            })
            .await?;
        Ok(stored)
    }

    /// Store every image; if any fails, the ones already stored are destroyed again.
    pub async fn store_images(&self, files: Vec<UploadedFile>, folder: &str) -> Result<Vec<ImageRef>, UploadError> {
        let results = join_all(files.into_iter().map(|f| self.store_image(f, folder))).await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(object) => stored.push(object),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => tracing::warn!("Additional upload failure: {}", e),
            }
        }

        if let Some(err) = first_error {
            self.destroy_all(
                stored
                    .into_iter()
                    .map(|o| (o.public_id, ResourceType::Image)),
            )
            .await;
            return Err(err);
        }

        Ok(stored.into_iter().map(ImageRef::from).collect())
    }

    /// Store a document byte-for-byte as a raw resource
    pub async fn store_raw(&self, file: UploadedFile, folder: &str) -> Result<StoredObject, UploadError> {
        let stored = self
            .storage
            .upload(UploadRequest {
                folder: folder.to_string(),
                resource_type: ResourceType::Raw,
                content_type: file.content_type,
                data: file.data,
            })
            .await?;
        Ok(stored)
    }

    /// Best-effort removal; failures are logged and left behind.
    pub async fn destroy_all(&self, objects: impl IntoIterator<Item = (String, ResourceType)>) {
        for (public_id, resource_type) in objects {
            if let Err(e) = self.storage.destroy(&public_id, resource_type).await {
                tracing::error!("Failed to destroy stored object {}: {}", public_id, e);
            }
        }
    }
}

/// Pair image references with the resource type they were uploaded as
pub fn image_objects(images: &[ImageRef]) -> impl Iterator<Item = (String, ResourceType)> + '_ {
    images
        .iter()
        .map(|img| (img.public_id.clone(), ResourceType::Image))
}
