// handlers/catalog.rs - Read/delete path shared by products, projects and certificates
//
// Writes go through `commit_create` / `commit_update`, which keep the stored
// objects in step with the record: objects uploaded for a write that never
// lands are destroyed again, and replaced objects are only destroyed after
// the record stops referencing them.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::Message;
use crate::database::models::{
    CabinetCategory, Certificate, CertificateCategory, InvalidCategory, Product, Project,
};
use crate::database::{Document, DocumentStore};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::storage::ResourceType;
use crate::upload::{image_objects, FormData};

/// A document type served under `/api/<collection>`
pub trait Catalog: Document {
    /// Object storage folder for this resource's uploads
    const FOLDER: &'static str;

    fn store(state: &AppState) -> &Arc<dyn DocumentStore<Self>>;

    /// Canonical label of a category accepted by this resource
    fn parse_category(value: &str) -> Result<&'static str, InvalidCategory>;

    /// Objects to destroy when the document goes away
    fn stored_objects(&self) -> Vec<(String, ResourceType)>;
}

impl Catalog for Product {
    const FOLDER: &'static str = "products";

    fn store(state: &AppState) -> &Arc<dyn DocumentStore<Self>> {
        &state.products
    }

    fn parse_category(value: &str) -> Result<&'static str, InvalidCategory> {
        value.parse::<CabinetCategory>().map(|c| c.label())
    }

    fn stored_objects(&self) -> Vec<(String, ResourceType)> {
        image_objects(&self.images).collect()
    }
}

impl Catalog for Project {
    const FOLDER: &'static str = "projects";

    fn store(state: &AppState) -> &Arc<dyn DocumentStore<Self>> {
        &state.projects
    }

    fn parse_category(value: &str) -> Result<&'static str, InvalidCategory> {
        value.parse::<CabinetCategory>().map(|c| c.label())
    }

    fn stored_objects(&self) -> Vec<(String, ResourceType)> {
        image_objects(&self.images).collect()
    }
}

impl Catalog for Certificate {
    const FOLDER: &'static str = "certificates";

    fn store(state: &AppState) -> &Arc<dyn DocumentStore<Self>> {
        &state.certificates
    }

    fn parse_category(value: &str) -> Result<&'static str, InvalidCategory> {
        value.parse::<CertificateCategory>().map(|c| c.label())
    }

    fn stored_objects(&self) -> Vec<(String, ResourceType)> {
        Certificate::stored_objects(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// GET /api/<collection>?category=
pub async fn list<T: Catalog>(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<T>> {
    let category = match query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(raw) => Some(T::parse_category(raw).map_err(category_error)?),
        None => None,
    };

    let docs = T::store(&state).list(category).await?;
    Ok(ApiResponse::success(docs))
}

/// GET /api/<collection>/:id
pub async fn get<T: Catalog>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<T> {
    let id = parse_id::<T>(&id)?;
    let doc = T::store(&state)
        .find(id)
        .await?
        .ok_or_else(|| not_found::<T>())?;
    Ok(ApiResponse::success(doc))
}

/// DELETE /api/<collection>/:id
pub async fn delete<T: Catalog>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id::<T>(&id)?;
    let doc = T::store(&state)
        .remove(id)
        .await?
        .ok_or_else(|| not_found::<T>())?;

    state.uploads.destroy_all(doc.stored_objects()).await;

    tracing::info!("Deleted {} {}", T::LABEL, id);
    Ok(ApiResponse::success(Message::new(format!(
        "{} deleted successfully",
        T::LABEL
    ))))
}

/// Insert a new document, destroying `uploaded` again if the insert fails
pub(crate) async fn commit_create<T: Catalog>(
    state: &AppState,
    doc: T,
    uploaded: Vec<(String, ResourceType)>,
) -> Result<T, ApiError> {
    if let Err(e) = T::store(state).insert(&doc).await {
        state.uploads.destroy_all(uploaded).await;
        return Err(e.into());
    }
    tracing::info!("Created {} {}", T::LABEL, doc.id());
    Ok(doc)
}

/// Replace an existing document. `uploaded` is undone on failure, `replaced`
/// is destroyed once the new version is persisted.
pub(crate) async fn commit_update<T: Catalog>(
    state: &AppState,
    doc: T,
    uploaded: Vec<(String, ResourceType)>,
    replaced: Vec<(String, ResourceType)>,
) -> Result<T, ApiError> {
    match T::store(state).replace(&doc).await {
        Ok(true) => {}
        Ok(false) => {
            state.uploads.destroy_all(uploaded).await;
            return Err(not_found::<T>());
        }
        Err(e) => {
            state.uploads.destroy_all(uploaded).await;
            return Err(e.into());
        }
    }

    state.uploads.destroy_all(replaced).await;
    tracing::info!("Updated {} {}", T::LABEL, doc.id());
    Ok(doc)
}

/// Load the current version of a document for an update
pub(crate) async fn load<T: Catalog>(state: &AppState, id: Uuid) -> Result<T, ApiError> {
    T::store(state)
        .find(id)
        .await?
        .ok_or_else(|| not_found::<T>())
}

pub(crate) fn parse_id<T: Document>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} id", T::LABEL)))
}

pub(crate) fn not_found<T: Document>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::LABEL))
}

/// Non-blank text field or a 400 naming it
pub(crate) fn required<'a>(form: &'a FormData, field: &str) -> Result<&'a str, ApiError> {
    form.text(field)
        .ok_or_else(|| ApiError::invalid_field(field, "is required"))
}

pub(crate) fn category_error(err: InvalidCategory) -> ApiError {
    ApiError::invalid_field("category", err.to_string())
}
