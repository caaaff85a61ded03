// handlers/certificates.rs - POST /api/certificates
//
// The certificate document is stored raw; the optional logo goes through the
// image pipeline like product photos.

use axum::extract::{Multipart, State};
use uuid::Uuid;

use super::catalog::{self, category_error, required, Catalog};
use crate::database::models::{Certificate, CertificateCategory};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::storage::ResourceType;
use crate::upload::{read_form, CERTIFICATE_FORM};

const LOGO_FOLDER: &str = "certificates/logos";

pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Certificate> {
    let mut form = read_form(multipart, &CERTIFICATE_FORM).await?;

    let name = required(&form, "title")?.to_string();
    let category = required(&form, "category")?
        .parse::<CertificateCategory>()
        .map_err(category_error)?;
    let file = form
        .take_files("file")
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::invalid_field("file", "is required"))?;
    let logo = form.take_files("logo").into_iter().next();

    let document = state.uploads.store_raw(file, Certificate::FOLDER).await?;

    let logo = match logo {
        Some(logo) => match state.uploads.store_image(logo, LOGO_FOLDER).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                state
                    .uploads
                    .destroy_all([(document.public_id.clone(), ResourceType::Raw)])
                    .await;
                return Err(e.into());
            }
        },
        None => None,
    };

    let certificate = Certificate {
        id: Uuid::new_v4(),
        name,
        url: document.url,
        public_id: Some(document.public_id),
        category,
        logo,
    };
    let uploaded = certificate.stored_objects();
    let certificate = catalog::commit_create(&state, certificate, uploaded).await?;
    Ok(ApiResponse::created(certificate).with_message("Certificate uploaded successfully"))
}
