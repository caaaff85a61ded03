// handlers/contact.rs - POST /api/contact (also mounted at /api/contract)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{Contact, ContactForm};
use crate::error::ApiError;
use crate::mail::MailMessage;
use crate::middleware::ApiJson;
use crate::state::AppState;

const MAIL_SUBJECT: &str = "New contact from the website";

/// Persist the submission, then forward it to the company inbox.
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(first_name), Some(email)) = (non_blank(form.first_name), non_blank(form.email))
    else {
        return Err(ApiError::bad_request("First name and email are required"));
    };

    let contact = Contact {
        id: Uuid::new_v4(),
        first_name,
        last_name: non_blank(form.last_name),
        email,
        phone: non_blank(form.phone),
        company: non_blank(form.company),
        subject: non_blank(form.subject),
        created_at: Utc::now(),
    };
    state.contacts.insert(&contact).await?;
    tracing::info!("Stored contact submission {}", contact.id);

    state
        .mailer
        .send(MailMessage {
            subject: MAIL_SUBJECT.to_string(),
            text: contact.summary(),
            html: None,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Contact submitted successfully"
        })),
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
