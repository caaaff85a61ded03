use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{MailError, MailMessage, Mailer};
use crate::config::MailConfig;

/// Resend transactional email API client
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
    receiver: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    message: String,
}

impl ResendMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            receiver: config.receiver.clone(),
        }
    }

    fn emails_url(&self) -> Result<Url, MailError> {
        Url::parse(&format!("{}/emails", self.base_url))
            .map_err(|_| MailError::NotConfigured("RESEND_BASE_URL"))
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let receiver = self
            .receiver
            .as_deref()
            .ok_or(MailError::NotConfigured("EMAIL_RECEIVER"))?;
        if self.api_key.is_empty() {
            return Err(MailError::NotConfigured("RESEND_API_KEY"));
        }

        let request = SendEmailRequest {
            from: &self.from,
            to: vec![receiver],
            subject: &message.subject,
            text: &message.text,
            html: message.html.as_deref().unwrap_or(&message.text),
        };

        let response = self
            .client
            .post(self.emails_url()?)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ResendError>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(MailError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Email sent to {}", receiver);
        Ok(())
    }
}
