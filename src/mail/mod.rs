pub mod resend;

use async_trait::async_trait;
use thiserror::Error;

pub use resend::ResendMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail provider rejected message ({status}): {message}")]
    Remote { status: u16, message: String },
}

/// Message addressed to the company inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub text: String,
    /// Falls back to `text` when absent
    pub html: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}
