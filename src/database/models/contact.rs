use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Contact form payload as posted by the website
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
}

/// A stored submission; written once and never read back
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// Plain-text summary sent to the company inbox
    pub fn summary(&self) -> String {
        fn or_dash(value: &Option<String>) -> &str {
            value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
        }

        format!(
            "Name: {} {}\nSubject: {}\nEmail: {}\nPhone: {}\nCompany: {}\n",
            self.first_name,
            or_dash(&self.last_name),
            or_dash(&self.subject),
            self.email,
            or_dash(&self.phone),
            or_dash(&self.company),
        )
    }
}
