use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CertificateCategory;
use crate::database::repository::Document;
use crate::storage::{ResourceType, StoredObject};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    /// Delivery URL of the certificate document (raw upload)
    pub url: String,
    pub public_id: Option<String>,
    pub category: CertificateCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<StoredObject>,
}

impl Certificate {
    /// Every stored object of this certificate with the resource type it was uploaded as
    pub fn stored_objects(&self) -> Vec<(String, ResourceType)> {
        let mut objects = Vec::with_capacity(2);
        if let Some(public_id) = &self.public_id {
            objects.push((public_id.clone(), ResourceType::Raw));
        }
        if let Some(logo) = &self.logo {
            objects.push((logo.public_id.clone(), ResourceType::Image));
        }
        objects
    }
}

impl Document for Certificate {
    const COLLECTION: &'static str = "certificates";
    const LABEL: &'static str = "Certificate";

    fn id(&self) -> Uuid {
        self.id
    }

    fn category(&self) -> &'static str {
        self.category.label()
    }
}
