pub mod category;
pub mod certificate;
pub mod contact;
pub mod product;
pub mod project;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::storage::StoredObject;

pub use category::{CabinetCategory, CertificateCategory, InvalidCategory};
pub use certificate::Certificate;
pub use contact::{Contact, ContactForm};
pub use product::Product;
pub use project::Project;
pub use user::User;

/// Reference to an image held by the object storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
}

impl From<StoredObject> for ImageRef {
    fn from(object: StoredObject) -> Self {
        Self {
            url: object.url,
            public_id: object.public_id,
        }
    }
}
