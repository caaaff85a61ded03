use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CabinetCategory, ImageRef};
use crate::database::repository::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: CabinetCategory,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";
    const LABEL: &'static str = "Product";

    fn id(&self) -> Uuid {
        self.id
    }

    fn category(&self) -> &'static str {
        self.category.label()
    }
}
