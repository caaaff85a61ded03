use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CabinetCategory, ImageRef};
use crate::database::repository::Document;

/// A completed installation shown in the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub category: CabinetCategory,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn id(&self) -> Uuid {
        self.id
    }

    fn category(&self) -> &'static str {
        self.category.label()
    }
}
