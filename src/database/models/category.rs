use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cabinet families shared by products and projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CabinetCategory {
    #[serde(rename = "ตู้พาเนล")]
    Panel,
    #[serde(rename = "ตู้เฟรม")]
    Frame,
}

impl CabinetCategory {
    pub const ALL: [CabinetCategory; 2] = [CabinetCategory::Panel, CabinetCategory::Frame];

    pub fn label(&self) -> &'static str {
        match self {
            CabinetCategory::Panel => "ตู้พาเนล",
            CabinetCategory::Frame => "ตู้เฟรม",
        }
    }
}

/// Issuing body of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateCategory {
    #[serde(rename = "สี")]
    Paint,
    #[serde(rename = "เหล็ก")]
    Steel,
    #[serde(rename = "สถาบันไฟฟ้าและอิเล็กทรอนิกส์")]
    ElectricalInstitute,
}

impl CertificateCategory {
    pub const ALL: [CertificateCategory; 3] = [
        CertificateCategory::Paint,
        CertificateCategory::Steel,
        CertificateCategory::ElectricalInstitute,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CertificateCategory::Paint => "สี",
            CertificateCategory::Steel => "เหล็ก",
            CertificateCategory::ElectricalInstitute => "สถาบันไฟฟ้าและอิเล็กทรอนิกส์",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCategory {
    pub value: String,
    pub allowed: Vec<&'static str>,
}

impl std::fmt::Display for InvalidCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid category '{}', expected one of: {}",
            self.value,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for InvalidCategory {}

impl FromStr for CabinetCategory {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s.trim())
            .ok_or_else(|| InvalidCategory {
                value: s.to_string(),
                allowed: Self::ALL.iter().map(|c| c.label()).collect(),
            })
    }
}

impl FromStr for CertificateCategory {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s.trim())
            .ok_or_else(|| InvalidCategory {
                value: s.to_string(),
                allowed: Self::ALL.iter().map(|c| c.label()).collect(),
            })
    }
}
