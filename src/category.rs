use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed item kinds, each backed by its own table and image directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Figures,
    Clothing,
    Goods,
}

impl CategoryType {
    /// Returns the URL slug, also used as table file stem and image subdirectory
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Figures => "figures",
            CategoryType::Clothing => "clothing",
            CategoryType::Goods => "goods",
        }
    }

    /// Returns the `main_category` label written into every new row
    pub fn label(&self) -> &'static str {
        match self {
            CategoryType::Figures => "手办",
            CategoryType::Clothing => "衣服",
            CategoryType::Goods => "好物",
        }
    }

    /// Parse a slug (e.g. "figures") into a CategoryType
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "figures" => Some(CategoryType::Figures),
            "clothing" => Some(CategoryType::Clothing),
            "goods" => Some(CategoryType::Goods),
            _ => None,
        }
    }

    /// Returns all category types in display order
    pub fn all() -> &'static [CategoryType] {
        &[
            CategoryType::Figures,
            CategoryType::Clothing,
            CategoryType::Goods,
        ]
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
