//! User preferences persisted in the settings store.

use serde::{Deserialize, Serialize};

use super::Canteen;

/// Customer group used to pick the displayed meal price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    #[default]
    Students,
    Employees,
    Guests,
}

impl PriceCategory {
    /// The `priceType` label the remote API uses for this group.
    pub fn price_type(&self) -> &'static str {
        match self {
            PriceCategory::Students => "Studierende",
            PriceCategory::Employees => "Angestellte",
            PriceCategory::Guests => "Gäste",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub price_category: PriceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_canteen: Option<Canteen>,
}
