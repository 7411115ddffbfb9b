//! Canteen model as delivered by the remote `canteen` resource.

use serde::{Deserialize, Serialize};

/// Geographic position of a canteen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Postal address of a canteen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<GeoLocation>,
}

/// Contact details of a canteen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Opening interval within a business day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHour {
    pub open_at: String,
    pub close_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hour_type: Option<String>,
}

/// Opening hours for a single weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDay {
    pub day: String,
    #[serde(default)]
    pub business_hours: Vec<BusinessHour>,
}

/// A canteen. Immutable snapshot of what the remote API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canteen {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_days: Option<Vec<BusinessDay>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Canteen {
    /// Opening hours for the given weekday name, if the canteen publishes any.
    pub fn hours_on(&self, day: &str) -> Option<&BusinessDay> {
        self.business_days
            .as_ref()?
            .iter()
            .find(|d| d.day.eq_ignore_ascii_case(day))
    }
}
