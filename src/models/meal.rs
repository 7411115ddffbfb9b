//! Meal, menu, badge and additive models.

use serde::{Deserialize, Serialize};

use super::{MealReview, PriceCategory};

/// A price for one customer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub price_type: String,
    pub price: f64,
}

/// A food additive or allergen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Additive {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenceid: Option<String>,
}

/// A badge such as "vegan" or "climate friendly".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A meal. Immutable snapshot of what the remote API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prices: Vec<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additives: Option<Vec<Additive>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<Badge>>,
    /// Water footprint in litres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_bilanz: Option<f64>,
    /// CO2 footprint in grams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_bilanz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_reviews: Option<Vec<MealReview>>,
}

impl Meal {
    /// Price for the given customer group, if listed.
    pub fn price_for(&self, category: PriceCategory) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.price_type.eq_ignore_ascii_case(category.price_type()))
            .map(|p| p.price)
    }

    pub fn has_badge(&self, name: &str) -> bool {
        self.badges
            .iter()
            .flatten()
            .any(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// All meals a canteen serves on one date (the remote `menue` resource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub date: String,
    pub canteen_id: String,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl Menu {
    /// A menu with no meals, used when the canteen publishes nothing for the date.
    pub fn empty(canteen_id: &str, date: &str) -> Self {
        Self {
            date: date.to_string(),
            canteen_id: canteen_id.to_string(),
            meals: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal() -> Meal {
        serde_json::from_str(
            r#"{
                "id": "m1",
                "name": "Linsencurry",
                "prices": [
                    {"priceType": "Studierende", "price": 1.95},
                    {"priceType": "Angestellte", "price": 3.45},
                    {"priceType": "Gäste", "price": 4.20}
                ],
                "category": "Essen",
                "badges": [{"id": "b1", "name": "Vegan"}],
                "co2Bilanz": 312.5
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_price_for_category() {
        let meal = meal();
        assert_eq!(meal.price_for(PriceCategory::Students), Some(1.95));
        assert_eq!(meal.price_for(PriceCategory::Guests), Some(4.20));
    }

    #[test]
    fn test_badges() {
        let meal = meal();
        assert!(meal.has_badge("vegan"));
        assert!(!meal.has_badge("Fleisch"));
        assert_eq!(meal.co2_bilanz, Some(312.5));
    }
}
