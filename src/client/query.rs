//! Query parameter builders for the remote Mensa API.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rendered `(name, value)` query pairs.
pub type Params = Vec<(&'static str, String)>;

/// Sort direction for `sortby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A `sortby` expression: `field`, `field:asc` or `field:desc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortBy {
    pub field: String,
    pub direction: Option<SortDirection>,
}

impl SortBy {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(SortDirection::Asc),
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(SortDirection::Desc),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            None => write!(f, "{}", self.field),
            Some(SortDirection::Asc) => write!(f, "{}:asc", self.field),
            Some(SortDirection::Desc) => write!(f, "{}:desc", self.field),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            None => (s, None),
            Some((field, "asc")) => (field, Some(SortDirection::Asc)),
            Some((field, "desc")) => (field, Some(SortDirection::Desc)),
            Some((_, other)) => return Err(format!("Unknown sort direction: {}", other)),
        };
        if field.trim().is_empty() {
            return Err("Sort field is empty".to_string());
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl TryFrom<String> for SortBy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortBy> for String {
    fn from(value: SortBy) -> Self {
        value.to_string()
    }
}

/// How much related data the API embeds in its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingType {
    Lazy,
    Complete,
}

impl LoadingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingType::Lazy => "lazy",
            LoadingType::Complete => "complete",
        }
    }
}

fn push_paging(params: &mut Params, limit: Option<u32>, page: Option<u32>, sortby: &Option<SortBy>) {
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    if let Some(sortby) = sortby {
        params.push(("sortby", sortby.to_string()));
    }
}

/// Filter for the `canteen` resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanteenQuery {
    #[serde(default)]
    pub loadingtype: Option<LoadingType>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub sortby: Option<SortBy>,
}

impl CanteenQuery {
    pub fn complete() -> Self {
        Self {
            loadingtype: Some(LoadingType::Complete),
            ..Self::default()
        }
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(lt) = self.loadingtype {
            params.push(("loadingtype", lt.as_str().to_string()));
        }
        push_paging(&mut params, self.limit, self.page, &self.sortby);
        params
    }
}

/// Filter for the `meal` resource.
///
/// `additive` and `badge` are comma-separated id lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Maximum price
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub additive: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub sortby: Option<SortBy>,
}

impl MealFilter {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(price) = self.price {
            params.push(("price", format!("{:.2}", price)));
        }
        if let Some(additive) = &self.additive {
            params.push(("additive", additive.clone()));
        }
        if let Some(badge) = &self.badge {
            params.push(("badge", badge.clone()));
        }
        push_paging(&mut params, self.limit, self.page, &self.sortby);
        params
    }
}

/// Filter for the `menue` resource.
#[derive(Debug, Clone)]
pub struct MenuQuery {
    pub canteen_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub loadingtype: LoadingType,
}

impl MenuQuery {
    /// Menu of one canteen for a single day.
    pub fn for_day(canteen_id: &str, date: NaiveDate) -> Self {
        Self {
            canteen_id: canteen_id.to_string(),
            start_date: date,
            end_date: date,
            loadingtype: LoadingType::Complete,
        }
    }

    pub fn to_params(&self) -> Params {
        vec![
            ("loadingtype", self.loadingtype.as_str().to_string()),
            ("canteenId", self.canteen_id.clone()),
            ("startdate", self.start_date.format("%Y-%m-%d").to_string()),
            ("enddate", self.end_date.format("%Y-%m-%d").to_string()),
        ]
    }
}
