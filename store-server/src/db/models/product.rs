//! Product model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// Catalog product
///
/// `stock` is mutated both by owner edits and, atomically, by order
/// creation. It can never go negative; decrements clamp at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    /// Promotional price; when present it is strictly less than `price`
    #[serde(default)]
    pub discounted_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    /// Display images, at most 3
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub scents: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub limited_edition: bool,
    /// Candle size, e.g. "Large - 2 x 4 cm"
    #[serde(default)]
    pub size: Option<String>,
    /// Deprecated legacy alias of `size`, kept for old documents
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "price must be positive"))]
    pub price: f64,
    #[serde(default)]
    pub discounted_price: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i64,
    #[serde(default)]
    #[validate(length(max = 3, message = "at most 3 images"))]
    pub images: Vec<String>,
    #[serde(default)]
    pub scents: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub limited_edition: bool,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, message = "price must be positive"))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 3, message = "at most 3 images"))]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limited_edition: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}
