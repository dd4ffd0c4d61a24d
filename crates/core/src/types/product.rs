//! Catalog product records as returned by the catalog API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Quantity};

/// A color variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Color name; case-sensitive when used as part of a cart key.
    #[serde(rename = "colorName")]
    pub name: String,
    /// Image path for this color, if it has its own photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Color {
    /// Create a color without a dedicated image.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }
}

/// A handcrafted product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub old_price: Option<Decimal>,
    pub new_price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub trending: bool,
}

impl Product {
    /// Whether any units are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Clamp a requested quantity to the available stock.
    ///
    /// Returns `None` if the product is out of stock.
    #[must_use]
    pub fn clamp_quantity(&self, requested: Quantity) -> Option<Quantity> {
        requested.clamp_to_stock(self.stock_quantity)
    }

    /// Look up one of this product's colors by exact name.
    #[must_use]
    pub fn color(&self, name: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.name == name)
    }

    /// Whether this product belongs to `category` (case-insensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }
}

/// Categories a new product can be filed under.
pub const PRODUCT_CATEGORIES: [&str; 3] = [DEFAULT_CATEGORY, "Women", "Children"];

const DEFAULT_CATEGORY: &str = "Men";

/// Map a submitted category onto [`PRODUCT_CATEGORIES`].
///
/// Matching is case-insensitive; anything unknown is filed under "Men".
#[must_use]
pub fn known_category(raw: &str) -> &'static str {
    let raw = raw.trim();
    PRODUCT_CATEGORIES
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(raw))
        .unwrap_or(DEFAULT_CATEGORY)
}

/// A product to be created through the catalog API.
///
/// Image fields hold paths returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub cover_image: String,
    pub colors: Vec<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Decimal>,
    pub new_price: Decimal,
    pub stock_quantity: u32,
    pub trending: bool,
}
