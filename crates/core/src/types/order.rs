//! Customer order records as returned by the order API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::progress::{ProgressKey, ProgressStep};
use crate::types::{Color, Email, OrderId, ProductId};

/// Reference to the ordered product, populated by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProductRef {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
}

/// One product-color line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "productId")]
    pub product: OrderProductRef,
    pub color: Color,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl OrderLine {
    /// Key under which this line's progress is stored.
    #[must_use]
    pub fn progress_key(&self) -> ProgressKey {
        ProgressKey::new(self.product.id.clone(), self.color.name.clone())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_email")]
    pub email: Option<Email>,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    pub total_price: Decimal,
    /// Progress percentage per `"{product_id}|{color}"` key.
    #[serde(default)]
    pub product_progress: BTreeMap<String, u8>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Current progress of one order line.
    ///
    /// Missing entries and values that are not a known milestone read as
    /// [`ProgressStep::NotStarted`].
    #[must_use]
    pub fn progress_of(&self, key: &ProgressKey) -> ProgressStep {
        self.product_progress
            .get(&key.to_string())
            .and_then(|&value| ProgressStep::try_from(value).ok())
            .unwrap_or_default()
    }

    /// Short reference shown to staff (first 8 characters of the id).
    #[must_use]
    pub fn short_ref(&self) -> &str {
        let id = self.id.as_str();
        id.char_indices()
            .nth(8)
            .and_then(|(end, _)| id.get(..end))
            .unwrap_or(id)
    }
}

/// Orders with a malformed contact email are still displayed; they just
/// cannot receive notifications.
fn lenient_email<'de, D>(deserializer: D) -> Result<Option<Email>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| Email::parse(&s).ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": "65a0b1c2d3e4f5",
            "name": "Amina",
            "email": "amina@example.com",
            "products": [
                { "productId": { "_id": "p1", "title": "Kaftan" }, "color": { "colorName": "Red" } },
                { "productId": { "_id": "p2", "title": "Jellaba" }, "color": { "colorName": "Blue" } }
            ],
            "totalPrice": 240,
            "productProgress": { "p1|Red": 60, "p2|Blue": 55 },
            "createdAt": "2025-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_progress_of() {
        let order = sample();
        let red = order.products[0].progress_key();
        let blue = order.products[1].progress_key();
        assert_eq!(order.progress_of(&red), ProgressStep::Sixty);
        // 55 is not a milestone
        assert_eq!(order.progress_of(&blue), ProgressStep::NotStarted);
        let unknown = ProgressKey::new(ProductId::parse("p9").unwrap(), "Red".into());
        assert_eq!(order.progress_of(&unknown), ProgressStep::NotStarted);
    }

    #[test]
    fn test_malformed_email_is_dropped() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "email": "not-an-email",
            "totalPrice": "10.00"
        }))
        .unwrap();
        assert!(order.email.is_none());
        assert!(order.products.is_empty());
    }

    #[test]
    fn test_short_ref() {
        assert_eq!(sample().short_ref(), "65a0b1c2");
        let order: Order =
            serde_json::from_value(serde_json::json!({ "_id": "abc", "totalPrice": 1 })).unwrap();
        assert_eq!(order.short_ref(), "abc");
    }
}
