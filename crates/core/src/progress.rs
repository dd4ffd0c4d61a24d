//! Order progress tracking.
//!
//! Each product-color line of an order moves through fixed milestones
//! (20% steps). Staff record a milestone for one line at a time; reaching
//! 60% or 100% triggers a notification to the customer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Email, IdError, Order, ProductId};

/// Errors produced when parsing progress input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("{0}% is not a progress milestone")]
    UnknownMilestone(u8),
    #[error("progress key must look like 'product|color'")]
    MalformedKey,
    #[error("invalid product id in progress key: {0}")]
    InvalidProduct(#[from] IdError),
}

/// A progress milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProgressStep {
    #[default]
    NotStarted,
    Twenty,
    Forty,
    Sixty,
    Eighty,
    Complete,
}

impl ProgressStep {
    /// Milestones staff can select, in order.
    pub const STEPS: [Self; 5] = [
        Self::Twenty,
        Self::Forty,
        Self::Sixty,
        Self::Eighty,
        Self::Complete,
    ];

    /// Percentage for this milestone.
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Twenty => 20,
            Self::Forty => 40,
            Self::Sixty => 60,
            Self::Eighty => 80,
            Self::Complete => 100,
        }
    }

    /// Whether reaching this milestone notifies the customer.
    #[must_use]
    pub const fn notifies_customer(self) -> bool {
        matches!(self, Self::Sixty | Self::Complete)
    }
}

impl TryFrom<u8> for ProgressStep {
    type Error = ProgressError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        match percent {
            0 => Ok(Self::NotStarted),
            20 => Ok(Self::Twenty),
            40 => Ok(Self::Forty),
            60 => Ok(Self::Sixty),
            80 => Ok(Self::Eighty),
            100 => Ok(Self::Complete),
            other => Err(ProgressError::UnknownMilestone(other)),
        }
    }
}

impl From<ProgressStep> for u8 {
    fn from(step: ProgressStep) -> Self {
        step.percent()
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Identifies one product-color line within an order.
///
/// Rendered as `"{product_id}|{color_name}"`, the format the order API uses
/// for its progress map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgressKey {
    pub product_id: ProductId,
    pub color_name: String,
}

impl ProgressKey {
    #[must_use]
    pub const fn new(product_id: ProductId, color_name: String) -> Self {
        Self {
            product_id,
            color_name,
        }
    }

    /// Parse a `"product|color"` key.
    ///
    /// # Errors
    ///
    /// Returns an error if the separator is missing, the color is empty, or
    /// the product id is invalid.
    pub fn parse(raw: &str) -> Result<Self, ProgressError> {
        let (product, color) = raw.split_once('|').ok_or(ProgressError::MalformedKey)?;
        if color.is_empty() {
            return Err(ProgressError::MalformedKey);
        }
        Ok(Self::new(ProductId::parse(product)?, color.to_owned()))
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.product_id, self.color_name)
    }
}

/// Customer notification to send after a progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNotification {
    pub email: Email,
    pub product_key: String,
    pub progress: ProgressStep,
}

/// Result of planning a progress update for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// The complete progress map to store on the order.
    pub product_progress: BTreeMap<String, u8>,
    /// Notification to send once the update is stored, if any.
    pub notification: Option<ProgressNotification>,
}

/// Compute the new progress map for `order` with `key` set to `step`.
///
/// The notification is planned whenever the saved milestone notifies the
/// customer and the order has a contact email, even if the line was already
/// at that milestone.
#[must_use]
pub fn plan_update(order: &Order, key: &ProgressKey, step: ProgressStep) -> ProgressUpdate {
    let mut product_progress = order.product_progress.clone();
    product_progress.insert(key.to_string(), step.percent());

    let notification = order
        .email
        .as_ref()
        .filter(|_| step.notifies_customer())
        .map(|email| ProgressNotification {
            email: email.clone(),
            product_key: key.to_string(),
            progress: step,
        });

    ProgressUpdate {
        product_progress,
        notification,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(email: Option<&str>) -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "name": "Amina",
            "email": email,
            "totalPrice": 50,
            "productProgress": { "p2|Blue": 40 }
        }))
        .unwrap()
    }

    fn key() -> ProgressKey {
        ProgressKey::parse("p1|Red").unwrap()
    }

    #[test]
    fn test_step_round_trip_through_percent() {
        for step in ProgressStep::STEPS {
            assert_eq!(ProgressStep::try_from(step.percent()), Ok(step));
        }
        assert_eq!(
            ProgressStep::try_from(50),
            Err(ProgressError::UnknownMilestone(50))
        );
    }

    #[test]
    fn test_only_sixty_and_complete_notify() {
        let notifying: Vec<_> = ProgressStep::STEPS
            .into_iter()
            .filter(|s| s.notifies_customer())
            .collect();
        assert_eq!(notifying, vec![ProgressStep::Sixty, ProgressStep::Complete]);
    }

    #[test]
    fn test_key_parse_and_display() {
        let key = key();
        assert_eq!(key.product_id.as_str(), "p1");
        assert_eq!(key.color_name, "Red");
        assert_eq!(key.to_string(), "p1|Red");
        assert_eq!(ProgressKey::parse("p1"), Err(ProgressError::MalformedKey));
        assert_eq!(ProgressKey::parse("p1|"), Err(ProgressError::MalformedKey));
        assert!(matches!(
            ProgressKey::parse("|Red"),
            Err(ProgressError::InvalidProduct(IdError::Empty))
        ));
    }

    #[test]
    fn test_plan_update_merges_progress() {
        let update = plan_update(&order(None), &key(), ProgressStep::Forty);
        assert_eq!(update.product_progress.get("p1|Red"), Some(&40));
        assert_eq!(update.product_progress.get("p2|Blue"), Some(&40));
        assert!(update.notification.is_none());
    }

    #[test]
    fn test_plan_update_notifies_at_milestones() {
        let order = order(Some("amina@example.com"));
        let at_sixty = plan_update(&order, &key(), ProgressStep::Sixty);
        let notification = at_sixty.notification.unwrap();
        assert_eq!(notification.product_key, "p1|Red");
        assert_eq!(notification.progress, ProgressStep::Sixty);
        assert_eq!(notification.email.as_str(), "amina@example.com");

        assert!(plan_update(&order, &key(), ProgressStep::Complete).notification.is_some());
        assert!(plan_update(&order, &key(), ProgressStep::Eighty).notification.is_none());
    }

    #[test]
    fn test_no_notification_without_email() {
        let update = plan_update(&order(None), &key(), ProgressStep::Complete);
        assert!(update.notification.is_none());
    }

    #[test]
    fn test_notification_serializes_percent() {
        let update = plan_update(&order(Some("a@b.c")), &key(), ProgressStep::Complete);
        let json = serde_json::to_value(update.notification.unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": "a@b.c", "productKey": "p1|Red", "progress": 100 })
        );
    }
}
