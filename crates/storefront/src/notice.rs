//! Transient notices shown to the shopper.
//!
//! Cart mutations report a [`CartEvent`]; this module decides which events
//! deserve a notice. Notices reach the browser two ways: as an `HX-Trigger`
//! event on HTMX fragment responses, or flashed into the session and rendered
//! by the next full page.

use atelier_core::CartEvent;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::middleware::session::keys;

/// Severity of a notice; drives styling and auto-dismiss behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A transient message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Notice for a cart event, if the event warrants one.
    ///
    /// Quantity edits and no-ops stay silent.
    #[must_use]
    pub fn for_cart_event(event: &CartEvent) -> Option<Self> {
        match event {
            CartEvent::Added { .. } | CartEvent::Merged { .. } => {
                Some(Self::new(NoticeKind::Success, "Product Added to the Cart"))
            }
            CartEvent::Removed { .. } => {
                Some(Self::new(NoticeKind::Info, "Product Removed from Cart"))
            }
            CartEvent::Cleared { .. } => Some(Self::new(NoticeKind::Warning, "Cart Cleared")),
            CartEvent::QuantityUpdated { .. } | CartEvent::Unchanged => None,
        }
    }
}

/// Build the `HX-Trigger` header value for a cart fragment response.
///
/// Always fires `cart-updated`; adds a `notice` event when present.
#[must_use]
pub fn hx_trigger(notice: Option<&Notice>) -> String {
    let mut events = serde_json::Map::new();
    events.insert("cart-updated".to_string(), serde_json::Value::Null);
    if let Some(notice) = notice {
        if let Ok(value) = serde_json::to_value(notice) {
            events.insert("notice".to_string(), value);
        }
    }
    serde_json::Value::Object(events).to_string()
}

/// Queue a notice for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn flash(session: &Session, notice: Notice) -> Result<(), tower_sessions::session::Error> {
    let mut pending = session
        .get::<Vec<Notice>>(keys::NOTICES)
        .await?
        .unwrap_or_default();
    pending.push(notice);
    session.insert(keys::NOTICES, pending).await
}

/// Take all queued notices. Session failures are logged and yield none.
pub async fn take_all(session: &Session) -> Vec<Notice> {
    match session.remove::<Vec<Notice>>(keys::NOTICES).await {
        Ok(notices) => notices.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read notices from session: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::{LineKey, ProductId, Quantity};

    use super::*;

    fn key() -> LineKey {
        LineKey::new(ProductId::parse("p1").unwrap(), Some("Red".into()))
    }

    #[test]
    fn test_cart_event_notices() {
        let added = Notice::for_cart_event(&CartEvent::Added {
            key: key(),
            quantity: Quantity::ONE,
        })
        .unwrap();
        assert_eq!(added.kind, NoticeKind::Success);

        let merged = Notice::for_cart_event(&CartEvent::Merged {
            key: key(),
            quantity: Quantity::ONE,
        })
        .unwrap();
        assert_eq!(merged, added);

        let removed = Notice::for_cart_event(&CartEvent::Removed { key: key() }).unwrap();
        assert_eq!(removed.kind, NoticeKind::Info);
        assert_eq!(removed.message, "Product Removed from Cart");

        let cleared = Notice::for_cart_event(&CartEvent::Cleared { removed: 0 }).unwrap();
        assert_eq!(cleared.kind, NoticeKind::Warning);
    }

    #[test]
    fn test_silent_events() {
        assert!(Notice::for_cart_event(&CartEvent::Unchanged).is_none());
        assert!(
            Notice::for_cart_event(&CartEvent::QuantityUpdated {
                key: key(),
                quantity: Quantity::ONE
            })
            .is_none()
        );
    }

    #[test]
    fn test_hx_trigger() {
        let bare: serde_json::Value = serde_json::from_str(&hx_trigger(None)).unwrap();
        assert_eq!(bare, serde_json::json!({ "cart-updated": null }));

        let notice = Notice::new(NoticeKind::Warning, "Cart Cleared");
        let full: serde_json::Value = serde_json::from_str(&hx_trigger(Some(&notice))).unwrap();
        assert_eq!(
            full,
            serde_json::json!({
                "cart-updated": null,
                "notice": { "kind": "warning", "message": "Cart Cleared" }
            })
        );
    }
}
