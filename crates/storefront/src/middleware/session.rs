//! Session middleware configuration.
//!
//! Sessions live in process memory only. A session holds the id of the
//! shopper's cart (see [`crate::carts`]) and pending notices; both are gone
//! when the session expires or the server restarts.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "atelier_session";

/// Session expiry time in seconds (7 days).
pub const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Keys for data stored in the session.
pub mod keys {
    /// Key for the id of the shopper's cart in the cart store.
    pub const CART_ID: &str = "cart_id";

    /// Key for notices waiting to be shown on the next page.
    pub const NOTICES: &str = "notices";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
