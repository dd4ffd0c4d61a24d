//! Server-side cart storage.
//!
//! Each browser session carries only a [`CartId`]; the carts themselves live
//! here, one `Mutex` per cart. Handlers take the cart's lock for the whole
//! read-modify-write, so concurrent requests from one session (double
//! clicks, parallel HTMX swaps) apply one after the other.
//!
//! Carts idle for as long as a session are evicted, and like sessions they
//! do not survive a restart.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::Cart;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_sessions::Session;
use uuid::Uuid;

use crate::middleware::session::keys;

/// Upper bound on carts held in memory.
const MAX_CARTS: u64 = 100_000;

/// Identifier of a server-side cart, stored in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(Uuid);

impl CartId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The cart id of this session, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn current(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.get::<Self>(keys::CART_ID).await
    }

    /// The cart id of this session, assigning a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn get_or_assign(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        if let Some(id) = Self::current(session).await? {
            return Ok(id);
        }
        let id = Self::new();
        session.insert(keys::CART_ID, id).await?;
        Ok(id)
    }
}

/// In-memory carts keyed by [`CartId`].
#[derive(Clone)]
pub struct CartStore {
    carts: Cache<CartId, Arc<Mutex<Cart>>>,
}

impl CartStore {
    /// Create a store whose carts expire after `idle` without use.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            carts: Cache::builder()
                .max_capacity(MAX_CARTS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Lock the cart for `id`, creating an empty one on first use.
    ///
    /// The guard must be held across the whole mutation.
    pub async fn lock(&self, id: CartId) -> OwnedMutexGuard<Cart> {
        let cart = self
            .carts
            .get_with(id, async { Arc::new(Mutex::new(Cart::new())) })
            .await;
        cart.lock_owned().await
    }

    /// A copy of the cart for `id`; unknown ids read as an empty cart.
    pub async fn snapshot(&self, id: Option<CartId>) -> Cart {
        let Some(id) = id else {
            return Cart::new();
        };
        match self.carts.get(&id).await {
            Some(cart) => cart.lock().await.clone(),
            None => Cart::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::{CartItem, ProductId, Quantity};
    use rust_decimal::Decimal;

    use super::*;

    fn item() -> CartItem {
        CartItem::new(
            ProductId::parse("p1").unwrap(),
            "Kaftan",
            None,
            Decimal::from(10),
            Quantity::ONE,
        )
    }

    #[tokio::test]
    async fn test_unknown_cart_is_empty() {
        let store = CartStore::new(Duration::from_secs(60));
        assert!(store.snapshot(None).await.is_empty());
        assert!(store.snapshot(Some(CartId::new())).await.is_empty());
    }

    #[tokio::test]
    async fn test_lock_persists_changes() {
        let store = CartStore::new(Duration::from_secs(60));
        let id = CartId::new();

        store.lock(id).await.add(item());
        store.lock(id).await.add(item());

        let cart = store.snapshot(Some(id)).await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert!(store.snapshot(Some(CartId::new())).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_serialized() {
        let store = CartStore::new(Duration::from_secs(60));
        let id = CartId::new();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.spawn(async move {
                let mut cart = store.lock(id).await;
                let before = cart.item_count();
                tokio::task::yield_now().await;
                cart.add(item());
                assert_eq!(cart.item_count(), before + 1);
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(store.snapshot(Some(id)).await.item_count(), 50);
    }
}
