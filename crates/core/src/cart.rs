//! Shopping cart store.
//!
//! A cart is an ordered list of line items. Each line item is identified by
//! its [`LineKey`]: the product id plus the selected color name, where "no
//! color selected" is its own key rather than a sentinel color name. At most
//! one line item exists per key and quantities are always positive.
//!
//! Mutations return a [`CartEvent`] describing what happened. Deciding
//! whether and how to tell the shopper is left to the caller.
//!
//! # Example
//!
//! ```rust
//! use atelier_core::{Cart, CartItem, Color, ProductId, Quantity};
//! use rust_decimal::Decimal;
//!
//! let mut cart = Cart::new();
//! let item = CartItem::new(
//!     ProductId::parse("p1").unwrap(),
//!     "Kaftan",
//!     Some(Color::named("Red")),
//!     Decimal::from(10),
//!     Quantity::new(2).unwrap(),
//! );
//! cart.add(item.clone());
//! cart.add(item);
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total_display(), "40.00");
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Color, Product, ProductId, Quantity, format_amount};

/// Label shown for line items without a selected color.
pub const ORIGINAL_COLOR_LABEL: &str = "Original";

/// Identity of a cart line item.
///
/// A product added without a color and the same product in a color literally
/// named "Original" are two different line items. Earlier versions of the
/// shop keyed lines by the color name or the "Original" label, which merged
/// the two; [`ORIGINAL_COLOR_LABEL`] is now only a display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    /// Selected color name; `None` when the product was added without one.
    pub color: Option<String>,
}

impl LineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, color: Option<String>) -> Self {
        Self { product_id, color }
    }

    /// Color label for display.
    #[must_use]
    pub fn color_label(&self) -> &str {
        self.color.as_deref().unwrap_or(ORIGINAL_COLOR_LABEL)
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.color {
            Some(color) => write!(f, "{}/{color}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub color: Option<Color>,
    /// Current selling price per unit.
    pub unit_price: Decimal,
    pub quantity: Quantity,
}

impl CartItem {
    /// Create a line item with only the fields the cart needs.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        title: impl Into<String>,
        color: Option<Color>,
        unit_price: Decimal,
        quantity: Quantity,
    ) -> Self {
        Self {
            product_id,
            title: title.into(),
            category: String::new(),
            cover_image: None,
            color,
            unit_price,
            quantity,
        }
    }

    /// Create a line item from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product, color: Option<Color>, quantity: Quantity) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            category: product.category.clone(),
            cover_image: product.cover_image.clone(),
            color,
            unit_price: product.new_price,
            quantity,
        }
    }

    /// The identity key of this line item.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(
            self.product_id.clone(),
            self.color.as_ref().map(|c| c.name.clone()),
        )
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id
            && self.color.as_ref().map(|c| c.name.as_str()) == key.color.as_deref()
    }

    /// Image to display: the color's own photo, else the product cover.
    #[must_use]
    pub fn display_image(&self) -> Option<&str> {
        self.color
            .as_ref()
            .and_then(|c| c.image.as_deref())
            .or(self.cover_image.as_deref())
    }

    /// Price of this line (`unit_price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity.get())
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line item was appended.
    Added { key: LineKey, quantity: Quantity },
    /// An existing line item's quantity was increased to `quantity`.
    Merged { key: LineKey, quantity: Quantity },
    /// A line item was deleted.
    Removed { key: LineKey },
    /// A line item's quantity was overwritten.
    QuantityUpdated { key: LineKey, quantity: Quantity },
    /// The cart was emptied; `removed` line items were dropped.
    Cleared { removed: usize },
    /// The target line item did not exist.
    Unchanged,
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line item by key.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Add an item, merging into an existing line item with the same key.
    ///
    /// No stock limit is applied here.
    pub fn add(&mut self, item: CartItem) -> CartEvent {
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return CartEvent::Merged {
                key,
                quantity: existing.quantity,
            };
        }

        let quantity = item.quantity;
        self.items.push(item);
        CartEvent::Added { key, quantity }
    }

    /// Remove the line item matching `key`; a missing key is a no-op.
    pub fn remove(&mut self, key: &LineKey) -> CartEvent {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(key));
        if self.items.len() == before {
            CartEvent::Unchanged
        } else {
            CartEvent::Removed { key: key.clone() }
        }
    }

    /// Overwrite the quantity of the line item matching `key`.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: Quantity) -> CartEvent {
        match self.items.iter_mut().find(|item| item.matches(key)) {
            Some(item) => {
                item.quantity = quantity;
                CartEvent::QuantityUpdated {
                    key: key.clone(),
                    quantity,
                }
            }
            None => CartEvent::Unchanged,
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) -> CartEvent {
        let removed = self.items.len();
        self.items.clear();
        CartEvent::Cleared { removed }
    }

    /// Sum of `quantity × unit_price` over all line items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total rounded to two decimal places, e.g. `"20.00"`.
    #[must_use]
    pub fn total_display(&self) -> String {
        format_amount(self.total())
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pid(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn item(id: &str, color: Option<&str>, price: i64, quantity: u32) -> CartItem {
        CartItem::new(
            pid(id),
            format!("Product {id}"),
            color.map(Color::named),
            Decimal::from(price),
            qty(quantity),
        )
    }

    fn key(id: &str, color: Option<&str>) -> LineKey {
        LineKey::new(pid(id), color.map(String::from))
    }

    #[test]
    fn test_checkout_scenario() {
        let mut cart = Cart::new();

        cart.add(item("p1", Some("Red"), 10, 2));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity.get(), 2);
        assert_eq!(cart.total_display(), "20.00");

        let event = cart.add(item("p1", Some("Red"), 10, 1));
        assert_eq!(
            event,
            CartEvent::Merged {
                key: key("p1", Some("Red")),
                quantity: qty(3)
            }
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_display(), "30.00");

        cart.add(item("p1", Some("Blue"), 10, 1));
        assert_eq!(cart.len(), 2);

        cart.remove(&key("p1", Some("Red")));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].key(), key("p1", Some("Blue")));

        assert_eq!(cart.clear(), CartEvent::Cleared { removed: 1 });
        assert!(cart.is_empty());
        assert_eq!(cart.total_display(), "0.00");
    }

    #[test]
    fn test_add_new_item_reports_added() {
        let mut cart = Cart::new();
        let event = cart.add(item("p1", None, 5, 1));
        assert_eq!(
            event,
            CartEvent::Added {
                key: key("p1", None),
                quantity: qty(1)
            }
        );
    }

    #[test]
    fn test_color_names_are_case_sensitive() {
        let mut cart = Cart::new();
        cart.add(item("p1", Some("Red"), 10, 1));
        cart.add(item("p1", Some("red"), 10, 1));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_no_color_does_not_collide_with_color_named_original() {
        let mut cart = Cart::new();
        cart.add(item("p1", None, 10, 1));
        cart.add(item("p1", Some(ORIGINAL_COLOR_LABEL), 10, 1));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].key().color_label(), "Original");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add(item("p1", Some("Red"), 10, 1));
        assert_eq!(cart.remove(&key("p1", Some("Blue"))), CartEvent::Unchanged);
        assert_eq!(cart.remove(&key("p2", Some("Red"))), CartEvent::Unchanged);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_update_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add(item("p1", Some("Red"), 10, 4));
        let event = cart.update_quantity(&key("p1", Some("Red")), qty(1));
        assert_eq!(
            event,
            CartEvent::QuantityUpdated {
                key: key("p1", Some("Red")),
                quantity: qty(1)
            }
        );
        assert_eq!(cart.get(&key("p1", Some("Red"))).unwrap().quantity, qty(1));
        assert_eq!(
            cart.update_quantity(&key("p9", None), qty(7)),
            CartEvent::Unchanged
        );
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_total_uses_decimal_prices() {
        let mut cart = Cart::new();
        let mut a = item("p1", None, 0, 3);
        a.unit_price = Decimal::new(1999, 2);
        let mut b = item("p2", None, 0, 1);
        b.unit_price = Decimal::new(5, 2);
        cart.add(a);
        cart.add(b);
        assert_eq!(cart.total(), Decimal::new(6002, 2));
        assert_eq!(cart.total_display(), "60.02");
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_display_image_prefers_color() {
        let mut line = item("p1", None, 1, 1);
        line.cover_image = Some("uploads/cover.jpg".into());
        assert_eq!(line.display_image(), Some("uploads/cover.jpg"));
        line.color = Some(Color {
            name: "Red".into(),
            image: Some("uploads/red.jpg".into()),
        });
        assert_eq!(line.display_image(), Some("uploads/red.jpg"));
    }

    #[test]
    fn test_serde_round_trip_for_session_storage() {
        let mut cart = Cart::new();
        cart.add(item("p1", Some("Red"), 10, 2));
        cart.add(item("p2", None, 7, 1));
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, usize, u32, i64),
        Remove(usize, usize),
        Update(usize, usize, u32),
        Clear,
    }

    const IDS: [&str; 3] = ["p1", "p2", "p3"];
    const COLORS: [Option<&str>; 3] = [None, Some("Red"), Some("Blue")];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..3usize, 0..3usize, 1..20u32, 1..500i64)
                .prop_map(|(p, c, q, price)| Op::Add(p, c, q, price)),
            2 => (0..3usize, 0..3usize).prop_map(|(p, c)| Op::Remove(p, c)),
            2 => (0..3usize, 0..3usize, 1..20u32).prop_map(|(p, c, q)| Op::Update(p, c, q)),
            1 => Just(Op::Clear),
        ]
    }

    fn apply(cart: &mut Cart, op: &Op) {
        match *op {
            Op::Add(p, c, q, price) => {
                cart.add(item(IDS[p], COLORS[c], price, q));
            }
            Op::Remove(p, c) => {
                cart.remove(&key(IDS[p], COLORS[c]));
            }
            Op::Update(p, c, q) => {
                cart.update_quantity(&key(IDS[p], COLORS[c]), qty(q));
            }
            Op::Clear => {
                cart.clear();
            }
        }
    }

    proptest! {
        #[test]
        fn prop_keys_stay_unique(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in &ops {
                apply(&mut cart, op);
            }
            let mut keys: Vec<_> = cart.items().iter().map(CartItem::key).collect();
            let len = keys.len();
            keys.sort_by_key(ToString::to_string);
            keys.dedup();
            prop_assert_eq!(keys.len(), len);
        }

        #[test]
        fn prop_same_key_adds_merge(p in 0..3usize, c in 0..3usize, a in 1..1000u32, b in 1..1000u32) {
            let mut cart = Cart::new();
            cart.add(item(IDS[p], COLORS[c], 10, a));
            cart.add(item(IDS[p], COLORS[c], 10, b));
            prop_assert_eq!(cart.len(), 1);
            prop_assert_eq!(cart.items()[0].quantity.get(), a + b);
        }

        #[test]
        fn prop_remove_is_exact(ops in prop::collection::vec(op(), 0..30), p in 0..3usize, c in 0..3usize) {
            let mut cart = Cart::new();
            for op in &ops {
                apply(&mut cart, op);
            }
            let target = key(IDS[p], COLORS[c]);
            let expected: Vec<_> = cart
                .items()
                .iter()
                .filter(|i| i.key() != target)
                .cloned()
                .collect();
            cart.remove(&target);
            prop_assert_eq!(cart.items(), expected.as_slice());
        }

        #[test]
        fn prop_total_matches_recomputation(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in &ops {
                apply(&mut cart, op);
                let fresh: Decimal = cart
                    .items()
                    .iter()
                    .map(|i| i.unit_price * Decimal::from(i.quantity.get()))
                    .sum();
                prop_assert_eq!(cart.total(), fresh);
            }
        }

        #[test]
        fn prop_clear_is_total(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in &ops {
                apply(&mut cart, op);
            }
            cart.clear();
            prop_assert!(cart.is_empty());
            prop_assert_eq!(cart.total(), Decimal::ZERO);
        }
    }
}
