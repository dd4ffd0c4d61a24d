//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod quantity;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderLine, OrderProductRef};
pub use price::{Price, format_amount};
pub use product::{Color, NewProduct, PRODUCT_CATEGORIES, Product, known_category};
pub use quantity::{Quantity, QuantityError};
