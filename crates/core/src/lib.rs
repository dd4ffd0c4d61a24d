//! Atelier Core - Shared types and storefront logic.
//!
//! This crate provides the pieces of the Atelier storefront that carry real
//! invariants, independent of any web framework:
//! - [`cart`] - The shopping cart store (line items keyed by product and color)
//! - [`progress`] - Per product-color order progress milestones
//! - [`image`] - Resolution of stored image paths to displayable URLs
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, emails, and the
//!   product/order records returned by the catalog API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no notifications. Cart operations return a [`cart::CartEvent`]
//! describing what changed and leave presentation to the caller.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod image;
pub mod progress;
pub mod types;

pub use cart::{Cart, CartEvent, CartItem, LineKey};
pub use types::*;
