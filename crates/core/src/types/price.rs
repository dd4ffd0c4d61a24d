//! Type-safe price representation using decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price in the store's currency (US dollars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    /// Amount in dollars, not cents.
    pub amount: Decimal,
}

impl Price {
    /// Currency symbol shown before amounts.
    pub const SYMBOL: &'static str = "$";

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }

    /// Format for display with the currency symbol (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", Self::SYMBOL, format_amount(self.amount))
    }
}

/// Format an amount rounded to two decimal places (e.g., "20.00").
///
/// Midpoints round away from zero.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}
