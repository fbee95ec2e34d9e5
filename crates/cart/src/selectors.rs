//! Derived cart aggregates.
//!
//! Totals are never stored. Each selector walks the current lines, so the
//! result always matches the mapping it was computed from.

use pantry_core::{CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;

use crate::model::Cart;

/// Sum of all line quantities.
#[must_use]
pub fn total_items(cart: &Cart) -> u64 {
    cart.items().map(|line| u64::from(line.quantity)).sum()
}

/// Sum of `price * quantity` over all lines, saturating at the `Decimal`
/// bounds.
#[must_use]
pub fn total_price(cart: &Cart) -> Decimal {
    cart.items()
        .fold(Decimal::ZERO, |total, line| total.saturating_add(line.line_total()))
}

/// Display-ready line for the cart drawer and checkout summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_price: Price,
}

/// Display-ready view of the whole cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<LineSummary>,
    pub item_count: u64,
    pub subtotal: Price,
}

impl CartSummary {
    /// Summary of an empty cart.
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            item_count: 0,
            subtotal: Price::zero(currency),
        }
    }
}

/// Build the display summary for a cart in the given currency.
#[must_use]
pub fn summary(cart: &Cart, currency: CurrencyCode) -> CartSummary {
    if cart.is_empty() {
        return CartSummary::empty(currency);
    }

    let lines = cart
        .items()
        .map(|line| LineSummary {
            id: line.id,
            name: line.name.clone(),
            image: line.image.clone(),
            quantity: line.quantity,
            unit_price: Price::new(line.price, currency),
            line_price: Price::new(line.line_total(), currency),
        })
        .collect();

    CartSummary {
        lines,
        item_count: total_items(cart),
        subtotal: Price::new(total_price(cart), currency),
    }
}
