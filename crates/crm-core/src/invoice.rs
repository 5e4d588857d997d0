//! # Invoice Arithmetic
//!
//! Turns an ordered list of line items into the numbers printed on an
//! invoice.
//!
//! ## Per-Line Rounding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line 1: 1 × $0.50 @ 10%  → subtotal 50   tax round(5.0)  = 5          │
//! │  Line 2: 1 × $0.50 @ 20%  → subtotal 50   tax round(10.0) = 10         │
//! │                                                                         │
//! │  subtotal  = 50 + 50 = 100                                              │
//! │  tax_total =  5 + 10 = 15     ← sum of ROUNDED line taxes               │
//! │  total     = 100 + 15 = 115                                             │
//! │                                                                         │
//! │  There is no single rate that applies to the 100 subtotal, and even    │
//! │  with one shared rate, rounding the sum differs from summing the       │
//! │  rounded lines. Every line is rounded first, then summed.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Signed Input
//! Negative quantities and prices are computed as-is (credit lines and
//! discounts). Use [`crate::validation::validate_line_items`] first when a
//! form must refuse them.

use tracing::trace;

use crate::money::Money;
use crate::types::{InvoiceTotals, LineBreakdown, LineItem, TaxRate};

/// Tax on an amount: `round(amount × rate / 100)`, half away from zero.
///
/// ```rust
/// use crm_core::invoice::calculate_tax;
/// use crm_core::{Money, TaxRate};
///
/// let tax = calculate_tax(Money::from_cents(3000), TaxRate::from_percentage(8.25));
/// assert_eq!(tax.cents(), 248);
/// ```
#[inline]
pub fn calculate_tax(amount: Money, rate: TaxRate) -> Money {
    amount.calculate_tax(rate)
}

/// Line total: `quantity × unit_price` plus the tax on that subtotal.
///
/// ```rust
/// use crm_core::invoice::calculate_line_total;
/// use crm_core::{Money, TaxRate};
///
/// let total = calculate_line_total(3, Money::from_cents(1000), TaxRate::from_percentage(8.25));
/// assert_eq!(total.cents(), 3248);
/// ```
pub fn calculate_line_total(quantity: i64, unit_price: Money, rate: TaxRate) -> Money {
    LineItem::new(quantity, unit_price, rate).total()
}

/// Computes invoice totals with per-line rounding.
///
/// An empty slice yields all-zero totals.
///
/// ```rust
/// use crm_core::invoice::calculate_invoice_totals;
/// use crm_core::{LineItem, Money, TaxRate};
///
/// let lines = [
///     LineItem::new(1, Money::from_cents(50), TaxRate::from_percentage(10.0)),
///     LineItem::new(1, Money::from_cents(50), TaxRate::from_percentage(20.0)),
/// ];
/// let totals = calculate_invoice_totals(&lines);
/// assert_eq!(totals.subtotal.cents(), 100);
/// assert_eq!(totals.tax_total.cents(), 15);
/// assert_eq!(totals.total.cents(), 115);
/// ```
pub fn calculate_invoice_totals(line_items: &[LineItem]) -> InvoiceTotals {
    let mut subtotal = Money::zero();
    let mut tax_total = Money::zero();

    for (index, line) in line_items.iter().enumerate() {
        let breakdown = line.breakdown();
        trace!(
            index,
            subtotal = breakdown.subtotal.cents(),
            tax = breakdown.tax.cents(),
            "invoice line computed"
        );
        subtotal += breakdown.subtotal;
        tax_total += breakdown.tax;
    }

    InvoiceTotals {
        subtotal,
        tax_total,
        total: subtotal + tax_total,
    }
}

/// Per-line amounts in input order, for the invoice table.
pub fn invoice_breakdown(line_items: &[LineItem]) -> Vec<LineBreakdown> {
    line_items.iter().map(LineItem::breakdown).collect()
}
