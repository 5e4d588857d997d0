//! # Domain Types
//!
//! Invoice value types shared by the arithmetic engine and the UI.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │  LineBreakdown  │   │  InvoiceTotals  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  quantity       │──►│  subtotal       │──►│  subtotal       │       │
//! │  │  unit_price     │   │  tax (rounded)  │   │  tax_total      │       │
//! │  │  tax_rate       │   │  total          │   │  total          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    TaxRate      │   ppm (u32): 82_500 = 8.25%                       │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are stored by this crate. Invoices live in the backend and
//! are handed to the engine as plain values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in parts per million of the taxed amount.
///
/// ## Why Parts Per Million?
/// Invoice tax rates are percentages with up to four decimals in practice
/// (8.875% in New York City). Basis points cannot hold 8.875% exactly;
/// ppm can: 88_750 ppm. 1_000_000 ppm = 100%.
///
/// ## Serialization
/// On the wire the rate is the percentage number the invoice form shows
/// (`8.25`), not the internal ppm count. Deserializing goes through
/// [`TaxRate::try_from_percentage`], so `-5` or `250` is an error rather
/// than a silently clamped rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TaxRate(u32);

impl TaxRate {
    /// ppm in a whole (100%).
    pub const PPM_PER_WHOLE: u32 = 1_000_000;

    /// Creates a tax rate from parts per million.
    #[inline]
    pub const fn from_ppm(ppm: u32) -> Self {
        TaxRate(ppm)
    }

    /// Creates a tax rate from basis points (825 = 8.25%).
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps.saturating_mul(100))
    }

    /// Creates a tax rate from a trusted percentage such as `8.25`.
    ///
    /// The percentage is rounded to the nearest ppm. Negative and NaN inputs
    /// saturate to zero, so anything user-typed should go through
    /// [`TaxRate::try_from_percentage`] instead.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 10_000.0).round() as u32)
    }

    /// Creates a tax rate from an untrusted percentage.
    ///
    /// ## Errors
    /// [`ValidationError::OutOfRange`] unless `pct` is a finite number
    /// between 0 and 100 inclusive.
    ///
    /// ```rust
    /// use crm_core::TaxRate;
    ///
    /// assert_eq!(TaxRate::try_from_percentage(8.875).unwrap().ppm(), 88_750);
    /// assert!(TaxRate::try_from_percentage(-5.0).is_err());
    /// assert!(TaxRate::try_from_percentage(f64::NAN).is_err());
    /// ```
    pub fn try_from_percentage(pct: f64) -> Result<Self, ValidationError> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate::from_percentage(pct))
    }

    /// Returns the rate in parts per million.
    #[inline]
    pub const fn ppm(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<f64> for TaxRate {
    type Error = ValidationError;

    fn try_from(pct: f64) -> Result<Self, Self::Error> {
        TaxRate::try_from_percentage(pct)
    }
}

impl From<TaxRate> for f64 {
    fn from(rate: TaxRate) -> Self {
        rate.percentage()
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One invoice row as edited in the invoice form.
///
/// Only the inputs are stored; subtotal, tax and total are always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Number of units. Negative quantities describe credit lines.
    pub quantity: i64,

    /// Price of one unit in minor currency units.
    pub unit_price: Money,

    /// Tax rate applied to this line's subtotal.
    #[serde(default)]
    #[ts(type = "number")]
    pub tax_rate: TaxRate,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(quantity: i64, unit_price: Money, tax_rate: TaxRate) -> Self {
        LineItem {
            quantity,
            unit_price,
            tax_rate,
        }
    }

    /// Line subtotal (quantity × unit price), before tax.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Tax for this line, rounded on its own.
    #[inline]
    pub fn tax(&self) -> Money {
        self.subtotal().calculate_tax(self.tax_rate)
    }

    /// Line total including tax.
    #[inline]
    pub fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    /// All three derived amounts at once.
    pub fn breakdown(&self) -> LineBreakdown {
        let subtotal = self.subtotal();
        let tax = subtotal.calculate_tax(self.tax_rate);
        LineBreakdown {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

// =============================================================================
// Line Breakdown
// =============================================================================

/// Derived amounts for a single line, as rendered in the invoice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// Aggregate over an invoice's lines.
///
/// ## Invariant
/// `total == subtotal + tax_total`, and `tax_total` is the sum of per-line
/// rounded taxes, never a tax computed on `subtotal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
