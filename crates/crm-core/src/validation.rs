//! # Validation Module
//!
//! Optional input checks for invoice lines.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Invoice form (TypeScript)                                    │
//! │  ├── Required fields, numeric inputs                                   │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Tax rate within 0–100%                                            │
//! │  ├── Quantity, price and line count bounded so totals fit in i64       │
//! │  └── Optional: no negative quantities / prices (credit lines)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Arithmetic engine                                            │
//! │  └── Never fails on validated input                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crm_core::validation::{validate_line_items, LinePolicy};
//! use crm_core::{LineItem, Money, TaxRate};
//!
//! let lines = [LineItem::new(2, Money::from_cents(1500), TaxRate::from_bps(825))];
//! assert!(validate_line_items(&lines, LinePolicy::ChargesOnly).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{LineItem, TaxRate};
use crate::{MAX_INVOICE_LINES, MAX_LINE_QUANTITY, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Whether negative quantities and prices are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePolicy {
    /// Only non-negative quantities and prices.
    #[default]
    ChargesOnly,
    /// Negative quantities or prices describe credits and refunds.
    AllowCredits,
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity.
///
/// ## Rules
/// - Magnitude must not exceed [`MAX_LINE_QUANTITY`]
/// - Must not be negative under [`LinePolicy::ChargesOnly`]
/// - Zero is allowed (placeholder rows while editing)
pub fn validate_quantity(qty: i64, policy: LinePolicy) -> ValidationResult<()> {
    if policy == LinePolicy::ChargesOnly && qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    if qty.unsigned_abs() > MAX_LINE_QUANTITY as u64 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: -MAX_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in minor units.
///
/// ## Rules
/// - Magnitude must not exceed [`MAX_UNIT_PRICE`]
/// - Must not be negative under [`LinePolicy::ChargesOnly`]
///
/// ```rust
/// use crm_core::validation::{validate_unit_price, LinePolicy};
///
/// assert!(validate_unit_price(0, LinePolicy::ChargesOnly).is_ok());
/// assert!(validate_unit_price(-100, LinePolicy::ChargesOnly).is_err());
/// assert!(validate_unit_price(-100, LinePolicy::AllowCredits).is_ok());
/// ```
pub fn validate_unit_price(cents: i64, policy: LinePolicy) -> ValidationResult<()> {
    if policy == LinePolicy::ChargesOnly && cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }

    if cents.unsigned_abs() > MAX_UNIT_PRICE as u64 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: -MAX_UNIT_PRICE,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates a tax rate.
///
/// ## Rules
/// - Must be between 0% and 100% inclusive
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.ppm() > TaxRate::PPM_PER_WHOLE {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates one line against `policy`.
pub fn validate_line_item(line: &LineItem, policy: LinePolicy) -> ValidationResult<()> {
    validate_quantity(line.quantity, policy)?;
    validate_unit_price(line.unit_price.cents(), policy)?;
    validate_tax_rate(line.tax_rate)?;
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a whole invoice, reporting the first failing line by index.
///
/// ## Rules
/// - At most [`MAX_INVOICE_LINES`] lines
/// - Every line passes [`validate_line_item`]
pub fn validate_line_items(lines: &[LineItem], policy: LinePolicy) -> ValidationResult<()> {
    if lines.len() > MAX_INVOICE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 0,
            max: MAX_INVOICE_LINES as i64,
        });
    }

    lines.iter().enumerate().try_for_each(|(index, line)| {
        validate_line_item(line, policy).map_err(|source| ValidationError::Line {
            index,
            source: Box::new(source),
        })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0, LinePolicy::ChargesOnly).is_ok());
        assert!(validate_quantity(5, LinePolicy::ChargesOnly).is_ok());
        assert!(validate_quantity(-1, LinePolicy::ChargesOnly).is_err());
        assert!(validate_quantity(-1, LinePolicy::AllowCredits).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1, LinePolicy::AllowCredits).is_err());
        assert!(validate_quantity(i64::MIN, LinePolicy::AllowCredits).is_err());
    }

    #[test]
    fn test_validate_unit_price_bounds() {
        assert!(validate_unit_price(MAX_UNIT_PRICE, LinePolicy::ChargesOnly).is_ok());
        assert!(validate_unit_price(MAX_UNIT_PRICE + 1, LinePolicy::ChargesOnly).is_err());
        assert!(validate_unit_price(-MAX_UNIT_PRICE, LinePolicy::AllowCredits).is_ok());
        assert!(validate_unit_price(-MAX_UNIT_PRICE - 1, LinePolicy::AllowCredits).is_err());
        assert!(validate_unit_price(i64::MIN, LinePolicy::AllowCredits).is_err());
        assert!(validate_unit_price(10_000_000_000_000, LinePolicy::ChargesOnly).is_err());
    }

    #[test]
    fn test_largest_valid_invoice_does_not_overflow() {
        let full_tax = TaxRate::from_percentage(100.0);
        let line = LineItem::new(MAX_LINE_QUANTITY, Money::from_cents(MAX_UNIT_PRICE), full_tax);
        let lines = vec![line; MAX_INVOICE_LINES];
        assert!(validate_line_items(&lines, LinePolicy::ChargesOnly).is_ok());

        let totals = crate::invoice::calculate_invoice_totals(&lines);
        assert_eq!(totals.subtotal.cents(), 500_000_000_000_000_000);
        assert_eq!(totals.total.cents(), 1_000_000_000_000_000_000);

        let credit = LineItem::new(-MAX_LINE_QUANTITY, Money::from_cents(MAX_UNIT_PRICE), full_tax);
        let credits = vec![credit; MAX_INVOICE_LINES];
        assert!(validate_line_items(&credits, LinePolicy::AllowCredits).is_ok());
        assert_eq!(
            crate::invoice::calculate_invoice_totals(&credits).total.cents(),
            -1_000_000_000_000_000_000
        );
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::zero()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_percentage(8.875)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_percentage(100.0)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_percentage(100.01)).is_err());
    }

    #[test]
    fn test_validate_line_items_reports_index() {
        let lines = [
            LineItem::new(1, Money::from_cents(100), TaxRate::zero()),
            LineItem::new(1, Money::from_cents(-100), TaxRate::zero()),
        ];
        let err = validate_line_items(&lines, LinePolicy::ChargesOnly).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Line {
                index: 1,
                source: Box::new(ValidationError::MustNotBeNegative {
                    field: "unit_price".to_string(),
                }),
            }
        );
        assert!(validate_line_items(&lines, LinePolicy::AllowCredits).is_ok());
    }

    #[test]
    fn test_validate_line_count() {
        let line = LineItem::new(1, Money::from_cents(100), TaxRate::zero());
        let lines = vec![line; MAX_INVOICE_LINES + 1];
        assert!(matches!(
            validate_line_items(&lines, LinePolicy::ChargesOnly),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
