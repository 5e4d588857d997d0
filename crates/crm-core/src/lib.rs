//! # crm-core: Pure Business Logic for Ledgerline CRM
//!
//! This crate holds the two pieces of the CRM with real rules: who may do
//! what, and how invoice numbers are computed. Everything here is a pure
//! function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledgerline CRM Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI (React)                           │   │
//! │  │   Contacts ─► Deals ─► Invoice Editor ─► Reports ─► Settings    │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │ role from session            │ line item drafts      │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ crm-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   rbac    │  │   money   │  │  invoice  │  │ currency  │  │   │
//! │  │   │ can()     │  │  Money    │  │  totals   │  │  format   │  │   │
//! │  │   │ roles     │  │  TaxRate  │  │  per-line │  │  parse    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO BACKEND CALLS • NO GLOBAL SESSION • PURE          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`rbac`] - Roles, resources, actions and the canonical permission table
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Tax rates, line items, invoice totals
//! - [`invoice`] - Per-line tax and invoice totals
//! - [`currency`] - Locale-aware formatting and money input parsing
//! - [`validation`] - Optional line item checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; safe to call on every render
//! 2. **Explicit Inputs**: the role and the line items are always arguments,
//!    never read from a session store
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Fail Closed**: anything not explicitly granted is denied
//!
//! ## Example Usage
//!
//! ```rust
//! use crm_core::rbac::{can, Action, Resource, Role};
//! use crm_core::{calculate_invoice_totals, format_currency, LineItem, Money, TaxRate};
//!
//! let role = Some(Role::Staff);
//! assert!(can(role, Action::Create, Resource::Invoices));
//!
//! let lines = [LineItem::new(3, Money::from_cents(1000), TaxRate::from_percentage(8.25))];
//! let totals = calculate_invoice_totals(&lines);
//! assert_eq!(format_currency(totals.total, "USD", "en-US"), "$32.48");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod error;
pub mod invoice;
pub mod money;
pub mod rbac;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{format_currency, parse_currency_input, parse_currency_input_or_zero};
pub use error::{CoreError, CoreResult, CurrencyParseError, ValidationError};
pub use invoice::{calculate_invoice_totals, calculate_line_total, calculate_tax};
pub use money::Money;
pub use rbac::{can, is_role_at_least, role_permissions, Action, Resource, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines accepted by [`validation::validate_line_items`].
pub const MAX_INVOICE_LINES: usize = 500;

/// Maximum quantity magnitude on a single line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Maximum unit price magnitude in minor units ($10,000,000.00).
///
/// A full invoice at every limit and 100% tax totals 10^18 minor units,
/// inside `i64`.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;
