//! # Error Types
//!
//! Domain-specific error types for crm-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  crm-core errors (this file)                                           │
//! │  ├── CoreError           - General domain errors                       │
//! │  ├── ValidationError     - Line item validation failures               │
//! │  └── CurrencyParseError  - Unparseable money input                     │
//! │                                                                         │
//! │  crm-cli errors (separate crate)                                       │
//! │  └── CliError            - Config, I/O and JSON failures               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError → stderr                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT An Error
//! A denied permission check is the boolean `false`, never an `Err`.
//! The arithmetic functions never fail either: only the string boundary
//! (parsing roles, resources, money input) produces errors.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are raised at the string boundary, when text coming from a form,
/// a config file or a command line has to become a typed value.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Role name is not one of owner, manager, staff.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Resource name is not part of the closed resource set.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Action name is not one of create, read, update, delete, manage.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Currency code has no formatting rules.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Locale tag has no formatting rules.
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// Money input could not be parsed.
    #[error("Invalid amount: {0}")]
    CurrencyParse(#[from] CurrencyParseError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The arithmetic engine accepts any signed input. These errors are produced
/// by [`crate::validation`] for callers that want to refuse credit lines or
/// out-of-range tax rates before computing totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Validation failed on a specific invoice line.
    #[error("line {index}: {source}")]
    Line {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

// =============================================================================
// Currency Parse Error
// =============================================================================

/// Why a piece of text could not be read as a money amount.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CurrencyParseError {
    /// Nothing but whitespace was entered.
    #[error("input is empty")]
    Empty,

    /// Input has no digits once symbols and separators are stripped.
    #[error("input contains no digits")]
    NoDigits,

    /// Amount does not fit in 64-bit minor units.
    #[error("amount is too large")]
    Overflow,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
