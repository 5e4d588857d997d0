//! # Currency Formatting & Parsing
//!
//! The boundary between integer minor units and the text a user reads or
//! types.
//!
//! ## Formatting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  format_currency(123456, "USD", "en-US")  →  "$1,234.56"                │
//! │  format_currency(123456, "EUR", "de-DE")  →  "1.234,56 €"               │
//! │  format_currency(-995,   "GBP", "en-GB")  →  "-£9.95"                   │
//! │                                                                         │
//! │  • always exactly two fraction digits                                   │
//! │  • the locale decides separators and symbol placement                   │
//! │  • a locale's home currency uses its narrow symbol ("$"), foreign      │
//! │    currencies use the unambiguous one ("US$", "CA$")                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parsing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "$1,234.56"  → strip to "1234.56"  → 123456                            │
//! │  "12.345"     → 1234.5 cents        → 1235 (half up)                    │
//! │  "1.2.3"      → "1.2" (second dot ends the number) → 120                │
//! │  "-5.00"      → minus is stripped   → 500                               │
//! │  "abc"        → Err(NoDigits)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The strict parser returns a tagged error; [`parse_currency_input_or_zero`]
//! keeps the form-friendly zero fallback.

use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult, CurrencyParseError};
use crate::money::Money;

// =============================================================================
// Currency & Locale Tables
// =============================================================================

/// Display data for one ISO 4217 currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// ISO 4217 code.
    pub code: &'static str,
    /// Unambiguous symbol used outside the currency's home locale.
    pub symbol: &'static str,
    /// Short symbol used in the currency's home locale.
    pub narrow_symbol: &'static str,
}

const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", symbol: "US$", narrow_symbol: "$" },
    CurrencyInfo { code: "EUR", symbol: "€", narrow_symbol: "€" },
    CurrencyInfo { code: "GBP", symbol: "£", narrow_symbol: "£" },
    CurrencyInfo { code: "CAD", symbol: "CA$", narrow_symbol: "$" },
    CurrencyInfo { code: "AUD", symbol: "A$", narrow_symbol: "$" },
    CurrencyInfo { code: "MXN", symbol: "MX$", narrow_symbol: "$" },
    CurrencyInfo { code: "JPY", symbol: "¥", narrow_symbol: "¥" },
    CurrencyInfo { code: "INR", symbol: "₹", narrow_symbol: "₹" },
    CurrencyInfo { code: "CHF", symbol: "CHF", narrow_symbol: "CHF" },
];

/// Where the currency symbol goes relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    /// `$1,234.56`
    Prefix,
    /// `1.234,56 €` (separated by a no-break space)
    Suffix,
}

/// Number formatting rules for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleFormat {
    /// BCP 47 tag, e.g. `en-US`.
    pub tag: &'static str,
    /// Thousands separator.
    pub group_separator: &'static str,
    /// Separator between major and minor units.
    pub decimal_separator: &'static str,
    pub symbol_position: SymbolPosition,
    /// Currency that gets its narrow symbol in this locale.
    pub home_currency: &'static str,
}

const NBSP: &str = "\u{a0}";

const LOCALES: &[LocaleFormat] = &[
    LocaleFormat {
        tag: "en-US",
        group_separator: ",",
        decimal_separator: ".",
        symbol_position: SymbolPosition::Prefix,
        home_currency: "USD",
    },
    LocaleFormat {
        tag: "en-GB",
        group_separator: ",",
        decimal_separator: ".",
        symbol_position: SymbolPosition::Prefix,
        home_currency: "GBP",
    },
    LocaleFormat {
        tag: "en-CA",
        group_separator: ",",
        decimal_separator: ".",
        symbol_position: SymbolPosition::Prefix,
        home_currency: "CAD",
    },
    LocaleFormat {
        tag: "en-AU",
        group_separator: ",",
        decimal_separator: ".",
        symbol_position: SymbolPosition::Prefix,
        home_currency: "AUD",
    },
    LocaleFormat {
        tag: "de-DE",
        group_separator: ".",
        decimal_separator: ",",
        symbol_position: SymbolPosition::Suffix,
        home_currency: "EUR",
    },
    LocaleFormat {
        tag: "fr-FR",
        group_separator: "\u{202f}",
        decimal_separator: ",",
        symbol_position: SymbolPosition::Suffix,
        home_currency: "EUR",
    },
];

/// Locale used when a tag is not recognised.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Looks up a currency by ISO code (case-insensitive).
pub fn currency_info(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Looks up a locale by tag.
///
/// Accepts `en-US`, `en_us`, and bare languages (`de` → `de-DE`, the first
/// table entry for that language).
pub fn locale_format(tag: &str) -> Option<&'static LocaleFormat> {
    let normalized = tag.trim().replace('_', "-");
    LOCALES
        .iter()
        .find(|l| l.tag.eq_ignore_ascii_case(&normalized))
        .or_else(|| {
            if normalized.contains('-') {
                return None;
            }
            LOCALES.iter().find(|l| {
                l.tag
                    .split('-')
                    .next()
                    .is_some_and(|lang| lang.eq_ignore_ascii_case(&normalized))
            })
        })
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats minor units as a localized currency string with two decimals.
///
/// Lenient: an unknown locale falls back to [`DEFAULT_LOCALE`], and a
/// currency without a table entry is shown by its upper-cased code
/// (`XYZ 1,234.56`). Use [`try_format_currency`] to reject both.
///
/// ```rust
/// use crm_core::currency::format_currency;
/// use crm_core::Money;
///
/// assert_eq!(format_currency(Money::from_cents(123456), "USD", "en-US"), "$1,234.56");
/// ```
pub fn format_currency(amount: Money, currency_code: &str, locale: &str) -> String {
    let locale_fmt = locale_format(locale).unwrap_or_else(|| {
        warn!(locale, fallback = DEFAULT_LOCALE, "Unknown locale, using fallback");
        &LOCALES[0]
    });
    match currency_info(currency_code) {
        Some(info) => render(amount, display_symbol(info, locale_fmt), false, locale_fmt),
        None => {
            let code = currency_code.trim().to_ascii_uppercase();
            render(amount, &code, !code.is_empty(), locale_fmt)
        }
    }
}

/// Strict variant of [`format_currency`].
///
/// ## Errors
/// - [`CoreError::UnknownLocale`] if the locale has no formatting rules
/// - [`CoreError::UnknownCurrency`] if the code is not in the currency table
pub fn try_format_currency(amount: Money, currency_code: &str, locale: &str) -> CoreResult<String> {
    let locale_fmt =
        locale_format(locale).ok_or_else(|| CoreError::UnknownLocale(locale.to_string()))?;
    let info = currency_info(currency_code)
        .ok_or_else(|| CoreError::UnknownCurrency(currency_code.to_string()))?;
    Ok(render(amount, display_symbol(info, locale_fmt), false, locale_fmt))
}

fn display_symbol(info: &'static CurrencyInfo, locale: &LocaleFormat) -> &'static str {
    if info.code == locale.home_currency {
        info.narrow_symbol
    } else {
        info.symbol
    }
}

/// Joins sign, symbol and number. Bare ISO codes always get a no-break
/// space next to the number.
fn render(amount: Money, symbol: &str, spaced_code: bool, locale: &LocaleFormat) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let number = format!(
        "{}{}{:02}",
        group_digits(amount.dollars().unsigned_abs(), locale.group_separator),
        locale.decimal_separator,
        amount.cents_part()
    );

    match locale.symbol_position {
        SymbolPosition::Prefix if spaced_code => format!("{sign}{symbol}{NBSP}{number}"),
        SymbolPosition::Prefix => format!("{sign}{symbol}{number}"),
        SymbolPosition::Suffix => format!("{sign}{number}{NBSP}{symbol}"),
    }
}

/// Inserts `separator` between groups of three digits.
fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses user-typed money text into minor units.
///
/// Every character other than an ASCII digit or `.` is discarded, so
/// symbols, group separators and a leading minus all disappear. The first
/// `.` separates major from minor units and any later `.` ends the number.
/// The result is rounded half up to whole cents using exact decimal math.
///
/// ## Errors
/// - [`CurrencyParseError::Empty`] for blank input
/// - [`CurrencyParseError::NoDigits`] when no digit survives stripping
/// - [`CurrencyParseError::Overflow`] when the amount exceeds i64 cents
///
/// ```rust
/// use crm_core::currency::parse_currency_input;
///
/// assert_eq!(parse_currency_input("$1,234.56").unwrap().cents(), 123456);
/// assert!(parse_currency_input("abc").is_err());
/// ```
pub fn parse_currency_input(text: &str) -> Result<Money, CurrencyParseError> {
    if text.trim().is_empty() {
        return Err(CurrencyParseError::Empty);
    }

    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = kept.split('.');
    let major = parts.next().unwrap_or_default();
    let minor = parts.next().unwrap_or_default();
    if major.is_empty() && minor.is_empty() {
        return Err(CurrencyParseError::NoDigits);
    }

    let mut cents: i64 = 0;
    for digit in major.bytes().map(|b| i64::from(b - b'0')) {
        cents = cents
            .checked_mul(10)
            .and_then(|c| c.checked_add(digit))
            .ok_or(CurrencyParseError::Overflow)?;
    }

    let mut minor_digits = minor.bytes().map(|b| i64::from(b - b'0'));
    let tenths = minor_digits.next().unwrap_or(0);
    let hundredths = minor_digits.next().unwrap_or(0);
    let round_up = minor_digits.next().is_some_and(|d| d >= 5);

    cents = cents
        .checked_mul(100)
        .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .ok_or(CurrencyParseError::Overflow)?;

    Ok(Money::from_cents(cents))
}

/// [`parse_currency_input`] with the invoice form's fallback: anything
/// unparseable reads as zero.
pub fn parse_currency_input_or_zero(text: &str) -> Money {
    parse_currency_input(text).unwrap_or_else(|err| {
        debug!(input = text, error = %err, "Unparseable amount, using zero");
        Money::zero()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(cents: i64, code: &str, locale: &str) -> String {
        format_currency(Money::from_cents(cents), code, locale)
    }

    #[test]
    fn test_format_en_us() {
        assert_eq!(fmt(123456, "USD", "en-US"), "$1,234.56");
        assert_eq!(fmt(0, "USD", "en-US"), "$0.00");
        assert_eq!(fmt(5, "USD", "en-US"), "$0.05");
        assert_eq!(fmt(100_000_000, "USD", "en-US"), "$1,000,000.00");
        assert_eq!(fmt(-123456, "USD", "en-US"), "-$1,234.56");
    }

    #[test]
    fn test_format_foreign_currency_symbol() {
        assert_eq!(fmt(123456, "EUR", "en-US"), "€1,234.56");
        assert_eq!(fmt(123456, "CAD", "en-US"), "CA$1,234.56");
        assert_eq!(fmt(123456, "USD", "en-GB"), "US$1,234.56");
        assert_eq!(fmt(123456, "CAD", "en-CA"), "$1,234.56");
    }

    #[test]
    fn test_format_suffix_locales() {
        assert_eq!(fmt(123456, "EUR", "de-DE"), "1.234,56\u{a0}€");
        assert_eq!(fmt(123456, "EUR", "fr-FR"), "1\u{202f}234,56\u{a0}€");
        assert_eq!(fmt(-995, "EUR", "de-DE"), "-9,95\u{a0}€");
    }

    #[test]
    fn test_format_unknown_currency_uses_code() {
        assert_eq!(fmt(123456, "xyz", "en-US"), "XYZ\u{a0}1,234.56");
    }

    #[test]
    fn test_format_unknown_locale_falls_back() {
        assert_eq!(fmt(123456, "USD", "tlh-KX"), "$1,234.56");
        assert_eq!(fmt(123456, "EUR", "de"), "1.234,56\u{a0}€");
        assert_eq!(fmt(123456, "USD", "en_us"), "$1,234.56");
    }

    #[test]
    fn test_try_format_rejects_unknowns() {
        assert!(matches!(
            try_format_currency(Money::from_cents(1), "XYZ", "en-US"),
            Err(CoreError::UnknownCurrency(_))
        ));
        assert!(matches!(
            try_format_currency(Money::from_cents(1), "USD", "tlh-KX"),
            Err(CoreError::UnknownLocale(_))
        ));
        assert_eq!(
            try_format_currency(Money::from_cents(995), "GBP", "en-GB").unwrap(),
            "£9.95"
        );
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0, ","), "0");
        assert_eq!(group_digits(999, ","), "999");
        assert_eq!(group_digits(1000, ","), "1,000");
        assert_eq!(group_digits(1234567, "."), "1.234.567");
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(parse_currency_input("$1,234.56"), Ok(Money::from_cents(123456)));
        assert_eq!(parse_currency_input("12"), Ok(Money::from_cents(1200)));
        assert_eq!(parse_currency_input("12.5"), Ok(Money::from_cents(1250)));
        assert_eq!(parse_currency_input(".5"), Ok(Money::from_cents(50)));
        assert_eq!(parse_currency_input("7."), Ok(Money::from_cents(700)));
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!(parse_currency_input("12.345"), Ok(Money::from_cents(1235)));
        assert_eq!(parse_currency_input("12.344"), Ok(Money::from_cents(1234)));
        assert_eq!(parse_currency_input("1.005"), Ok(Money::from_cents(101)));
        assert_eq!(parse_currency_input("0.999"), Ok(Money::from_cents(100)));
    }

    #[test]
    fn test_parse_legacy_quirks() {
        // Second decimal point ends the number
        assert_eq!(parse_currency_input("1.2.3"), Ok(Money::from_cents(120)));
        // Minus sign is discarded
        assert_eq!(parse_currency_input("-5.00"), Ok(Money::from_cents(500)));
        // European decimal comma is treated as a group separator
        assert_eq!(parse_currency_input("12,50"), Ok(Money::from_cents(125000)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_currency_input(""), Err(CurrencyParseError::Empty));
        assert_eq!(parse_currency_input("   "), Err(CurrencyParseError::Empty));
        assert_eq!(parse_currency_input("abc"), Err(CurrencyParseError::NoDigits));
        assert_eq!(parse_currency_input("$."), Err(CurrencyParseError::NoDigits));
        assert_eq!(
            parse_currency_input("99999999999999999999"),
            Err(CurrencyParseError::Overflow)
        );
    }

    #[test]
    fn test_parse_or_zero() {
        assert!(parse_currency_input_or_zero("n/a").is_zero());
        assert!(parse_currency_input_or_zero("").is_zero());
        assert_eq!(parse_currency_input_or_zero("$3.10").cents(), 310);
    }

    #[test]
    fn test_round_trip_en_us() {
        for cents in [0, 1, 99, 100, 123456, 10_000_000_000] {
            let text = fmt(cents, "USD", "en-US");
            assert_eq!(parse_currency_input(&text), Ok(Money::from_cents(cents)));
        }
    }
}
