//! # CLI Configuration
//!
//! Billing defaults and the session role used by `crm`.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority, applied by main.rs)          │
//! │     --currency EUR --locale de-DE --role manager                       │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     CRM_CURRENCY, CRM_LOCALE, CRM_DEFAULT_TAX_RATE,                    │
//! │     CRM_ALLOW_CREDITS, CRM_ROLE                                        │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/ledgerline-crm/crm.toml (Linux)                          │
//! │     ~/Library/Application Support/com.ledgerline.crm/crm.toml (macOS)  │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     USD, en-US, 0% default tax, charges only, no role                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [billing]
//! currency = "EUR"
//! locale = "de-DE"
//! default_tax_rate = 19.0
//! allow_credits = true
//!
//! [session]
//! role = "manager"
//! ```

use std::path::PathBuf;

use crm_core::currency::{currency_info, locale_format};
use crm_core::validation::LinePolicy;
use crm_core::{Role, TaxRate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

// =============================================================================
// Billing Settings
// =============================================================================

/// How invoice amounts are rendered and which drafts are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// BCP 47 locale tag for number formatting.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Tax rate percentage for drafts that omit `taxRate`.
    #[serde(default)]
    pub default_tax_rate: f64,

    /// Accept negative quantities and prices (credit notes).
    #[serde(default)]
    pub allow_credits: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            currency: default_currency(),
            locale: default_locale(),
            default_tax_rate: 0.0,
            allow_credits: false,
        }
    }
}

impl BillingConfig {
    /// Default tax rate as a [`TaxRate`].
    pub fn default_rate(&self) -> TaxRate {
        TaxRate::from_percentage(self.default_tax_rate)
    }

    /// Line policy implied by `allow_credits`.
    pub fn line_policy(&self) -> LinePolicy {
        if self.allow_credits {
            LinePolicy::AllowCredits
        } else {
            LinePolicy::ChargesOnly
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// Who permission commands are evaluated for when `--role` is omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete `crm` configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl CrmConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (crm.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> CliResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(CliError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml()?)?;

        info!(?path, "Config saved");
        Ok(path)
    }

    /// Renders the configuration as pretty TOML.
    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CliResult<()> {
        if currency_info(&self.billing.currency).is_none() {
            return Err(CliError::InvalidConfig(format!(
                "Unsupported currency: '{}'",
                self.billing.currency
            )));
        }

        if locale_format(&self.billing.locale).is_none() {
            return Err(CliError::InvalidConfig(format!(
                "Unsupported locale: '{}'",
                self.billing.locale
            )));
        }

        let rate = self.billing.default_tax_rate;
        if !(0.0..=100.0).contains(&rate) {
            return Err(CliError::InvalidConfig(format!(
                "default_tax_rate must be between 0 and 100, got {}",
                rate
            )));
        }

        Ok(())
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production). Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currency) = lookup("CRM_CURRENCY") {
            debug!(currency = %currency, "Overriding currency from environment");
            self.billing.currency = currency.trim().to_ascii_uppercase();
        }

        if let Some(locale) = lookup("CRM_LOCALE") {
            self.billing.locale = locale;
        }

        if let Some(rate) = lookup("CRM_DEFAULT_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(parsed) => self.billing.default_tax_rate = parsed,
                Err(_) => warn!(rate = %rate, "Invalid CRM_DEFAULT_TAX_RATE in environment"),
            }
        }

        if let Some(flag) = lookup("CRM_ALLOW_CREDITS") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.billing.allow_credits = true,
                "0" | "false" | "no" => self.billing.allow_credits = false,
                _ => warn!(flag = %flag, "Invalid CRM_ALLOW_CREDITS in environment"),
            }
        }

        if let Some(role) = lookup("CRM_ROLE") {
            match role.parse::<Role>() {
                Ok(parsed) => {
                    debug!(role = %parsed, "Overriding session role from environment");
                    self.session.role = Some(parsed);
                }
                Err(e) => warn!(error = %e, "Invalid CRM_ROLE in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ledgerline", "crm")
            .map(|dirs| dirs.config_dir().join("crm.toml"))
    }
}
