//! # CLI Error Type
//!
//! Everything that can stop a `crm` invocation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  crm-core (CoreError, ValidationError)  ─┐                              │
//! │  std::io (reading drafts / config)      ─┼──► CliError ──► stderr,      │
//! │  serde_json / toml (decoding)           ─┘                  exit 1      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A denied permission check is not an error: `crm can` prints `denied`
//! and exits with status 2 so scripts can branch on it.

use std::path::PathBuf;

use crm_core::{CoreError, CurrencyParseError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Domain error from crm-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Could not read an input or config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be written.
    #[error("Failed to write config: {0}")]
    Write(#[from] std::io::Error),

    /// Line item JSON did not match the expected shape.
    #[error("Invalid line items: {0}")]
    Json(#[from] serde_json::Error),

    /// crm.toml is not valid TOML for `CrmConfig`.
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config values are individually valid TOML but make no sense.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No platform config directory and no explicit path.
    #[error("No config path available")]
    NoConfigPath,

    /// A permission command was run with no role given and none configured.
    #[error("No role given: pass --role or set [session] role / CRM_ROLE")]
    NoRole,
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Core(err.into())
    }
}

impl From<CurrencyParseError> for CliError {
    fn from(err: CurrencyParseError) -> Self {
        CliError::Core(err.into())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through() {
        let err: CliError = CoreError::UnknownRole("admin".to_string()).into();
        assert_eq!(err.to_string(), "Unknown role: admin");

        let err: CliError = CurrencyParseError::Empty.into();
        assert_eq!(err.to_string(), "Invalid amount: input is empty");
    }

    #[test]
    fn test_validation_error_wraps_into_core() {
        let err: CliError = ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, CliError::Core(CoreError::Validation(_))));
    }
}
