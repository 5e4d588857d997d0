//! # crm: Ledgerline CRM Command Line
//!
//! Thin shell over crm-core for scripting and support work: compute invoice
//! totals from a draft file, check what a role may do, and format or parse
//! money the way the invoice editor does.
//!
//! ## Usage
//! ```text
//! crm totals invoice.json            # human-readable breakdown
//! crm totals - --json < draft.json   # machine-readable, from stdin
//! crm can delete contacts --role staff
//! crm at-least manager --role owner
//! crm permissions --role manager
//! crm format -- -123456 --currency EUR --locale de-DE
//! crm parse '$1,234.56'
//! crm config show
//! ```
//!
//! ## Exit Status
//! - `0` success, or the permission check passed
//! - `1` error (printed to stderr)
//! - `2` the permission check was denied

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crm_core::currency::{parse_currency_input, parse_currency_input_or_zero, try_format_currency};
use crm_core::rbac::{can, is_role_at_least, Action, Resource, Role};
use crm_core::Money;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::CrmConfig;
use crate::error::CliResult;

/// Exit status for a denied permission check.
const EXIT_DENIED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "crm", version, about = "Ledgerline CRM billing and access tools")]
struct Cli {
    /// Path to crm.toml (defaults to the platform config directory).
    #[arg(long, global = true, env = "CRM_CONFIG")]
    config: Option<PathBuf>,

    /// Currency code, overriding config and environment.
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Locale tag, overriding config and environment.
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Role to evaluate, overriding the configured session role.
    #[arg(long, global = true)]
    role: Option<Role>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute invoice totals from a JSON draft file ("-" for stdin).
    Totals {
        file: PathBuf,

        /// Print the breakdown as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether the role may perform an action on a resource.
    Can { action: Action, resource: Resource },

    /// Check whether the role ranks at or above another role.
    AtLeast { required: Role },

    /// List the role's grants (JSON with --json).
    Permissions {
        #[arg(long)]
        json: bool,
    },

    /// Format an amount given in minor units.
    Format {
        #[arg(allow_negative_numbers = true)]
        minor_units: i64,
    },

    /// Parse typed money input into minor units.
    Parse {
        text: String,

        /// Treat unparseable input as zero instead of failing.
        #[arg(long)]
        lenient: bool,
    },

    /// Inspect or create crm.toml.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Write the effective configuration to the config path.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,crm_cli=info,crm_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let mut config = CrmConfig::load(cli.config.clone())?;
    apply_flags(&mut config, &cli);
    config.validate()?;
    debug!(?config, "Effective configuration");

    let billing = &config.billing;

    match cli.command {
        Command::Totals { file, json } => {
            println!("{}", commands::totals(&file, json, billing)?);
        }

        Command::Can { action, resource } => {
            let role = commands::resolve_role(cli.role, config.session.role)?;
            let allowed = can(Some(role), action, resource);
            info!(%role, %action, %resource, allowed, "Permission check");
            return Ok(verdict(allowed));
        }

        Command::AtLeast { required } => {
            let role = commands::resolve_role(cli.role, config.session.role)?;
            return Ok(verdict(is_role_at_least(Some(role), required)));
        }

        Command::Permissions { json } => {
            let role = commands::resolve_role(cli.role, config.session.role)?;
            if json {
                let grants = crm_core::role_permissions(role);
                println!("{}", serde_json::to_string_pretty(&grants)?);
            } else {
                println!("{}", commands::render_permissions(role));
            }
        }

        Command::Format { minor_units } => {
            let amount = Money::from_cents(minor_units);
            println!(
                "{}",
                try_format_currency(amount, &billing.currency, &billing.locale)?
            );
        }

        Command::Parse { text, lenient } => {
            let amount = if lenient {
                parse_currency_input_or_zero(&text)
            } else {
                parse_currency_input(&text)?
            };
            println!("{}", amount.cents());
        }

        Command::Config(ConfigCommand::Show) => {
            print!("{}", config.to_toml()?);
        }

        Command::Config(ConfigCommand::Init { force }) => {
            let target = cli.config.clone().or_else(CrmConfig::default_config_path);
            if let Some(path) = target.as_ref().filter(|p| p.exists() && !force) {
                eprintln!("{} already exists (use --force to overwrite)", path.display());
                return Ok(ExitCode::FAILURE);
            }
            let path = config.save(target)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Command-line flags win over file and environment.
fn apply_flags(config: &mut CrmConfig, cli: &Cli) {
    if let Some(currency) = &cli.currency {
        config.billing.currency = currency.trim().to_ascii_uppercase();
    }
    if let Some(locale) = &cli.locale {
        config.billing.locale = locale.clone();
    }
    if cli.role.is_some() {
        config.session.role = cli.role;
    }
}

fn verdict(allowed: bool) -> ExitCode {
    if allowed {
        println!("allowed");
        ExitCode::SUCCESS
    } else {
        println!("denied");
        ExitCode::from(EXIT_DENIED)
    }
}
