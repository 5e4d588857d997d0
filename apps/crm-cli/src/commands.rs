//! # Commands
//!
//! Glue between parsed arguments and crm-core. Each function returns the
//! text to print so it can be tested without capturing stdout.
//!
//! ## Draft Input Format
//! `crm totals` reads either a bare array or an invoice object:
//! ```json
//! [{ "quantity": 3, "unitPrice": 1000, "taxRate": 8.25 }]
//! { "lineItems": [{ "quantity": 1, "unitPrice": 4999 }] }
//! ```
//! `unitPrice` is in minor units. A missing `taxRate` takes the configured
//! `default_tax_rate`.

use std::fmt::Write as _;
use std::path::Path;

use crm_core::currency::format_currency;
use crm_core::invoice::{calculate_invoice_totals, invoice_breakdown};
use crm_core::rbac::{allowed_actions, role_permissions, Resource, Role};
use crm_core::validation::validate_line_items;
use crm_core::{InvoiceTotals, LineBreakdown, LineItem, Money, TaxRate, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BillingConfig;
use crate::error::{CliError, CliResult};

// =============================================================================
// Draft Input
// =============================================================================

/// One line as typed into the invoice editor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

impl LineDraft {
    fn into_line_item(self, default_rate: TaxRate) -> Result<LineItem, ValidationError> {
        let rate = match self.tax_rate {
            Some(pct) => TaxRate::try_from_percentage(pct)?,
            None => default_rate,
        };
        Ok(LineItem::new(self.quantity, self.unit_price, rate))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DraftInput {
    Lines(Vec<LineDraft>),
    Invoice {
        #[serde(rename = "lineItems")]
        line_items: Vec<LineDraft>,
    },
}

/// Decodes draft JSON into line items, filling in the default tax rate.
pub fn parse_drafts(json: &str, default_rate: TaxRate) -> CliResult<Vec<LineItem>> {
    let drafts = match serde_json::from_str::<DraftInput>(json)? {
        DraftInput::Lines(lines) => lines,
        DraftInput::Invoice { line_items } => line_items,
    };
    let lines = drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .into_line_item(default_rate)
                .map_err(|source| ValidationError::Line {
                    index,
                    source: Box::new(source),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

/// Reads drafts from a file, or stdin when the path is `-`.
pub fn read_drafts(path: &Path, default_rate: TaxRate) -> CliResult<Vec<LineItem>> {
    let read_err = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };
    let json = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).map_err(read_err)?
    } else {
        std::fs::read_to_string(path).map_err(read_err)?
    };
    parse_drafts(&json, default_rate)
}

// =============================================================================
// Totals
// =============================================================================

/// Machine-readable totals output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsOutput {
    pub lines: Vec<LineBreakdown>,
    pub totals: InvoiceTotals,
}

/// Validates the lines against the billing policy and computes totals.
pub fn compute_totals(lines: &[LineItem], billing: &BillingConfig) -> CliResult<TotalsOutput> {
    validate_line_items(lines, billing.line_policy())?;
    let totals = calculate_invoice_totals(lines);
    info!(
        lines = lines.len(),
        total = totals.total.cents(),
        "Invoice totals computed"
    );
    Ok(TotalsOutput {
        lines: invoice_breakdown(lines),
        totals,
    })
}

/// Human-readable invoice summary.
pub fn render_totals(lines: &[LineItem], output: &TotalsOutput, billing: &BillingConfig) -> String {
    let money = |amount: Money| format_currency(amount, &billing.currency, &billing.locale);
    let mut out = String::new();

    for (index, (line, row)) in lines.iter().zip(&output.lines).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} x {} @ {}%  = {} + {} tax = {}",
            index + 1,
            line.quantity,
            money(line.unit_price),
            line.tax_rate.percentage(),
            money(row.subtotal),
            money(row.tax),
            money(row.total),
        );
    }

    let _ = writeln!(out, "Subtotal: {}", money(output.totals.subtotal));
    let _ = writeln!(out, "Tax:      {}", money(output.totals.tax_total));
    let _ = write!(out, "Total:    {}", money(output.totals.total));
    out
}

/// Full `crm totals` command.
pub fn totals(path: &Path, json: bool, billing: &BillingConfig) -> CliResult<String> {
    let lines = read_drafts(path, billing.default_rate())?;
    debug!(?path, lines = lines.len(), "Line item drafts loaded");
    let output = compute_totals(&lines, billing)?;
    if json {
        Ok(serde_json::to_string_pretty(&output)?)
    } else {
        Ok(render_totals(&lines, &output, billing))
    }
}

// =============================================================================
// Permissions
// =============================================================================

/// Renders a role's effective grants, one resource per line.
pub fn render_permissions(role: Role) -> String {
    let grants = role_permissions(role);
    let mut out = format!("{role} (rank {})", role.rank());
    if grants.is_empty() {
        out.push_str("\n  (no permissions)");
    }
    for resource in Resource::ALL {
        let actions = allowed_actions(Some(role), resource);
        if actions.is_empty() {
            continue;
        }
        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        let _ = write!(out, "\n  {:<13} {}", resource.as_str(), names.join(", "));
    }
    out
}

/// The role to evaluate: explicit flag first, then the configured session.
pub fn resolve_role(flag: Option<Role>, configured: Option<Role>) -> CliResult<Role> {
    flag.or(configured).ok_or(CliError::NoRole)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing() -> BillingConfig {
        BillingConfig::default()
    }

    #[test]
    fn test_parse_bare_array() {
        let lines = parse_drafts(
            r#"[{"quantity":3,"unitPrice":1000,"taxRate":8.25}]"#,
            TaxRate::zero(),
        )
        .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total().cents(), 3248);
    }

    #[test]
    fn test_parse_invoice_object_uses_default_rate() {
        let lines = parse_drafts(
            r#"{"lineItems":[{"quantity":1,"unitPrice":1000}]}"#,
            TaxRate::from_percentage(20.0),
        )
        .unwrap();
        assert_eq!(lines[0].tax().cents(), 200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_drafts(r#"{"lines":true}"#, TaxRate::zero()),
            Err(CliError::Json(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_tax_rate() {
        let err = parse_drafts(
            r#"[{"quantity":1,"unitPrice":1000,"taxRate":8.25},{"quantity":1,"unitPrice":1000,"taxRate":-5}]"#,
            TaxRate::zero(),
        )
        .unwrap_err();
        match err {
            CliError::Core(crm_core::CoreError::Validation(ValidationError::Line { index, .. })) => {
                assert_eq!(index, 1)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compute_totals_rejects_price_that_would_overflow() {
        let lines = parse_drafts(
            r#"[{"quantity":1000000,"unitPrice":10000000000000,"taxRate":0}]"#,
            TaxRate::zero(),
        )
        .unwrap();
        assert!(matches!(
            compute_totals(&lines, &billing()),
            Err(CliError::Core(crm_core::CoreError::Validation(
                ValidationError::Line { index: 0, .. }
            )))
        ));
    }

    #[test]
    fn test_compute_totals_mixed_rates() {
        let lines = parse_drafts(
            r#"[{"quantity":1,"unitPrice":50,"taxRate":10},{"quantity":1,"unitPrice":50,"taxRate":20}]"#,
            TaxRate::zero(),
        )
        .unwrap();
        let output = compute_totals(&lines, &billing()).unwrap();
        assert_eq!(output.totals.subtotal.cents(), 100);
        assert_eq!(output.totals.tax_total.cents(), 15);
        assert_eq!(output.totals.total.cents(), 115);
    }

    #[test]
    fn test_compute_totals_respects_credit_policy() {
        let lines = parse_drafts(r#"[{"quantity":-1,"unitPrice":500}]"#, TaxRate::zero()).unwrap();
        assert!(compute_totals(&lines, &billing()).is_err());

        let credits = BillingConfig {
            allow_credits: true,
            ..billing()
        };
        let output = compute_totals(&lines, &credits).unwrap();
        assert_eq!(output.totals.total.cents(), -500);
    }

    #[test]
    fn test_render_totals() {
        let lines = parse_drafts(
            r#"[{"quantity":3,"unitPrice":1000,"taxRate":8.25}]"#,
            TaxRate::zero(),
        )
        .unwrap();
        let output = compute_totals(&lines, &billing()).unwrap();
        let text = render_totals(&lines, &output, &billing());
        assert!(text.contains("3 x $10.00 @ 8.25%"));
        assert!(text.contains("= $30.00 + $2.48 tax = $32.48"));
        assert!(text.ends_with("Total:    $32.48"));
    }

    #[test]
    fn test_totals_json_output() {
        let lines = parse_drafts(r#"[{"quantity":2,"unitPrice":250}]"#, TaxRate::zero()).unwrap();
        let output = compute_totals(&lines, &billing()).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["totals"]["total"], 500);
        assert_eq!(json["lines"][0]["subtotal"], 500);
    }

    #[test]
    fn test_render_permissions() {
        let text = render_permissions(Role::Staff);
        assert!(text.starts_with("staff (rank 1)"));
        assert!(text.contains("contacts      create, read, update"));
        assert!(!text.contains("billing"));

        let text = render_permissions(Role::Owner);
        assert!(text.contains("billing       create, read, update, delete\n"));
        assert!(!text.contains("manage"));
    }

    #[test]
    fn test_resolve_role() {
        assert_eq!(resolve_role(Some(Role::Staff), Some(Role::Owner)).unwrap(), Role::Staff);
        assert_eq!(resolve_role(None, Some(Role::Owner)).unwrap(), Role::Owner);
        assert!(matches!(resolve_role(None, None), Err(CliError::NoRole)));
    }
}
