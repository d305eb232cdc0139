//! Result types returned to the caller for display.
//!
//! [`CheckResult`] renders as a plain-text report through `Display`, and as
//! JSON through `serde`.

use std::fmt;

use serde::Serialize;

use crate::reconcile::ReconciliationResult;

/// Result of an envcheck operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckResult {
    /// Comparison of the target against the template.
    Report {
        target: String,
        template: String,
        target_found: bool,
        template_found: bool,
        result: ReconciliationResult,
        /// Parse warnings from both files, already rendered.
        warnings: Vec<String>,
    },
    /// Keys appended to the target. Empty when nothing was missing.
    Repaired { target: String, added: Vec<String> },
    /// A sanitized template was written.
    TemplateWritten { path: String, warnings: Vec<String> },
}

impl CheckResult {
    /// True when the operation left the target out of sync.
    pub fn needs_attention(&self) -> bool {
        match self {
            CheckResult::Report { result, .. } => !result.is_in_sync(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Report {
                target,
                template,
                target_found,
                template_found,
                result,
                warnings,
            } => {
                for warning in warnings {
                    writeln!(f, "warning: {warning}")?;
                }
                if !template_found {
                    return write!(f, "No template {template} found; nothing to check");
                }
                if !target_found {
                    writeln!(f, "{target} not found")?;
                }
                writeln!(
                    f,
                    "{target}: {}/{} keys from {template} ({}%)",
                    result.synced.len(),
                    result.total_template,
                    result.percentage
                )?;
                write_list(f, "Missing", &result.missing)?;
                write_list(f, "Extra", &result.extra)
            }
            CheckResult::Repaired { target, added } if added.is_empty() => {
                write!(f, "{target} is already in sync")
            }
            CheckResult::Repaired { target, added } => {
                write!(f, "Added {} key(s) to {target}: {}", added.len(), added.join(", "))
            }
            CheckResult::TemplateWritten { path, warnings } => {
                for warning in warnings {
                    writeln!(f, "warning: {warning}")?;
                }
                write!(f, "Template written to {path}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, label: &str, keys: &[String]) -> fmt::Result {
    if keys.is_empty() {
        return Ok(());
    }
    writeln!(f, "{label}:")?;
    for key in keys {
        writeln!(f, "  {key}")?;
    }
    Ok(())
}
