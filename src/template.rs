//! Template generation: a copy of a runtime file with secrets blanked.
//!
//! Works line by line on the raw text rather than on a parsed record set, so
//! comments, ordering, spacing, and lines the parser would skip all survive
//! unchanged. A line is only rewritten when its key looks sensitive; the
//! value and any trailing comment on that line are dropped.

use std::fs;
use std::path::Path;

use crate::error::{EnvcheckError, sanitize_error};
use crate::guard::{self, Limits};
use crate::parse::ParseWarning;

/// Case-insensitive substrings that mark a key as holding a secret.
const SENSITIVE_TOKENS: [&str; 13] = [
    "KEY",
    "SECRET",
    "PASSWORD",
    "PASS",
    "TOKEN",
    "CREDENTIAL",
    "AUTH",
    "PRIVATE",
    "SIGNATURE",
    "HASH",
    "SALT",
    "CERT",
    "CONNECTION",
];

/// Templates are meant to be committed: owner read/write, everyone read.
const TEMPLATE_MODE: u32 = 0o644;

pub fn is_sensitive_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    SENSITIVE_TOKENS.iter().any(|token| upper.contains(token))
}

/// Pure function: blank the values of sensitive keys in `content`.
///
/// Lines whose key is not a valid variable name are left for human review
/// and reported as warnings.
pub fn sanitize_document(content: &str) -> (String, Vec<ParseWarning>) {
    let mut warnings = Vec::new();
    let mut lines = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines.push(line.to_string());
            continue;
        }
        let Some((raw_key, _)) = line.split_once('=') else {
            lines.push(line.to_string());
            continue;
        };

        let key = raw_key.trim();
        if is_sensitive_key(key) {
            lines.push(format!("{raw_key}="));
            continue;
        }
        if !guard::validate_variable_name(key) {
            let warning = ParseWarning::InvalidName {
                line: i + 1,
                name: key.to_string(),
            };
            tracing::debug!("{warning}; left unchanged in template");
            warnings.push(warning);
        }
        lines.push(line.to_string());
    }

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    (out, warnings)
}

/// Write a sanitized copy of `source_raw` to `target_raw`, both inside `root`.
///
/// Returns `false` on any failure; the reason is logged, sanitized
/// according to `debug`.
pub fn generate_template(
    source_raw: &str,
    target_raw: &str,
    root: &Path,
    limits: &Limits,
    debug: bool,
) -> bool {
    match try_generate_template(source_raw, target_raw, root, limits) {
        Ok(_) => true,
        Err(e) => {
            let msg = sanitize_error(&e, debug);
            tracing::error!("template generation failed: {msg}");
            false
        }
    }
}

pub(crate) fn try_generate_template(
    source_raw: &str,
    target_raw: &str,
    root: &Path,
    limits: &Limits,
) -> Result<Vec<ParseWarning>, EnvcheckError> {
    let source = guard::validate_file(source_raw, root, true, limits)?;
    let target = guard::validate_file(target_raw, root, false, limits)?;

    let content = fs::read_to_string(&source).map_err(|e| EnvcheckError::io(&source, e))?;
    let (sanitized, warnings) = sanitize_document(&content);
    crate::repair::write_with_mode(&target, &sanitized, TEMPLATE_MODE)?;

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "generated template"
    );
    Ok(warnings)
}
