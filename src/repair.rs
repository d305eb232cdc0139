//! Repair: append missing keys from the template to the target file.
//!
//! Existing bytes are never rewritten. The appended block starts with
//! [`REPAIR_MARKER`] and carries each template record's comment, its value
//! (re-quoted if the template quoted it), and a blank spacer line.
//!
//! Repairs are not deduplicated: running the same repair twice appends two
//! blocks.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{EnvcheckError, sanitize_error};
use crate::guard::{self, Limits};
use crate::parse::RecordSet;

/// Comment line separating appended entries from the original content.
pub const REPAIR_MARKER: &str = "# --- Added by envcheck ---";

/// Owner read/write only; the target usually holds secrets.
const TARGET_MODE: u32 = 0o600;

/// Pure function: append entries for `missing` keys to `content`.
///
/// Keys the template does not define are skipped. Returns the new document
/// and the keys that were actually appended.
pub fn append_missing(
    content: &str,
    missing: &[String],
    template: &RecordSet,
) -> (String, Vec<String>) {
    let mut block = Vec::new();
    let mut added = Vec::new();

    for key in missing {
        let Some(record) = template.get(key) else {
            tracing::debug!(key = %key, "template does not define key; skipping");
            continue;
        };
        if let Some(comment) = &record.comment {
            block.push(format!("# {comment}"));
        }
        if record.quoted {
            block.push(format!("{key}=\"{}\"", record.value));
        } else {
            block.push(format!("{key}={}", record.value));
        }
        block.push(String::new());
        added.push(key.clone());
    }

    let mut out = content.to_string();
    if block.is_empty() {
        return (out, added);
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for line in ["", REPAIR_MARKER, ""]
        .into_iter()
        .chain(block.iter().map(String::as_str))
    {
        out.push_str(line);
        out.push('\n');
    }
    (out, added)
}

/// Append missing keys to the file at `raw_path` inside `root`.
///
/// Returns `false` on any failure; the reason is logged, sanitized
/// according to `debug`.
pub fn repair(
    raw_path: &str,
    root: &Path,
    missing: &[String],
    template: &RecordSet,
    limits: &Limits,
    debug: bool,
) -> bool {
    match try_repair(raw_path, root, missing, template, limits) {
        Ok(_) => true,
        Err(e) => {
            let msg = sanitize_error(&e, debug);
            tracing::error!("repair failed: {msg}");
            false
        }
    }
}

pub(crate) fn try_repair(
    raw_path: &str,
    root: &Path,
    missing: &[String],
    template: &RecordSet,
    limits: &Limits,
) -> Result<Vec<String>, EnvcheckError> {
    let path = guard::validate_file(raw_path, root, false, limits)?;

    // Read directly; a missing file is empty content.
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(EnvcheckError::io(&path, e)),
    };

    let (new_content, added) = append_missing(&content, missing, template);
    write_with_mode(&path, &new_content, TARGET_MODE)?;

    tracing::debug!(path = %path.display(), added = added.len(), "repaired env file");
    Ok(added)
}

/// Write `content` in a single call, creating parent directories as needed.
#[cfg(unix)]
pub(crate) fn write_with_mode(path: &Path, content: &str, mode: u32) -> Result<(), EnvcheckError> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    create_parent(path)?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
        .map_err(|e| EnvcheckError::io(path, e))?;
    // `mode` only applies on creation.
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| EnvcheckError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| EnvcheckError::io(path, e))
}

/// Write `content` in a single call. Permission bits are a Unix concept.
#[cfg(not(unix))]
pub(crate) fn write_with_mode(path: &Path, content: &str, _mode: u32) -> Result<(), EnvcheckError> {
    create_parent(path)?;
    fs::write(path, content).map_err(|e| EnvcheckError::io(path, e))
}

fn create_parent(path: &Path) -> Result<(), EnvcheckError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| EnvcheckError::io(parent, e))?;
    }
    Ok(())
}
