//! Security validation primitives.
//!
//! Every check here is a pure function over its arguments (plus, for the
//! file-level checks, a single metadata lookup). Rejections are returned as
//! named [`EnvcheckError`] variants so callers can tell a traversal attempt
//! from an oversized file without string matching.
//!
//! The content checks are split by severity:
//!
//! - [`validate_variable_name`] and [`scan_for_suspicious_content`] never
//!   fail. The parser uses them to skip or annotate lines.
//! - Everything else returns `Result` and blocks the operation that asked.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::EnvcheckError;

/// Default ceiling for any file read by the tool: 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10_485_760;

/// Default ceiling for a single line, in characters.
pub const DEFAULT_MAX_LINE_CHARS: usize = 10_000;

/// Names that pass the identifier grammar but are refused anyway.
const RESERVED_NAMES: [&str; 3] = ["__PROTO__", "CONSTRUCTOR", "PROTOTYPE"];

/// Resource ceilings applied while reading and parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_file_bytes: u64,
    pub max_line_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }
}

/// Category of a suspicious value. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousPattern {
    CommandSubstitution,
    BacktickExecution,
    ScriptTag,
    ChainedCommand,
}

impl fmt::Display for SuspiciousPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SuspiciousPattern::CommandSubstitution => "command substitution",
            SuspiciousPattern::BacktickExecution => "backtick execution",
            SuspiciousPattern::ScriptTag => "script tag",
            SuspiciousPattern::ChainedCommand => "chained shell command",
        };
        f.write_str(label)
    }
}

// Checked in order; the first hit wins.
static SUSPICIOUS_PATTERNS: LazyLock<Vec<(SuspiciousPattern, Regex)>> = LazyLock::new(|| {
    vec![
        (
            SuspiciousPattern::CommandSubstitution,
            Regex::new(r"\$\([^)]*\)").unwrap(),
        ),
        (
            SuspiciousPattern::BacktickExecution,
            Regex::new(r"`[^`]*`").unwrap(),
        ),
        (
            SuspiciousPattern::ScriptTag,
            Regex::new(r"(?i)<\s*script\b").unwrap(),
        ),
        (
            SuspiciousPattern::ChainedCommand,
            Regex::new(
                r"(?:;|&&|\|\|)\s*(?:rm|curl|wget|bash|sh|eval|exec|chmod|chown|dd|mkfs|nc|shutdown|reboot)\b",
            )
            .unwrap(),
        ),
    ]
});

/// Resolve `raw` against `root` and require the result to stay inside `root`.
///
/// Containment is decided by prefix comparison of the lexically normalized,
/// separator-terminated paths, so `..foo` is an ordinary name and
/// `sub/../../etc` is caught.
pub fn validate_path(raw: &str, root: &Path) -> Result<PathBuf, EnvcheckError> {
    if raw.trim().is_empty() {
        return Err(EnvcheckError::InvalidPath);
    }
    if raw.contains('\0') {
        return Err(EnvcheckError::NullByteDetected);
    }

    let root = absolute_root(root)?;
    let resolved = normalize(&root.join(raw));

    if !is_within(&resolved, &root) {
        return Err(EnvcheckError::PathTraversal {
            path: resolved,
            root,
        });
    }
    Ok(resolved)
}

/// If `path` is a symbolic link, require its target to resolve inside `root`.
///
/// Missing paths and regular files pass.
pub fn validate_symlink_containment(path: &Path, root: &Path) -> Result<(), EnvcheckError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(EnvcheckError::io(path, e)),
    };
    if !meta.file_type().is_symlink() {
        return Ok(());
    }

    let target = resolve_link_target(path)?;
    let root = match dunce::canonicalize(root) {
        Ok(r) => r,
        Err(_) => absolute_root(root)?,
    };

    if !is_within(&target, &root) {
        return Err(EnvcheckError::SymlinkEscape {
            path: path.to_path_buf(),
            target,
            root,
        });
    }
    Ok(())
}

/// Size of the file at `path` in bytes, or 0 if it does not exist.
pub fn validate_size(path: &Path, max_bytes: u64) -> Result<u64, EnvcheckError> {
    let size = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(EnvcheckError::io(path, e)),
    };
    if size > max_bytes {
        return Err(EnvcheckError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }
    Ok(size)
}

/// Bound the length of a line before any pattern matching runs over it.
pub fn validate_line_length(line: &str, max_chars: usize) -> Result<(), EnvcheckError> {
    // Byte length is an upper bound on char count.
    if line.len() <= max_chars {
        return Ok(());
    }
    let length = line.chars().count();
    if length > max_chars {
        return Err(EnvcheckError::LineTooLong {
            length,
            limit: max_chars,
        });
    }
    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*`, excluding a few reserved names in any case.
pub fn validate_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    let upper = name.to_ascii_uppercase();
    !RESERVED_NAMES.contains(&upper.as_str())
}

/// Return the first suspicious pattern found in `text`, if any.
pub fn scan_for_suspicious_content(text: &str) -> Option<SuspiciousPattern> {
    SUSPICIOUS_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(pattern, _)| *pattern)
}

/// Full pre-flight for a file: containment, existence, symlink, size.
///
/// Checks run in that order and the first failure is returned.
pub fn validate_file(
    raw: &str,
    root: &Path,
    must_exist: bool,
    limits: &Limits,
) -> Result<PathBuf, EnvcheckError> {
    let path = validate_path(raw, root)?;

    if must_exist && fs::symlink_metadata(&path).is_err() {
        return Err(EnvcheckError::FileNotFound { path });
    }

    validate_symlink_containment(&path, root)?;
    validate_size(&path, limits.max_file_bytes)?;
    Ok(path)
}

fn absolute_root(root: &Path) -> Result<PathBuf, EnvcheckError> {
    let abs = std::path::absolute(root).map_err(|e| EnvcheckError::io(root, e))?;
    Ok(normalize(&abs))
}

fn resolve_link_target(link: &Path) -> Result<PathBuf, EnvcheckError> {
    if let Ok(target) = dunce::canonicalize(link) {
        return Ok(target);
    }
    // Dangling link: resolve lexically relative to the link's directory.
    let raw = fs::read_link(link).map_err(|e| EnvcheckError::io(link, e))?;
    let joined = match link.parent() {
        Some(parent) if raw.is_relative() => parent.join(raw),
        _ => raw,
    };
    Ok(normalize(&joined))
}

/// Resolve `.` and `..` without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

fn is_within(path: &Path, root: &Path) -> bool {
    with_trailing_separator(path).starts_with(&with_trailing_separator(root))
}

fn with_trailing_separator(path: &Path) -> String {
    let mut s = path.to_string_lossy().into_owned();
    if !s.ends_with(MAIN_SEPARATOR) {
        s.push(MAIN_SEPARATOR);
    }
    s
}
