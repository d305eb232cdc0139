use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvcheckError {
    #[error("Invalid path: expected a non-empty path")]
    InvalidPath,

    #[error("Null byte detected in path")]
    NullByteDetected,

    #[error("Path traversal blocked: '{}' escapes root '{}'", path.display(), root.display())]
    PathTraversal { path: PathBuf, root: PathBuf },

    #[error("Symlink escape blocked: '{}' points to '{}' outside root '{}'", path.display(), target.display(), root.display())]
    SymlinkEscape {
        path: PathBuf,
        target: PathBuf,
        root: PathBuf,
    },

    #[error("File too large: {} is {size} bytes (limit {limit} bytes)", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Line too long: {length} characters (limit {limit})")]
    LineTooLong { length: usize, limit: usize },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot use {file}: {reason}")]
    Unreadable { file: String, reason: String },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Invalid value for setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl EnvcheckError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath => "INVALID_PATH",
            Self::NullByteDetected => "NULL_BYTE_DETECTED",
            Self::PathTraversal { .. } => "PATH_TRAVERSAL",
            Self::SymlinkEscape { .. } => "SYMLINK_ESCAPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::LineTooLong { .. } => "LINE_TOO_LONG",
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
            Self::Unreadable { .. } => "UNREADABLE",
            Self::Settings(_) => "SETTINGS_ERROR",
            Self::InvalidSetting { .. } => "INVALID_SETTING",
        }
    }

    /// True for the rejections raised by the guard layer.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath
                | Self::NullByteDetected
                | Self::PathTraversal { .. }
                | Self::SymlinkEscape { .. }
                | Self::FileTooLarge { .. }
                | Self::LineTooLong { .. }
        )
    }
}

/// Render an error for the user.
///
/// Without `debug`, the message never contains absolute paths or the OS error
/// chain: files are named by their base name only. With `debug`, the full
/// message and every `source()` in the chain are included.
pub fn sanitize_error(err: &EnvcheckError, debug: bool) -> String {
    if debug {
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        return msg;
    }

    match err {
        EnvcheckError::PathTraversal { path, .. } => {
            format!("Path traversal blocked for '{}'", base_name(path))
        }
        EnvcheckError::SymlinkEscape { path, .. } => {
            format!("Symlink '{}' points outside the project", base_name(path))
        }
        EnvcheckError::FileTooLarge { path, size, limit } => format!(
            "File '{}' is too large ({size} bytes, limit {limit} bytes)",
            base_name(path)
        ),
        EnvcheckError::FileNotFound { path } => {
            format!("File '{}' not found", base_name(path))
        }
        EnvcheckError::Io { path, source } => {
            format!("Failed to access '{}': {}", base_name(path), source.kind())
        }
        EnvcheckError::Unreadable { file, reason } => {
            format!("Cannot use {}: {reason}", base_name(Path::new(file)))
        }
        EnvcheckError::Settings(_) => "Failed to load settings".to_string(),
        other => other.to_string(),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_too_large_mentions_both_sizes() {
        let err = EnvcheckError::FileTooLarge {
            path: "/srv/app/.env".into(),
            size: 20,
            limit: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn sanitized_io_error_hides_absolute_path() {
        let err = EnvcheckError::io(
            "/home/alice/secret/project/.env",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let msg = sanitize_error(&err, false);
        assert!(msg.contains(".env"));
        assert!(!msg.contains("/home/alice"));
    }

    #[test]
    fn debug_error_includes_full_path_and_cause() {
        let err = EnvcheckError::io(
            "/home/alice/project/.env",
            std::io::Error::other("disk on fire"),
        );
        let msg = sanitize_error(&err, true);
        assert!(msg.contains("/home/alice/project/.env"));
        assert!(msg.contains("disk on fire"));
    }

    #[test]
    fn sanitized_traversal_names_base_only() {
        let err = EnvcheckError::PathTraversal {
            path: "/etc/passwd".into(),
            root: "/srv/app".into(),
        };
        let msg = sanitize_error(&err, false);
        assert!(msg.contains("passwd"));
        assert!(!msg.contains("/srv/app"));
    }

    #[test]
    fn sanitized_unreadable_names_base_only() {
        let err = EnvcheckError::Unreadable {
            file: "/etc/private/.env".into(),
            reason: "Path traversal blocked for '.env'".into(),
        };
        let msg = sanitize_error(&err, false);
        assert_eq!(msg, "Cannot use .env: Path traversal blocked for '.env'");
        assert!(sanitize_error(&err, true).contains("/etc/private/.env"));
    }

    #[test]
    fn codes_are_distinct_for_guard_failures() {
        assert_eq!(EnvcheckError::NullByteDetected.code(), "NULL_BYTE_DETECTED");
        assert_eq!(EnvcheckError::InvalidPath.code(), "INVALID_PATH");
        assert!(
            EnvcheckError::LineTooLong {
                length: 2,
                limit: 1
            }
            .is_security_rejection()
        );
        assert!(!EnvcheckError::FileNotFound { path: ".env".into() }.is_security_rejection());
    }
}
