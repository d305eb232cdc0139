//! Keep a runtime `.env` file in step with its committed template.
//!
//! Envcheck parses both files, reports which keys are missing from the
//! runtime file and which are extra, and can append the missing entries or
//! regenerate the template with secrets blanked.
//!
//! ```ignore
//! let result = Envcheck::builder()
//!     .root("/srv/app")
//!     .handle(&EnvAction::Check)?;
//! println!("{result}");
//! ```
//!
//! That single call reads `/srv/app/.env` and `/srv/app/.env.example`,
//! compares their key sets, and hands back a [`CheckResult`] you can print or
//! serialize to JSON.
//!
//! # Pipeline
//!
//! ```text
//! file bytes ─▶ guard ─▶ parse ─▶ RecordSet ─┐
//!                                            ├─▶ reconcile ─▶ ReconciliationResult
//! file bytes ─▶ guard ─▶ parse ─▶ RecordSet ─┘          │
//!                                                       ├─▶ repair   (append missing)
//!                                                       └─▶ template (blank secrets)
//! ```
//!
//! Each stage is usable on its own. [`parse()`] and [`reconcile()`] are pure;
//! [`repair()`] and [`generate_template()`] do their own I/O and report
//! failure as `false` plus a logged, sanitized message.
//!
//! # File format
//!
//! One `KEY=value` per line. The first `=` splits key from value; both sides
//! are trimmed. Values may be wrapped in matching `"` or `'`. A `#` starts a
//! comment, either on its own line or after a value:
//!
//! ```text
//! # Database connection        ← block comment, attaches to DATABASE_URL
//! DATABASE_URL="postgres://"   # primary  ← inline comment
//! ```
//!
//! A record's comment is the block comment, the inline comment, or
//! `"block (inline)"` when both are present. A blank line, or any line that
//! is neither a comment nor a variable, detaches a pending block comment.
//!
//! # Tolerant parsing, strict guards
//!
//! Parsing never fails. Lines that are too long or whose key is not a valid
//! identifier are skipped; values that look like shell injection are kept.
//! Every such case is logged via `tracing` and recorded as a
//! [`ParseWarning`] on the [`RecordSet`].
//!
//! File access is the opposite. Before any read or write, the [`guard`]
//! module requires the path to stay inside the project root (including
//! through symlinks) and the file to fit the size limit. A violation stops
//! the operation with a named [`EnvcheckError`] variant.
//!
//! # Keys
//!
//! Keys must match `[A-Za-z_][A-Za-z0-9_]*`. `__proto__`, `constructor`, and
//! `prototype` are refused in any case. A key defined twice keeps the last
//! value at the position of the first, and the duplicate is reported as a
//! warning.
//!
//! # Sync percentage
//!
//! The share of template keys present in the target, rounded to the nearest
//! integer. No template, or an empty one, means 100%. No target means 0%.
//!
//! # Repair
//!
//! `--fix` appends missing keys below a `# --- Added by envcheck ---` marker,
//! copying each key's comment and value from the template. Existing content
//! is never rewritten. Running it twice appends twice. The file is written
//! owner-read/write only.
//!
//! # Template generation
//!
//! The template is the target copied line by line, with the value (and
//! trailing comment) removed from any key containing `KEY`, `SECRET`,
//! `PASSWORD`, `TOKEN`, `AUTH`, and similar tokens. Lines that are not
//! recognizable variables are copied unchanged. The result is written
//! world-readable, since templates are meant to be committed.
//!
//! # Settings
//!
//! ```text
//! Compiled defaults     max_file_bytes = 10 MiB, max_line_chars = 10000
//!        ↑ overridden by
//! envcheck.toml         in the project root
//!        ↑ overridden by
//! Environment vars      ENVCHECK__MAX_LINE_CHARS=20000
//!        ↑ overridden by
//! Builder overrides     .target(), .template(), .debug(), .setting()
//! ```
//!
//! The `debug` setting controls error detail: off by default, messages name
//! files by base name only; on, they carry full paths and OS error chains.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`CheckArgs`], a clap `Args` struct to flatten into your parser. The
//! `envcheck` binary is built on it.

pub mod error;
pub mod guard;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod ops;
mod parse;
mod reconcile;
mod repair;
mod settings;
mod template;

#[cfg(test)]
mod fixtures;

pub use builder::{Envcheck, EnvcheckBuilder};
#[cfg(feature = "clap")]
pub use cli::CheckArgs;
pub use error::{EnvcheckError, sanitize_error};
pub use ops::CheckResult;
pub use parse::{ParseWarning, ReadOutcome, Record, RecordSet, parse, parse_with, read_from_disk};
pub use reconcile::{ReconciliationResult, reconcile};
pub use repair::{REPAIR_MARKER, append_missing, repair};
pub use settings::{ENV_PREFIX, SETTINGS_FILE, Settings, load_settings};
pub use template::{generate_template, is_sensitive_key, sanitize_document};
pub use types::EnvAction;
