//! Tool settings: resource limits, debug output, and default file names.
//!
//! Layers, lowest to highest priority:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! envcheck.toml         in the project root, if present
//!        ↑ overridden by
//! Environment vars      ENVCHECK__KEY
//!        ↑ overridden by
//! Overrides             programmatic (CLI flags)
//! ```
//!
//! Environment pairs are taken as an iterator so tests can pass synthetic
//! data instead of `std::env::vars()`.

use std::path::Path;

use confique::Config;
use toml::{Table, Value};

use crate::error::EnvcheckError;
use crate::guard::Limits;

/// File name looked up in the project root.
pub const SETTINGS_FILE: &str = "envcheck.toml";

/// Prefix for environment overrides, e.g. `ENVCHECK__DEBUG=true`.
pub const ENV_PREFIX: &str = "ENVCHECK";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Largest file, in bytes, that will be read or repaired.
    #[config(default = 10485760)]
    pub max_file_bytes: u64,

    /// Longest line, in characters, that the parser will inspect.
    #[config(default = 10000)]
    pub max_line_chars: usize,

    /// Include full paths and OS error chains in diagnostics.
    #[config(default = false)]
    pub debug: bool,

    /// Runtime env file, relative to the project root.
    #[config(default = ".env")]
    pub target: String,

    /// Template file, relative to the project root.
    #[config(default = ".env.example")]
    pub template: String,
}

impl Settings {
    pub fn limits(&self) -> Limits {
        Limits {
            max_file_bytes: self.max_file_bytes,
            max_line_chars: self.max_line_chars,
        }
    }
}

/// Resolve settings for `root` from all layers.
pub fn load_settings(
    root: &Path,
    env_vars: impl IntoIterator<Item = (String, String)>,
    overrides: &[(String, Value)],
) -> Result<Settings, EnvcheckError> {
    let mut table = env_to_table(ENV_PREFIX, env_vars);
    for (key, value) in overrides {
        table.insert(key.clone(), value.clone());
    }

    let layer: <Settings as Config>::Layer =
        Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| EnvcheckError::InvalidSetting {
                key: "<env or override>".into(),
                reason: e.to_string(),
            })?;

    let settings = Settings::builder()
        .preloaded(layer)
        .file(root.join(SETTINGS_FILE))
        .load()?;

    check_limits(&settings)?;
    Ok(settings)
}

fn check_limits(settings: &Settings) -> Result<(), EnvcheckError> {
    if settings.max_file_bytes == 0 {
        return Err(EnvcheckError::InvalidSetting {
            key: "max_file_bytes".into(),
            reason: "must be greater than zero".into(),
        });
    }
    if settings.max_line_chars == 0 {
        return Err(EnvcheckError::InvalidSetting {
            key: "max_line_chars".into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

/// Build a flat table from `{PREFIX}__KEY` variables. Keys are lowercased.
fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        table.insert(rest.to_lowercase(), parse_env_value(&value));
    }
    table
}

/// Tries: bool → integer → string.
fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    Value::String(s.to_string())
}
