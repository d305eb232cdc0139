use std::path::PathBuf;

use crate::error::EnvcheckError;
use crate::ops::CheckResult;
use crate::parse::{self, ReadOutcome, RecordSet};
use crate::reconcile;
use crate::repair;
use crate::settings::{self, Settings};
use crate::template;
use crate::types::EnvAction;

/// Entry point for building an envcheck run.
pub struct Envcheck;

impl Envcheck {
    pub fn builder() -> EnvcheckBuilder {
        EnvcheckBuilder::new()
    }
}

/// Builder for resolving settings and running an [`EnvAction`].
///
/// Every file the run touches is resolved inside [`root()`](Self::root)
/// (default: the current working directory).
pub struct EnvcheckBuilder {
    root: Option<PathBuf>,
    env_vars: Option<Vec<(String, String)>>,
    env_enabled: bool,
    overrides: Vec<(String, toml::Value)>,
}

impl EnvcheckBuilder {
    fn new() -> Self {
        Self {
            root: None,
            env_vars: None,
            env_enabled: true,
            overrides: Vec::new(),
        }
    }

    /// Project directory that contains the env files.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Override the target file name (default: `.env`).
    pub fn target(self, name: &str) -> Self {
        self.setting("target", name)
    }

    /// Override the template file name (default: `.env.example`).
    pub fn template(self, name: &str) -> Self {
        self.setting("template", name)
    }

    /// Include full paths and error chains in diagnostics.
    pub fn debug(self, debug: bool) -> Self {
        self.setting("debug", debug)
    }

    /// Set any [`Settings`] key at the highest-priority layer.
    pub fn setting<V: Into<toml::Value>>(mut self, key: &str, value: V) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Use these pairs instead of the process environment.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    fn effective_root(&self) -> Result<PathBuf, EnvcheckError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().map_err(|e| EnvcheckError::io(".", e)),
        }
    }

    fn effective_env_vars(&self) -> Vec<(String, String)> {
        if !self.env_enabled {
            return vec![];
        }
        match &self.env_vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        }
    }

    /// Resolve settings from all layers.
    pub fn settings(&self) -> Result<Settings, EnvcheckError> {
        let root = self.effective_root()?;
        settings::load_settings(&root, self.effective_env_vars(), &self.overrides)
    }

    /// Run an action against the configured root.
    pub fn handle(&self, action: &EnvAction) -> Result<CheckResult, EnvcheckError> {
        let root = self.effective_root()?;
        let settings = settings::load_settings(&root, self.effective_env_vars(), &self.overrides)?;
        let limits = settings.limits();

        match action {
            EnvAction::Check => {
                let target = read(&settings.target, &root, &settings)?;
                let template = read(&settings.template, &root, &settings)?;
                Ok(report(&settings, target.as_ref(), template.as_ref()))
            }
            EnvAction::Fix => {
                let target = read(&settings.target, &root, &settings)?;
                let Some(template) = read(&settings.template, &root, &settings)? else {
                    tracing::debug!("no template found; nothing to repair");
                    return Ok(CheckResult::Repaired {
                        target: settings.target.clone(),
                        added: vec![],
                    });
                };
                let result = reconcile::reconcile(target.as_ref(), Some(&template));
                if result.missing.is_empty() {
                    return Ok(CheckResult::Repaired {
                        target: settings.target.clone(),
                        added: vec![],
                    });
                }
                let added = repair::try_repair(
                    &settings.target,
                    &root,
                    &result.missing,
                    &template,
                    &limits,
                )?;
                Ok(CheckResult::Repaired {
                    target: settings.target.clone(),
                    added,
                })
            }
            EnvAction::Template { output } => {
                let output = output.as_deref().unwrap_or(settings.template.as_str());
                let warnings =
                    template::try_generate_template(&settings.target, output, &root, &limits)?;
                Ok(CheckResult::TemplateWritten {
                    path: output.to_string(),
                    warnings: warnings.iter().map(ToString::to_string).collect(),
                })
            }
        }
    }
}

fn read(
    name: &str,
    root: &std::path::Path,
    settings: &Settings,
) -> Result<Option<RecordSet>, EnvcheckError> {
    match parse::read_from_disk(name, root, &settings.limits(), settings.debug) {
        ReadOutcome::Found(set) => Ok(Some(set)),
        ReadOutcome::NotFound => Ok(None),
        ReadOutcome::ReadError(reason) => Err(EnvcheckError::Unreadable {
            file: name.to_string(),
            reason,
        }),
    }
}

fn report(
    settings: &Settings,
    target: Option<&RecordSet>,
    template: Option<&RecordSet>,
) -> CheckResult {
    let label = |file: &str, set: Option<&RecordSet>| -> Vec<String> {
        set.map(|s| {
            s.warnings()
                .iter()
                .map(|w| format!("{file}: {w}"))
                .collect()
        })
        .unwrap_or_default()
    };
    let mut warnings = label(&settings.target, target);
    warnings.extend(label(&settings.template, template));

    CheckResult::Report {
        target: settings.target.clone(),
        template: settings.template.clone(),
        target_found: target.is_some(),
        template_found: template.is_some(),
        result: reconcile::reconcile(target, template),
        warnings,
    }
}
