//! Clap adapter for envcheck.
//!
//! Compiled only with the `clap` Cargo feature (on by default). [`CheckArgs`]
//! is a clap `Args` struct that can be flattened into any `Parser`. The bridge
//! to the core is two calls: [`CheckArgs::configure()`] applies the path and
//! debug flags to an [`EnvcheckBuilder`], and [`CheckArgs::into_action()`]
//! picks the [`EnvAction`] to run.

use std::path::PathBuf;

use clap::Args;

use crate::builder::EnvcheckBuilder;
use crate::types::EnvAction;

/// Compare an env file against its template, and optionally repair it or
/// regenerate the template.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Project directory holding the env files (default: current directory).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Runtime env file, relative to the root (default: .env).
    #[arg(long)]
    pub target: Option<String>,

    /// Template file, relative to the root (default: .env.example).
    #[arg(long)]
    pub template: Option<String>,

    /// Append keys missing from the target, using the template's values.
    #[arg(long, conflicts_with = "generate_template")]
    pub fix: bool,

    /// Write a sanitized template from the target. Without a value, writes
    /// to the template path.
    #[arg(long, value_name = "OUTPUT", num_args = 0..=1)]
    pub generate_template: Option<Option<String>>,

    /// Show full paths and OS error details in diagnostics.
    #[arg(long)]
    pub debug: bool,
}

impl CheckArgs {
    /// Apply the path and diagnostic flags to a builder. Unset flags leave
    /// the builder's settings layers in charge.
    pub fn configure(&self, mut builder: EnvcheckBuilder) -> EnvcheckBuilder {
        if let Some(root) = &self.root {
            builder = builder.root(root.clone());
        }
        if let Some(target) = &self.target {
            builder = builder.target(target);
        }
        if let Some(template) = &self.template {
            builder = builder.template(template);
        }
        if self.debug {
            builder = builder.debug(true);
        }
        builder
    }

    /// Convert clap-parsed args into a framework-agnostic `EnvAction`.
    pub fn into_action(self) -> EnvAction {
        if let Some(output) = self.generate_template {
            return EnvAction::Template { output };
        }
        if self.fix {
            return EnvAction::Fix;
        }
        EnvAction::Check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Envcheck;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the args.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        check: CheckArgs,
    }

    fn parse(args: &[&str]) -> CheckArgs {
        TestCli::try_parse_from(args).unwrap().check
    }

    #[test]
    fn bare_invocation_is_check() {
        assert_eq!(parse(&["envcheck"]).into_action(), EnvAction::Check);
    }

    #[test]
    fn fix_flag() {
        assert_eq!(parse(&["envcheck", "--fix"]).into_action(), EnvAction::Fix);
    }

    #[test]
    fn generate_template_without_value() {
        let action = parse(&["envcheck", "--generate-template"]).into_action();
        assert_eq!(action, EnvAction::Template { output: None });
    }

    #[test]
    fn generate_template_with_value() {
        let action = parse(&["envcheck", "--generate-template", "out.env"]).into_action();
        assert_eq!(
            action,
            EnvAction::Template {
                output: Some("out.env".into())
            }
        );
    }

    #[test]
    fn fix_conflicts_with_generate_template() {
        let result = TestCli::try_parse_from(["envcheck", "--fix", "--generate-template"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_flag_errors() {
        assert!(TestCli::try_parse_from(["envcheck", "--nope"]).is_err());
    }

    #[test]
    fn configure_applies_overrides() {
        let args = parse(&[
            "envcheck",
            "--target",
            ".env.local",
            "--template",
            ".env.sample",
            "--debug",
        ]);
        let dir = tempfile::TempDir::new().unwrap();
        let settings = args
            .configure(Envcheck::builder().root(dir.path()).no_env())
            .settings()
            .unwrap();
        assert_eq!(settings.target, ".env.local");
        assert_eq!(settings.template, ".env.sample");
        assert!(settings.debug);
    }
}
