//! `envcheck` command-line tool.
//!
//! ```sh
//! envcheck                         # compare .env against .env.example
//! envcheck --fix                   # append missing keys to .env
//! envcheck --generate-template     # rewrite .env.example from .env
//! envcheck --json                  # machine-readable report
//! ```
//!
//! Exits with status 1 when keys are missing or an operation fails.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use envcheck::{CheckArgs, Envcheck, sanitize_error};

/// Keep .env files in sync with their template.
#[derive(Parser, Debug)]
#[command(name = "envcheck", version)]
struct Cli {
    #[command(flatten)]
    check: CheckArgs,

    /// Print the result as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log each file decision to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let builder = cli.check.configure(Envcheck::builder());
    let debug = cli.check.debug || builder.settings().is_ok_and(|s| s.debug);
    let action = cli.check.into_action();

    let result = match builder.handle(&action) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {}", sanitize_error(&e, debug));
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match result.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to render JSON: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{result}");
    }

    if result.needs_attention() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
