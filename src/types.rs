/// An envcheck operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvAction {
    /// Compare the target against the template and report.
    Check,
    /// Append keys missing from the target, taking values from the template.
    Fix,
    /// Write a sanitized copy of the target. `None` writes to the configured
    /// template path.
    Template { output: Option<String> },
}
