#[cfg(test)]
pub mod test {
    use std::path::Path;

    use crate::parse::{RecordSet, parse};

    /// A realistic runtime file with block, inline, and quoted values.
    pub const SAMPLE_ENV: &str = "\
# Application name
APP_NAME=demo
PORT=8080 # http port

# Database
DATABASE_URL=\"postgres://localhost/demo\"
API_KEY=sk-live-123
DEBUG=false
";

    /// Template for [`SAMPLE_ENV`]: drops `DEBUG`, adds `REDIS_URL` and `SECRET_TOKEN`.
    pub const SAMPLE_TEMPLATE: &str = "\
# Application name
APP_NAME=demo
PORT=8080

# Database
DATABASE_URL=\"postgres://localhost/app\"
API_KEY=

# Cache
REDIS_URL=\"redis://localhost:6379\"
SECRET_TOKEN=changeme
";

    pub fn sample_env() -> RecordSet {
        parse(SAMPLE_ENV)
    }

    pub fn sample_template() -> RecordSet {
        parse(SAMPLE_TEMPLATE)
    }

    /// Write `content` to `name` under `dir` and return the full path.
    pub fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn fixtures_parse_cleanly() {
        assert!(sample_env().warnings().is_empty());
        assert!(sample_template().warnings().is_empty());
        assert_eq!(sample_template().len(), 6);
    }
}
