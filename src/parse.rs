//! Tolerant line-oriented parser for `KEY=value` files.
//!
//! The parser makes a single forward pass. The only state carried between
//! lines is the pending block-comment buffer, which lives in a local
//! [`CommentBuffer`] owned by one [`parse_with`] call.
//!
//! Lines are handled in this order:
//!
//! 1. Too long: warn, drop the pending comment, skip.
//! 2. Blank: drop the pending comment.
//! 3. `#` comment: append its body to the pending comment.
//! 4. No `=`: drop the pending comment, skip silently.
//! 5. Invalid key: warn, drop the pending comment, skip.
//! 6. Otherwise record the entry (scanning its value for suspicious content)
//!    and clear the pending comment.
//!
//! Anomalies never abort the parse. They are logged through `tracing` and
//! kept on the [`RecordSet`] as [`ParseWarning`]s.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{EnvcheckError, sanitize_error};
use crate::guard::{self, Limits, SuspiciousPattern};

/// One parsed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Value with surrounding quotes and any inline comment removed.
    pub value: String,
    /// Whether the value was wrapped in matching `"` or `'`.
    pub quoted: bool,
    /// 1-based line number in the source text.
    pub line: usize,
    pub comment: Option<String>,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    LineTooLong {
        line: usize,
        length: usize,
        limit: usize,
    },
    InvalidName {
        line: usize,
        name: String,
    },
    SuspiciousValue {
        line: usize,
        key: String,
        pattern: SuspiciousPattern,
    },
    UnterminatedQuote {
        line: usize,
        key: String,
    },
    DuplicateKey {
        line: usize,
        key: String,
        previous_line: usize,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::LineTooLong {
                line,
                length,
                limit,
            } => write!(
                f,
                "line {line}: skipped, {length} characters exceeds limit of {limit}"
            ),
            ParseWarning::InvalidName { line, name } => {
                write!(f, "line {line}: skipped invalid variable name '{name}'")
            }
            ParseWarning::SuspiciousValue { line, key, pattern } => {
                write!(f, "line {line}: value of '{key}' looks like {pattern}")
            }
            ParseWarning::UnterminatedQuote { line, key } => {
                write!(f, "line {line}: value of '{key}' has an unterminated quote")
            }
            ParseWarning::DuplicateKey {
                line,
                key,
                previous_line,
            } => write!(
                f,
                "line {line}: '{key}' redefines the value from line {previous_line}"
            ),
        }
    }
}

/// The complete parse result of one file.
///
/// Keys are unique. Iteration follows first-occurrence order; a later
/// duplicate replaces the earlier record in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    raw: String,
    warnings: Vec<ParseWarning>,
}

impl RecordSet {
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The text this set was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn lines(&self) -> Vec<&str> {
        self.raw.lines().collect()
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    fn insert(&mut self, record: Record) {
        if let Some(&i) = self.index.get(&record.key) {
            let previous_line = self.records[i].line;
            self.warn(ParseWarning::DuplicateKey {
                line: record.line,
                key: record.key.clone(),
                previous_line,
            });
            self.records[i] = record;
        } else {
            self.index.insert(record.key.clone(), self.records.len());
            self.records.push(record);
        }
    }

    fn warn(&mut self, warning: ParseWarning) {
        tracing::debug!("{warning}");
        self.warnings.push(warning);
    }
}

/// Outcome of reading a file from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(RecordSet),
    NotFound,
    /// The file exists but could not be used. Holds a sanitized message.
    ReadError(String),
}

impl ReadOutcome {
    pub fn found(&self) -> Option<&RecordSet> {
        match self {
            ReadOutcome::Found(set) => Some(set),
            _ => None,
        }
    }
}

/// Parse with the default [`Limits`].
pub fn parse(text: &str) -> RecordSet {
    parse_with(text, &Limits::default())
}

pub fn parse_with(text: &str, limits: &Limits) -> RecordSet {
    let mut set = RecordSet {
        raw: text.to_string(),
        ..RecordSet::default()
    };
    let mut pending = CommentBuffer::default();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;

        if let Err(EnvcheckError::LineTooLong { length, limit }) =
            guard::validate_line_length(line, limits.max_line_chars)
        {
            set.warn(ParseWarning::LineTooLong {
                line: line_no,
                length,
                limit,
            });
            pending.clear();
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            pending.clear();
            continue;
        }
        if let Some(body) = trimmed.strip_prefix('#') {
            pending.push(body.trim_start());
            continue;
        }

        let Some((raw_key, raw_value)) = trimmed.split_once('=') else {
            pending.clear();
            continue;
        };
        let key = raw_key.trim();
        let raw_value = raw_value.trim();

        if !guard::validate_variable_name(key) {
            set.warn(ParseWarning::InvalidName {
                line: line_no,
                name: key.to_string(),
            });
            pending.clear();
            continue;
        }

        if let Some(pattern) = guard::scan_for_suspicious_content(raw_value) {
            set.warn(ParseWarning::SuspiciousValue {
                line: line_no,
                key: key.to_string(),
                pattern,
            });
        }

        let parsed = split_value(raw_value);
        if parsed.unterminated {
            set.warn(ParseWarning::UnterminatedQuote {
                line: line_no,
                key: key.to_string(),
            });
        }

        set.insert(Record {
            key: key.to_string(),
            value: parsed.value,
            quoted: parsed.quoted,
            line: line_no,
            comment: assemble_comment(pending.joined(), parsed.inline_comment),
        });
        pending.clear();
    }

    set
}

/// Read and parse a file, resolving `raw_path` inside `root`.
///
/// A missing file is [`ReadOutcome::NotFound`]. Guard rejections and I/O
/// failures become [`ReadOutcome::ReadError`] with a message sanitized
/// according to `debug`.
pub fn read_from_disk(raw_path: &str, root: &Path, limits: &Limits, debug: bool) -> ReadOutcome {
    let path = match guard::validate_file(raw_path, root, false, limits) {
        Ok(p) => p,
        Err(e) => return ReadOutcome::ReadError(sanitize_error(&e, debug)),
    };

    match std::fs::read_to_string(&path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), "parsing env file");
            ReadOutcome::Found(parse_with(&text, limits))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "env file not found");
            ReadOutcome::NotFound
        }
        Err(e) => {
            let msg = sanitize_error(&EnvcheckError::io(&path, e), debug);
            tracing::error!("{msg}");
            ReadOutcome::ReadError(msg)
        }
    }
}

#[derive(Default)]
struct CommentBuffer {
    lines: Vec<String>,
}

impl CommentBuffer {
    fn push(&mut self, body: &str) {
        self.lines.push(body.to_string());
    }

    fn clear(&mut self) {
        self.lines.clear();
    }

    fn joined(&self) -> Option<String> {
        let text = self
            .lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }
}

struct ParsedValue {
    value: String,
    quoted: bool,
    inline_comment: Option<String>,
    unterminated: bool,
}

fn split_value(raw: &str) -> ParsedValue {
    if let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') {
        return match raw.rfind(quote) {
            Some(end) if end > 0 => ParsedValue {
                value: raw[1..end].to_string(),
                quoted: true,
                inline_comment: raw[end + 1..]
                    .find('#')
                    .and_then(|i| non_empty(&raw[end + 1 + i + 1..])),
                unterminated: false,
            },
            _ => ParsedValue {
                value: raw.to_string(),
                quoted: false,
                inline_comment: None,
                unterminated: true,
            },
        };
    }

    match raw.split_once('#') {
        Some((value, comment)) => ParsedValue {
            value: value.trim().to_string(),
            quoted: false,
            inline_comment: non_empty(comment),
            unterminated: false,
        },
        None => ParsedValue {
            value: raw.to_string(),
            quoted: false,
            inline_comment: None,
            unterminated: false,
        },
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn assemble_comment(block: Option<String>, inline: Option<String>) -> Option<String> {
    match (block, inline) {
        (Some(b), Some(i)) => Some(format!("{b} ({i})")),
        (Some(b), None) => Some(b),
        (None, Some(i)) => Some(i),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::SAMPLE_ENV;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn simple_pair() {
        let set = parse("PORT=8080\n");
        let r = set.get("PORT").unwrap();
        assert_eq!(r.value, "8080");
        assert!(!r.quoted);
        assert_eq!(r.line, 1);
        assert_eq!(r.comment, None);
    }

    #[test]
    fn quoted_value_with_trailing_comment() {
        let set = parse("KEY=\"value\" # trailing");
        let r = set.get("KEY").unwrap();
        assert_eq!(r.value, "value");
        assert!(r.quoted);
        assert_eq!(r.comment.as_deref(), Some("trailing"));
    }

    #[test]
    fn single_quotes_are_recognized() {
        let set = parse("GREETING='hello world'");
        let r = set.get("GREETING").unwrap();
        assert_eq!(r.value, "hello world");
        assert!(r.quoted);
    }

    #[test]
    fn hash_inside_quotes_is_part_of_value() {
        let set = parse("COLOR=\"#ff0000\"");
        assert_eq!(set.get("COLOR").unwrap().value, "#ff0000");
        assert_eq!(set.get("COLOR").unwrap().comment, None);
    }

    #[test]
    fn unquoted_inline_comment() {
        let set = parse("DEBUG=true   # enable logs");
        let r = set.get("DEBUG").unwrap();
        assert_eq!(r.value, "true");
        assert_eq!(r.comment.as_deref(), Some("enable logs"));
    }

    #[test]
    fn first_equals_splits_key_and_value() {
        let set = parse("URL=postgres://x?a=b");
        assert_eq!(set.get("URL").unwrap().value, "postgres://x?a=b");
    }

    #[test]
    fn spaces_around_equals_are_trimmed() {
        let set = parse("  HOST   =   localhost  ");
        assert_eq!(set.get("HOST").unwrap().value, "localhost");
    }

    #[test]
    fn empty_value_is_allowed() {
        let set = parse("EMPTY=");
        assert_eq!(set.get("EMPTY").unwrap().value, "");
    }

    #[test]
    fn unterminated_quote_is_kept_literally() {
        let set = parse("BROKEN=\"abc # not a comment");
        let r = set.get("BROKEN").unwrap();
        assert_eq!(r.value, "\"abc # not a comment");
        assert!(!r.quoted);
        assert_eq!(r.comment, None);
        assert!(matches!(
            set.warnings()[0],
            ParseWarning::UnterminatedQuote { line: 1, .. }
        ));
    }

    #[test]
    fn block_comment_attaches_to_next_variable() {
        let set = parse("# Database\n# connection string\nDB_URL=pg://\n");
        assert_eq!(
            set.get("DB_URL").unwrap().comment.as_deref(),
            Some("Database connection string")
        );
    }

    #[test]
    fn block_and_inline_comments_combine() {
        let set = parse("# API access\nAPI_KEY=abc # rotate monthly\n");
        assert_eq!(
            set.get("API_KEY").unwrap().comment.as_deref(),
            Some("API access (rotate monthly)")
        );
    }

    #[test]
    fn blank_line_detaches_block_comment() {
        let set = parse("# orphan\n\nA=1\n");
        assert_eq!(set.get("A").unwrap().comment, None);
    }

    #[test]
    fn freeform_line_detaches_block_comment() {
        let set = parse("# orphan\n------\nA=1\n");
        assert_eq!(set.get("A").unwrap().comment, None);
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn overlong_line_detaches_block_comment() {
        let limits = Limits {
            max_line_chars: 20,
            ..Limits::default()
        };
        let text = format!("# doc\nLONG={}\nA=1\n", "x".repeat(30));
        let set = parse_with(&text, &limits);
        assert!(!set.contains_key("LONG"));
        assert_eq!(set.get("A").unwrap().comment, None);
    }

    #[test]
    fn comment_is_consumed_by_one_variable() {
        let set = parse("# for A\nA=1\nB=2\n");
        assert_eq!(set.get("A").unwrap().comment.as_deref(), Some("for A"));
        assert_eq!(set.get("B").unwrap().comment, None);
    }

    #[test]
    fn invalid_name_is_skipped_with_warning() {
        let set = parse("# lost\nMY-VAR=1\nOK=2\n");
        assert!(set.get("MY-VAR").is_none());
        assert_eq!(set.get("OK").unwrap().comment, None);
        assert_eq!(
            set.warnings(),
            &[ParseWarning::InvalidName {
                line: 2,
                name: "MY-VAR".into()
            }]
        );
    }

    #[test]
    fn reserved_name_is_skipped() {
        let set = parse("__proto__=polluted\nconstructor=x\nSAFE=1\n");
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("SAFE"));
    }

    #[test]
    fn suspicious_value_is_kept_with_warning() {
        let set = parse("CMD=$(rm -rf /)\n");
        assert_eq!(set.get("CMD").unwrap().value, "$(rm -rf /)");
        assert!(matches!(
            set.warnings()[0],
            ParseWarning::SuspiciousValue {
                pattern: SuspiciousPattern::CommandSubstitution,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_key_last_wins_in_first_position() {
        let set = parse("A=1\nB=2\nA=3\n");
        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(set.get("A").unwrap().value, "3");
        assert_eq!(set.get("A").unwrap().line, 3);
        assert_eq!(
            set.warnings(),
            &[ParseWarning::DuplicateKey {
                line: 3,
                key: "A".into(),
                previous_line: 1
            }]
        );
    }

    #[test]
    fn crlf_line_endings() {
        let set = parse("A=1\r\n# note\r\nB=\"two\"\r\n");
        assert_eq!(set.get("A").unwrap().value, "1");
        let b = set.get("B").unwrap();
        assert_eq!(b.value, "two");
        assert_eq!(b.comment.as_deref(), Some("note"));
    }

    #[test]
    fn line_at_limit_parses_and_one_over_is_skipped() {
        let limits = Limits {
            max_line_chars: 12,
            ..Limits::default()
        };
        let at = format!("AT={}", "x".repeat(9));
        let over = format!("OVER={}", "x".repeat(8));
        let text = format!("BEFORE=1\n{at}\n{over}\nAFTER=2\n");

        let set = parse_with(&text, &limits);
        assert!(set.contains_key("BEFORE"));
        assert!(set.contains_key("AT"));
        assert!(!set.contains_key("OVER"));
        assert!(set.contains_key("AFTER"));
        assert_eq!(
            set.warnings(),
            &[ParseWarning::LineTooLong {
                line: 3,
                length: 13,
                limit: 12
            }]
        );
    }

    #[test]
    fn sample_fixture_parses() {
        let set = parse(SAMPLE_ENV);
        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(
            keys,
            vec!["APP_NAME", "PORT", "DATABASE_URL", "API_KEY", "DEBUG"]
        );
        assert_eq!(set.raw(), SAMPLE_ENV);
        assert_eq!(set.lines().len(), SAMPLE_ENV.lines().count());
    }

    #[test]
    fn record_lines_are_one_based() {
        let set = parse("\n\nA=1");
        assert_eq!(set.get("A").unwrap().line, 3);
    }

    // --- read_from_disk ---

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let outcome = read_from_disk(".env", dir.path(), &Limits::default(), false);
        assert_eq!(outcome, ReadOutcome::NotFound);
    }

    #[test]
    fn read_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1\n").unwrap();
        let outcome = read_from_disk(".env", dir.path(), &Limits::default(), false);
        assert_eq!(outcome.found().unwrap().get("A").unwrap().value, "1");
    }

    #[test]
    fn read_traversal_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let outcome = read_from_disk("../.env", dir.path(), &Limits::default(), false);
        assert!(matches!(outcome, ReadOutcome::ReadError(_)));
    }

    #[test]
    fn read_oversized_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1234567890\n").unwrap();
        let limits = Limits {
            max_file_bytes: 4,
            ..Limits::default()
        };
        match read_from_disk(".env", dir.path(), &limits, false) {
            ReadOutcome::ReadError(msg) => assert!(msg.contains("too large")),
            other => panic!("Expected ReadError, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn read_directory_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".env")).unwrap();
        let outcome = read_from_disk(".env", dir.path(), &Limits::default(), false);
        assert!(matches!(outcome, ReadOutcome::ReadError(_)));
    }

    proptest! {
        #[test]
        fn parsed_keys_always_valid(text in "[ -~\t\r\n]{0,400}") {
            let set = parse(&text);
            for key in set.keys() {
                prop_assert!(guard::validate_variable_name(key));
            }
        }

        #[test]
        fn parsed_lines_of_pairs_roundtrip(
            key in "[A-Z_][A-Z0-9_]{0,12}",
            value in "[a-z0-9:/._-]{0,20}",
        ) {
            prop_assume!(guard::validate_variable_name(&key));
            let set = parse(&format!("{key}={value}\n"));
            prop_assert_eq!(&set.get(&key).unwrap().value, &value);
        }
    }
}
