//! `.env` line parsing
//!
//! Turns raw lines from a [`LineSource`] into [`RawEntry`] key/value pairs.
//! Blank lines, `#` comment lines and lines without `=` are skipped; they
//! are never errors. Only failing to open the source ([`EnvError::Io`]) or a
//! failure while reading it ([`EnvError::Read`]) is reported.

use crate::error::{EnvError, Result};
use crate::source::{LineSource, Lines};

/// One parsed `KEY=VALUE` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub value: String,
    /// 1-based physical line number in the source
    pub line: usize,
}

impl RawEntry {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V, line: usize) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            line,
        }
    }
}

/// Parser behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Strip `# ...` trailing comments from unquoted values
    pub inline_comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            inline_comments: true,
        }
    }
}

/// Stateless `.env` line parser
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser {
    options: ParseOptions,
}

impl LineParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Open `source` from the start and lazily parse its lines.
    ///
    /// Fails with [`EnvError::Io`] when the source cannot be opened. Each
    /// yielded item is either an entry or an [`EnvError::Read`]; the stream
    /// ends after the first read error.
    pub fn entries<'a>(&self, source: &'a dyn LineSource) -> Result<Entries<'a>> {
        let name = source.name();
        let lines = source
            .open()
            .map_err(|e| EnvError::io(format!("unable to open .env file {}: {}", name, e)))?;

        Ok(Entries {
            parser: *self,
            name,
            lines,
            line_no: 0,
            skipped: 0,
            failed: false,
        })
    }

    /// Parse every entry of `source`, stopping at the first read error
    pub fn parse_all(&self, source: &dyn LineSource) -> Result<Vec<RawEntry>> {
        self.entries(source)?.collect()
    }

    /// Parse one physical line. `None` means the line carries no entry.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Option<RawEntry> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (key, value) = trimmed.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some(RawEntry::new(key, self.parse_value(value), line_no))
    }

    /// Normalise the text to the right of the first `=`
    pub fn parse_value(&self, raw: &str) -> String {
        let value = raw.trim();

        if let Some(quoted) = self.closed_quote(value) {
            return quoted.to_string();
        }

        let value = if self.options.inline_comments {
            strip_inline_comment(value)
        } else {
            value
        };

        strip_matching_quotes(value).to_string()
    }

    /// Text between a leading quote and its matching close quote, when only
    /// whitespace or (if enabled) a comment follows the close quote
    fn closed_quote<'v>(&self, value: &'v str) -> Option<&'v str> {
        let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = &value[1..];
        let close = inner.find(quote)?;
        let rest = inner[close + 1..].trim_start();

        let trailing_ok =
            rest.is_empty() || (self.options.inline_comments && rest.starts_with('#'));
        trailing_ok.then(|| &inner[..close])
    }
}

/// Drop everything from an unquoted `#` that starts the value or follows
/// whitespace. A `#` glued to other text (`http://h/#frag`) is kept.
fn strip_inline_comment(value: &str) -> &str {
    let mut previous: Option<char> = None;
    for (idx, c) in value.char_indices() {
        if c == '#' && previous.map_or(true, char::is_whitespace) {
            return value[..idx].trim_end();
        }
        previous = Some(c);
    }
    value
}

fn strip_matching_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Lazy entry stream returned by [`LineParser::entries`]
pub struct Entries<'a> {
    parser: LineParser,
    name: String,
    lines: Lines<'a>,
    line_no: usize,
    skipped: usize,
    failed: bool,
}

impl Entries<'_> {
    /// Lines consumed so far that produced no entry
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(EnvError::read(format!(
                        "error reading .env file {} at line {}: {}",
                        self.name,
                        self.line_no + 1,
                        e
                    ))));
                }
            };
            self.line_no += 1;

            match self.parser.parse_line(&line, self.line_no) {
                Some(entry) => return Some(Ok(entry)),
                None => self.skipped += 1,
            }
        }
    }
}
