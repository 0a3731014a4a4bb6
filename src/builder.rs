//! Functions and types used for building a [`LookupTable`] from a delimited text source.
//!
//! Each line of the source holds one record: a key and a value separated by a single
//! delimiter character. There is no header, quoting or escaping, and fields past the
//! second are ignored.

use std::borrow::Cow;
use std::io::{BufRead, BufReader, Read};
use std::str::Split;

use serde::{Deserialize, Serialize};

use crate::{Error, LookupSource, LookupTable, Result};

/// Field separator used when none is configured.
pub const DEFAULT_DELIMITER: char = ',';

/// Locator reported in errors for streams handed to [`TableBuilder::load`] directly.
const ANONYMOUS_STREAM: &str = "<stream>";

/// What to do with a line that does not hold both a key and a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Log the line and keep loading.
    #[default]
    Skip,
    /// Fail the whole load with [`Error::MalformedLine`].
    Abort,
}

#[derive(Debug, Default)]
struct LoadStats {
    /// Lines read from the source.
    lines: usize,

    /// Malformed lines that were skipped.
    skipped: usize,

    /// Records whose key overwrote an earlier record.
    duplicates: usize,

    /// Chunks holding invalid UTF-8.
    lossy: usize,
}

impl LoadStats {
    #[inline]
    fn record_line(&mut self) {
        self.lines += 1;
    }

    #[inline]
    fn record_skip(&mut self) {
        self.skipped += 1;
    }

    #[inline]
    fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    #[inline]
    fn record_lossy(&mut self) {
        self.lossy += 1;
    }
}

/// Parses a line-oriented text source into a [`LookupTable`].
///
/// The build is all-or-nothing: records accumulate in a fresh table that is only returned
/// once the whole source has been read.
///
/// ```
/// use longest_prefix::{MalformedLinePolicy, TableBuilder};
///
/// let table = TableBuilder::new()
///     .delimiter('|')
///     .malformed_lines(MalformedLinePolicy::Abort)
///     .load("44|UK\n4420|LONDON\n".as_bytes())
///     .unwrap();
///
/// assert_eq!(table.longest_prefix("442071234567"), Some("LONDON"));
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    delimiter: char,
    malformed_lines: MalformedLinePolicy,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            malformed_lines: MalformedLinePolicy::default(),
        }
    }
}

impl TableBuilder {
    /// Builder splitting on [`DEFAULT_DELIMITER`] and skipping malformed lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split records on `delimiter` instead of a comma.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Choose how lines without a value field are handled.
    pub fn malformed_lines(mut self, policy: MalformedLinePolicy) -> Self {
        self.malformed_lines = policy;
        self
    }

    /// Build a table from an already opened byte stream.
    ///
    /// The stream is decoded as UTF-8, with invalid sequences replaced by U+FFFD. Fails with
    /// [`Error::Read`] if the stream cannot be read to completion.
    pub fn load(&self, reader: impl Read) -> Result<LookupTable> {
        self.load_named(reader, ANONYMOUS_STREAM)
    }

    /// Open `locator` through `source` and build a table from it.
    ///
    /// Fails with [`Error::Open`] if the source cannot open the locator.
    pub fn load_from<S>(&self, source: &S, locator: &str) -> Result<LookupTable>
    where
        S: LookupSource + ?Sized,
    {
        let reader = source.open(locator).map_err(|source| Error::Open {
            locator: locator.to_string(),
            source,
        })?;

        self.load_named(reader, locator)
    }

    fn load_named(&self, reader: impl Read, locator: &str) -> Result<LookupTable> {
        let mut reader = BufReader::new(reader);
        let mut table = LookupTable::new();
        let mut stats = LoadStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|source| Error::Read {
                locator: locator.to_string(),
                line: stats.lines + 1,
                source,
            })?;
            if read == 0 {
                break;
            }

            // Undecodable bytes become U+FFFD instead of failing the load.
            let chunk = String::from_utf8_lossy(&buf);
            if matches!(chunk, Cow::Owned(_)) {
                tracing::warn!(
                    locator,
                    line = stats.lines + 1,
                    "replaced invalid UTF-8 in lookup record"
                );
                stats.record_lossy();
            }

            for line in split_lines(&chunk) {
                stats.record_line();
                self.insert_record(&mut table, &mut stats, line, locator)?;
            }
        }

        tracing::info!(
            locator,
            entries = table.len(),
            lines = stats.lines,
            skipped = stats.skipped,
            duplicates = stats.duplicates,
            lossy = stats.lossy,
            "lookup table loaded"
        );

        Ok(table)
    }

    fn insert_record(
        &self,
        table: &mut LookupTable,
        stats: &mut LoadStats,
        line: &str,
        locator: &str,
    ) -> Result<()> {
        let Some((key, value)) = split_record(line, self.delimiter) else {
            return match self.malformed_lines {
                MalformedLinePolicy::Skip => {
                    tracing::warn!(
                        locator,
                        line = stats.lines,
                        "skipping malformed lookup record"
                    );
                    stats.record_skip();
                    Ok(())
                }
                MalformedLinePolicy::Abort => Err(Error::MalformedLine {
                    locator: locator.to_string(),
                    line: stats.lines,
                    content: line.to_string(),
                }),
            };
        };

        if table.insert(key.to_string(), value.to_string()).is_some() {
            stats.record_duplicate();
        }
        Ok(())
    }
}

/// Split a chunk read up to and including `\n` into lines.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`, so a chunk can hold several `\r`-terminated
/// lines. The terminators are not part of the lines.
fn split_lines(chunk: &str) -> Split<'_, char> {
    let chunk = chunk.strip_suffix('\n').unwrap_or(chunk);
    let chunk = chunk.strip_suffix('\r').unwrap_or(chunk);
    chunk.split('\r')
}

/// Split a record into its key and value fields.
///
/// Trailing empty fields do not count, so `"a,"` and `""` have no value and are rejected,
/// while `"a,,b"` maps `a` to the empty string.
fn split_record(line: &str, delimiter: char) -> Option<(&str, &str)> {
    let mut fields = line.split(delimiter);
    let key = fields.next()?;
    let value = fields.next()?;

    if value.is_empty() && fields.all(str::is_empty) {
        return None;
    }

    Some((key, value))
}

#[cfg(test)]
mod test {
    use std::io::{self, Read};

    use crate::builder::{split_lines, split_record};
    use crate::{Error, MalformedLinePolicy, MemorySource, TableBuilder};

    /// Yields `data`, then fails every following read.
    struct FailingReader {
        data: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_split_record() {
        assert_eq!(split_record("123,CODE_A", ','), Some(("123", "CODE_A")));
        assert_eq!(split_record("123,CODE_A,extra", ','), Some(("123", "CODE_A")));
        assert_eq!(split_record("a,,b", ','), Some(("a", "")));
        assert_eq!(split_record(",b", ','), Some(("", "b")));
        assert_eq!(split_record("a", ','), None);
        assert_eq!(split_record("a,", ','), None);
        assert_eq!(split_record("a,,", ','), None);
        assert_eq!(split_record("", ','), None);
        assert_eq!(split_record("a\tb", '\t'), Some(("a", "b")));
    }

    #[test]
    fn test_load() {
        let table = TableBuilder::new()
            .load("123,CODE_A\n12,CODE_B\n1,CODE_C\n".as_bytes())
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("123"), Some("CODE_A"));
        assert_eq!(table.get("12"), Some("CODE_B"));
        assert_eq!(table.get("1"), Some("CODE_C"));
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let table = TableBuilder::new().load("1,A\r\n2,B".as_bytes()).unwrap();
        assert_eq!(table.get("1"), Some("A"));
        assert_eq!(table.get("2"), Some("B"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let table = TableBuilder::new().load("5,X\n5,Y\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("5"), Some("Y"));
    }

    #[test]
    fn test_skip_malformed() {
        let table = TableBuilder::new()
            .load("1,A\nbroken\n\n2,B\n".as_bytes())
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("broken"), None);
    }

    #[test]
    fn test_abort_on_malformed() {
        let err = TableBuilder::new()
            .malformed_lines(MalformedLinePolicy::Abort)
            .load("1,A\nbroken\n2,B\n".as_bytes())
            .unwrap_err();

        match err {
            Error::MalformedLine {
                locator,
                line,
                content,
            } => {
                assert_eq!(locator, "<stream>");
                assert_eq!(line, 2);
                assert_eq!(content, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_failure_mid_stream() {
        let err = TableBuilder::new()
            .load(FailingReader { data: b"1,A\n" })
            .unwrap_err();

        match err {
            Error::Read { line, source, .. } => {
                assert_eq!(line, 2);
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        // Latin-1 'Ü' is not valid UTF-8.
        let table = TableBuilder::new()
            .load(&b"44,UK\n49,M\xdcNCHEN\n"[..])
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("44"), Some("UK"));
        assert_eq!(table.get("49"), Some("M\u{FFFD}NCHEN"));
        assert_eq!(table.longest_prefix("4989"), Some("M\u{FFFD}NCHEN"));
    }

    #[test]
    fn test_split_lines() {
        let lines = |chunk| split_lines(chunk).collect::<Vec<_>>();
        assert_eq!(lines("1,A\n"), vec!["1,A"]);
        assert_eq!(lines("1,A\r\n"), vec!["1,A"]);
        assert_eq!(lines("1,A"), vec!["1,A"]);
        assert_eq!(lines("1,A\r2,B\r"), vec!["1,A", "2,B"]);
        assert_eq!(lines("1,A\r2,B\r\n"), vec!["1,A", "2,B"]);
        assert_eq!(lines("\n"), vec![""]);
        assert_eq!(lines("\r\r\n"), vec!["", ""]);
    }

    #[test]
    fn test_bare_carriage_returns() {
        let table = TableBuilder::new().load("1,A\r2,B\r".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("1"), Some("A"));
        assert_eq!(table.get("2"), Some("B"));

        // Line numbers count every terminator style.
        let err = TableBuilder::new()
            .malformed_lines(MalformedLinePolicy::Abort)
            .load("1,A\r2,B\r\nbroken\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedLine { line: 3, .. }));
    }

    #[test]
    fn test_load_from_source() {
        let source = MemorySource::new().with_file("codes.csv", "44|UK\n");
        let builder = TableBuilder::new().delimiter('|');

        let table = builder.load_from(&source, "codes.csv").unwrap();
        assert_eq!(table.get("44"), Some("UK"));

        let err = builder.load_from(&source, "missing.csv").unwrap_err();
        assert!(matches!(err, Error::Open { ref locator, .. } if locator == "missing.csv"));
    }
}
