#![doc = include_str!("../README.md")]

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

mod builder;
mod config;
mod error;
mod function;
mod source;

pub use builder::{MalformedLinePolicy, TableBuilder, DEFAULT_DELIMITER};
pub use config::{load_config, LookupConfig};
pub use error::{Error, Result};
pub use function::{
    LongestPrefixStr, ReloadPolicy, ScalarFunction, FUNCTION_DESCRIPTION, FUNCTION_NAME,
};
pub use source::{FileSystemSource, LookupSource, MemorySource};

/// Exact-match table of lookup keys to their values.
///
/// A `LookupTable` is built once by a [`TableBuilder`] and never mutated afterwards. Keys are
/// unique: when a source holds the same key more than once, the last value wins.
///
/// Example usage:
///
/// ```
/// use longest_prefix::LookupTable;
///
/// let table: LookupTable = [("123", "CODE_A"), ("12", "CODE_B")].into_iter().collect();
///
/// assert_eq!(table.longest_prefix("12345"), Some("CODE_A"));
/// assert_eq!(table.longest_prefix("129"), Some("CODE_B"));
/// assert_eq!(table.longest_prefix("9"), None);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, returning the value it replaced.
    pub(crate) fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.entries.insert(key, value)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact-match lookup of a single key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate all `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Find the value of the longest prefix of `subject` that is a key in the table.
    ///
    /// Candidates are the subject itself followed by every shorter prefix, produced by
    /// dropping one character at a time from the right. The first candidate present in the
    /// table is the longest possible match, so the search stops there. An empty subject
    /// never matches.
    #[inline]
    pub fn longest_prefix(&self, subject: &str) -> Option<&str> {
        self.longest_prefix_entry(subject).map(|(_, value)| value)
    }

    /// Like [`longest_prefix`][Self::longest_prefix], but also returns the matched key.
    ///
    /// The key is a prefix slice of `subject`, the value borrows from the table.
    pub fn longest_prefix_entry<'a, 's>(
        &'a self,
        subject: &'s str,
    ) -> Option<(&'s str, &'a str)> {
        let mut candidate = subject;
        while !candidate.is_empty() {
            if let Some(value) = self.entries.get(candidate) {
                return Some((candidate, value.as_str()));
            }
            candidate = truncate_last_char(candidate);
        }

        None
    }
}

impl Debug for LookupTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Tables can hold millions of entries, only report the size.
        f.debug_struct("LookupTable")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for LookupTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, value) in iter {
            table.insert(key.into(), value.into());
        }
        table
    }
}

/// Drop the last character of `prefix`.
///
/// A character is a Unicode scalar value, so the result is always valid UTF-8. The empty
/// string is returned unchanged.
#[inline]
pub fn truncate_last_char(prefix: &str) -> &str {
    match prefix.char_indices().next_back() {
        Some((last, _)) => &prefix[..last],
        None => prefix,
    }
}
