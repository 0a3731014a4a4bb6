//! Error type shared by the loader, the function lifecycle and configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while binding, loading or evaluating the function.
///
/// A subject with no matching prefix is not an error; it resolves to `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// The function was bound or called with the wrong number of arguments.
    #[error(
        "{function} needs {expected} arguments: subject string and lookup source, got {actual}"
    )]
    ArgumentCount {
        /// Name of the function being bound.
        function: &'static str,
        /// Required number of arguments.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// The lookup source could not be opened.
    #[error("failed to open lookup source {locator}: {source}")]
    Open {
        /// Path or URI of the lookup source.
        locator: String,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// The lookup source was opened but could not be read to completion.
    #[error("failed to read lookup source {locator} at line {line}: {source}")]
    Read {
        /// Path or URI of the lookup source.
        locator: String,
        /// 1-based line number being read when the failure happened.
        line: usize,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// A record without a value field, when malformed lines abort the load.
    #[error("malformed record in lookup source {locator} at line {line}: '{content}'")]
    MalformedLine {
        /// Path or URI of the lookup source.
        locator: String,
        /// 1-based line number of the record.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// Evaluation got a null lookup source before any table was loaded.
    #[error("lookup source is null and no lookup table has been loaded")]
    MissingLocator,

    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid TOML for [`LookupConfig`][crate::LookupConfig].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
