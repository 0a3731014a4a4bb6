//! Function configuration.
//!
//! # Design Decisions
//! - Every field has a default, so an empty file is a valid config
//! - Serde handles syntax, [`LookupConfig::validate`] handles semantics
//! - Config is immutable once handed to a function instance

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::{MalformedLinePolicy, DEFAULT_DELIMITER};
use crate::function::ReloadPolicy;
use crate::{Error, Result, TableBuilder};

/// Settings for loading and caching the lookup table.
///
/// ```toml
/// delimiter = "|"
/// malformed_lines = "abort"
/// reload = "first_loaded"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Character separating key and value in each record.
    pub delimiter: char,

    /// Handling of records without a value field.
    pub malformed_lines: MalformedLinePolicy,

    /// Whether a new lookup source replaces the cached table.
    pub reload: ReloadPolicy,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            malformed_lines: MalformedLinePolicy::default(),
            reload: ReloadPolicy::default(),
        }
    }
}

impl LookupConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every record unparseable.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.delimiter, '\n' | '\r') {
            return Err(Error::InvalidConfig(
                "delimiter cannot be a line terminator".to_string(),
            ));
        }
        Ok(())
    }

    /// Table builder configured from these settings.
    pub fn table_builder(&self) -> TableBuilder {
        TableBuilder::new()
            .delimiter(self.delimiter)
            .malformed_lines(self.malformed_lines)
    }
}

/// Load and validate a config from a TOML file.
pub fn load_config(path: &Path) -> Result<LookupConfig> {
    let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config = LookupConfig::from_toml(&content)?;
    tracing::debug!(path = %path.display(), delimiter = %config.delimiter, "config loaded");

    Ok(config)
}
