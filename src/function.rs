//! The `longest_prefix_str` SQL function.
//!
//! Host engines drive a function through three callbacks: argument validation when the
//! query is planned, evaluation once per row, and rendering for plan explanation.
//! [`ScalarFunction`] captures exactly those, so nothing in this crate depends on how a
//! particular engine registers or invokes user-defined functions.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::{
    Error, FileSystemSource, LookupConfig, LookupSource, LookupTable, Result, TableBuilder,
};

/// Name the function is registered under.
pub const FUNCTION_NAME: &str = "longest_prefix_str";

/// Usage text shown by the host's function help.
pub const FUNCTION_DESCRIPTION: &str =
    "_FUNC_(s, lookupfile) - Returns the longest prefix of s found in the lookup table";

const ARG_COUNT: usize = 2;

/// A scalar SQL function over nullable string arguments.
pub trait ScalarFunction {
    /// Registered function name.
    fn name(&self) -> &'static str;

    /// Validate the call shape before any row is processed.
    fn initialize(&self, arg_count: usize) -> Result<()>;

    /// Evaluate one row. `None` arguments and results are SQL NULL.
    fn evaluate(&self, args: &[Option<&str>]) -> Result<Option<String>>;

    /// Render the call for plan explanation, given the rendered argument expressions.
    fn display_string(&self, children: &[&str]) -> String;
}

/// Whether a function instance replaces its table when rows name a different source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Load the new source and replace the cached table.
    #[default]
    ReloadOnChange,
    /// Keep the first table loaded for the lifetime of the instance.
    FirstLoaded,
}

#[derive(Debug)]
struct CachedTable {
    locator: String,
    table: LookupTable,
}

/// `longest_prefix_str(subject, lookup_source)`: value of the longest prefix of `subject`
/// that is a key in the table loaded from `lookup_source`.
///
/// The table is loaded lazily on the first evaluated row and cached in the instance. The
/// cache slot is swapped atomically, so an instance shared between threads only ever
/// observes no table or a complete one.
///
/// ```
/// use longest_prefix::{LongestPrefixStr, MemorySource, ScalarFunction};
///
/// let source = MemorySource::new().with_file("codes.csv", "123,CODE_A\n12,CODE_B\n");
/// let function = LongestPrefixStr::new(source);
///
/// function.initialize(2).unwrap();
/// let value = function.evaluate(&[Some("12345"), Some("codes.csv")]).unwrap();
/// assert_eq!(value.as_deref(), Some("CODE_A"));
/// ```
pub struct LongestPrefixStr<S = FileSystemSource> {
    source: S,
    builder: TableBuilder,
    reload: ReloadPolicy,
    cache: ArcSwapOption<CachedTable>,
}

impl Default for LongestPrefixStr {
    fn default() -> Self {
        Self::new(FileSystemSource)
    }
}

impl<S: LookupSource> LongestPrefixStr<S> {
    /// Function reading lookup files through `source` with default settings.
    pub fn new(source: S) -> Self {
        Self::with_config(source, &LookupConfig::default())
    }

    /// Function reading lookup files through `source` with the given settings.
    pub fn with_config(source: S, config: &LookupConfig) -> Self {
        Self {
            source,
            builder: config.table_builder(),
            reload: config.reload,
            cache: ArcSwapOption::empty(),
        }
    }

    /// Locator of the currently cached table, if one has been loaded.
    pub fn loaded_locator(&self) -> Option<String> {
        self.cache.load_full().map(|cached| cached.locator.clone())
    }

    /// Resolve one subject against the table for `locator`, loading it if needed.
    ///
    /// A `None` subject never matches and does not trigger a load.
    pub fn resolve(&self, subject: Option<&str>, locator: Option<&str>) -> Result<Option<String>> {
        let Some(subject) = subject else {
            return Ok(None);
        };

        let cached = self.table_for(locator)?;
        Ok(cached.table.longest_prefix(subject).map(str::to_string))
    }

    fn table_for(&self, locator: Option<&str>) -> Result<Arc<CachedTable>> {
        let current = self.cache.load_full();

        let locator = match (&current, locator) {
            (Some(cached), None) => return Ok(Arc::clone(cached)),
            (Some(cached), Some(locator))
                if cached.locator == locator || self.reload == ReloadPolicy::FirstLoaded =>
            {
                return Ok(Arc::clone(cached));
            }
            (None, None) => return Err(Error::MissingLocator),
            (_, Some(locator)) => locator,
        };

        if let Some(previous) = &current {
            tracing::info!(
                previous = %previous.locator,
                locator,
                "lookup source changed, reloading"
            );
        }
        let table = self.builder.load_from(&self.source, locator)?;
        let cached = Arc::new(CachedTable {
            locator: locator.to_string(),
            table,
        });

        match self.reload {
            ReloadPolicy::ReloadOnChange => self.cache.store(Some(Arc::clone(&cached))),
            ReloadPolicy::FirstLoaded => {
                // Only install over the empty slot. A concurrent first load that got there
                // earlier is kept.
                let previous = self
                    .cache
                    .compare_and_swap(&current, Some(Arc::clone(&cached)));
                if let Some(winner) = &*previous {
                    tracing::debug!(
                        kept = %winner.locator,
                        discarded = locator,
                        "concurrent first load lost"
                    );
                    return Ok(Arc::clone(winner));
                }
            }
        }

        Ok(cached)
    }
}

impl<S: LookupSource> ScalarFunction for LongestPrefixStr<S> {
    fn name(&self) -> &'static str {
        FUNCTION_NAME
    }

    fn initialize(&self, arg_count: usize) -> Result<()> {
        check_arg_count(arg_count)
    }

    fn evaluate(&self, args: &[Option<&str>]) -> Result<Option<String>> {
        check_arg_count(args.len())?;
        self.resolve(args[0], args[1])
    }

    fn display_string(&self, children: &[&str]) -> String {
        format!("Method call: {FUNCTION_NAME}({})", children.join(", "))
    }
}

fn check_arg_count(actual: usize) -> Result<()> {
    if actual != ARG_COUNT {
        return Err(Error::ArgumentCount {
            function: FUNCTION_NAME,
            expected: ARG_COUNT,
            actual,
        });
    }
    Ok(())
}
