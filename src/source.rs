//! Opening byte streams for lookup source locators.
//!
//! The host engine owns storage access. [`LookupSource`] is the seam it plugs into, so the
//! loader never needs to know whether a locator names a local file or an object in a
//! distributed store.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use url::Url;

/// Resolves a lookup source locator (a path or URI) to a readable byte stream.
pub trait LookupSource: Send + Sync {
    /// Open the stream for `locator`.
    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Opens plain paths and `file://` URIs on the local filesystem.
///
/// `file://` URIs may name `localhost` as their host and are percent-decoded. Any other URI
/// scheme fails with [`io::ErrorKind::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSource;

impl FileSystemSource {
    fn resolve(locator: &str) -> io::Result<PathBuf> {
        // Anything that does not parse as an absolute URL is a plain path. Windows drive
        // letters parse as one-letter schemes.
        let url = match Url::parse(locator) {
            Ok(url) if url.scheme().len() > 1 => url,
            _ => return Ok(PathBuf::from(locator)),
        };

        match url.scheme() {
            "file" => url.to_file_path().map_err(|()| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{locator}' is not a local file URI"),
                )
            }),
            scheme => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("no filesystem registered for scheme '{scheme}'"),
            )),
        }
    }
}

impl LookupSource for FileSystemSource {
    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(Self::resolve(locator)?)?;
        Ok(Box::new(file))
    }
}

/// Serves lookup files from memory, keyed by their exact locator.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create a source with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the file served for `locator`.
    pub fn insert(&mut self, locator: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(locator.into(), contents.into());
    }

    /// Builder form of [`insert`][Self::insert].
    pub fn with_file(mut self, locator: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(locator, contents);
        self
    }
}

impl LookupSource for MemorySource {
    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        match self.files.get(locator) {
            Some(contents) => Ok(Box::new(Cursor::new(contents.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory file at '{locator}'"),
            )),
        }
    }
}
