//! Resolve subjects against a lookup file from the command line.
//!
//! Prints one `subject<TAB>value` line per subject, with `\N` when no prefix matched.
//! Subjects come from the arguments, or from stdin (one per line) when none are given.

use std::error::Error;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use longest_prefix::{
    load_config, FileSystemSource, LongestPrefixStr, LookupConfig, MalformedLinePolicy,
    ScalarFunction,
};

/// Marker printed for subjects without a matching prefix.
const NULL_MARKER: &str = "\\N";

/// Longest-prefix lookup against a delimited reference file.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path or file:// URI of the lookup file.
    lookup: String,

    /// Subjects to resolve. Read from stdin when omitted.
    subjects: Vec<String>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field delimiter, overriding the config.
    #[arg(long)]
    delimiter: Option<char>,

    /// Fail on malformed lookup records instead of skipping them.
    #[arg(long)]
    strict: bool,
}

/// Entry point.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "longest_prefix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LookupConfig::default(),
    };
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if args.strict {
        config.malformed_lines = MalformedLinePolicy::Abort;
    }
    config.validate()?;

    let function = LongestPrefixStr::with_config(FileSystemSource, &config);
    function.initialize(2)?;

    let mut out = BufWriter::new(io::stdout().lock());
    if args.subjects.is_empty() {
        for subject in io::stdin().lock().lines() {
            let subject = subject?;
            write_result(&mut out, &function, &subject, &args.lookup)?;
        }
    } else {
        for subject in &args.subjects {
            write_result(&mut out, &function, subject, &args.lookup)?;
        }
    }
    out.flush()?;

    Ok(())
}

fn write_result(
    out: &mut impl Write,
    function: &impl ScalarFunction,
    subject: &str,
    lookup: &str,
) -> Result<(), Box<dyn Error>> {
    let value = function.evaluate(&[Some(subject), Some(lookup)])?;
    writeln!(out, "{subject}\t{}", value.as_deref().unwrap_or(NULL_MARKER))?;
    Ok(())
}
