// src/cli/mod.rs
//! Command-line options for the `gather` and `scan` programs
//!
//! `scan` takes free-form `--key=value` flags; `gather` is parsed against a
//! schema built from the gatherers it was asked to run. Which parser runs is
//! decided by the program name.

mod gather;
mod scan;

pub use gather::{build_gather_command, parse_gather_args, value_ends_with, GatherOptions};
pub use scan::{parse_scan_args, OptionBag, OptionValue, ScanOptions, POSITIONAL_KEY};

use std::path::{Path, PathBuf};

/// Errors in how a program was invoked
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error("{0} isn't a valid argument here.")]
    UnknownArgument(String),

    #[error("gather needs a comma-separated list of gatherers as its first argument")]
    MissingGatherers,

    #[error("'{0}' can't be used as a gatherer name: it is already a flag")]
    ReservedGatherer(String),

    #[error("Invalid log level '{0}' (specify: debug, info, warn, error).")]
    InvalidLogLevel(String),

    #[error("--{key} expects {expected}, got {value:?}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: String,
    },

    #[error("don't know how to parse options for '{0}' (expected gather or scan)")]
    UnknownCommand(String),
}

impl UsageError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            UsageError::Clap(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Parsed options for whichever program is running
#[derive(Debug, Clone, PartialEq)]
pub enum Options {
    Gather(GatherOptions),
    Scan(ScanOptions),
}

impl Options {
    /// Pick a parser from the program name in `argv[0]` and run it
    pub fn from_args<I, T>(argv: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::from_args_with(argv, OptionBag::new())
    }

    /// Like [`Options::from_args`], with caller-supplied options layered on
    /// top. For `scan` they override parsed flags before typing; for
    /// `gather` they land in `extra`.
    pub fn from_args_with<I, T>(argv: I, additional: OptionBag) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let program = argv.first().cloned().unwrap_or_default();

        if program.ends_with("gather") {
            let mut opts = parse_gather_args(&argv)?;
            opts.extra.extend(additional);
            Ok(Options::Gather(opts))
        } else if program.ends_with("scan") {
            let mut bag = parse_scan_args(&argv[1..]);
            bag.extend(additional);
            Ok(Options::Scan(ScanOptions::from_bag(bag)?))
        } else {
            Err(UsageError::UnknownCommand(program))
        }
    }

    pub fn debug(&self) -> bool {
        match self {
            Options::Gather(o) => o.debug,
            Options::Scan(o) => o.debug,
        }
    }

    pub fn log(&self) -> Option<&str> {
        match self {
            Options::Gather(o) => o.log.as_deref(),
            Options::Scan(o) => o.log.as_deref(),
        }
    }

    /// Report root; gather always reports into the working directory
    pub fn output_dir(&self) -> PathBuf {
        match self {
            Options::Gather(_) => PathBuf::from(scan::DEFAULT_OUTPUT),
            Options::Scan(o) => o.output.clone(),
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Options::Gather(_) => None,
            Options::Scan(o) => o.config.as_deref(),
        }
    }

    pub fn timeout(&self) -> Option<u64> {
        match self {
            Options::Gather(o) => o.timeout,
            Options::Scan(o) => o.timeout,
        }
    }
}
