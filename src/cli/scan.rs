// src/cli/scan.rs
//! Free-form option parsing for `scan`
//!
//! `./scan --since=2012-03-04 --debug whatever.com` reads as
//! `{"since": "2012-03-04", "debug": true, "_": ["whatever.com"]}`.

use super::UsageError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Reserved bag key holding the positional arguments
pub const POSITIONAL_KEY: &str = "_";

pub(super) const DEFAULT_OUTPUT: &str = "./";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

/// Flat key/value view of the command line
pub type OptionBag = BTreeMap<String, OptionValue>;

/// Read `--key=value` / `--flag` options and positional arguments.
///
/// `args` excludes the program name. Keys are lowercased, a bare flag means
/// `"True"`, and `true`/`false` in any case become booleans.
pub fn parse_scan_args<S: AsRef<str>>(args: &[S]) -> OptionBag {
    let mut options = OptionBag::new();
    let mut positional = Vec::new();

    for arg in args.iter().map(|a| a.as_ref()) {
        let Some(flag) = arg.strip_prefix("--") else {
            positional.push(arg.to_string());
            continue;
        };

        let (key, value) = flag.split_once('=').unwrap_or((flag, "True"));

        let value = if value.eq_ignore_ascii_case("true") {
            OptionValue::Bool(true)
        } else if value.eq_ignore_ascii_case("false") {
            OptionValue::Bool(false)
        } else {
            OptionValue::Str(value.to_string())
        };

        options.insert(key.to_lowercase(), value);
    }

    options.insert(POSITIONAL_KEY.to_string(), OptionValue::List(positional));
    options
}

/// Typed options for `scan`
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub debug: bool,
    pub log: Option<String>,
    /// Report root; the cache lives under `<output>/cache`
    pub output: PathBuf,
    /// Optional TOML settings file
    pub config: Option<PathBuf>,
    pub cache: bool,
    pub sort: bool,
    pub suffix: Option<String>,
    /// Scanners to run, from `--scan=a,b,c`
    pub scan: Vec<String>,
    /// Subprocess timeout in seconds
    pub timeout: Option<u64>,
    /// Resolve each domain's registrable base domain
    pub base_domains: bool,
    pub positional: Vec<String>,
    /// Flags with no field of their own
    pub extra: OptionBag,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            debug: false,
            log: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            config: None,
            cache: false,
            sort: false,
            suffix: None,
            scan: Vec::new(),
            timeout: None,
            base_domains: false,
            positional: Vec::new(),
            extra: OptionBag::new(),
        }
    }
}

impl ScanOptions {
    /// Move recognized keys out of the bag into typed fields
    pub fn from_bag(mut bag: OptionBag) -> Result<Self, UsageError> {
        let scan = take_str(&mut bag, "scan")?
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let timeout = take_str(&mut bag, "timeout")?
            .map(|t| {
                t.parse::<u64>().map_err(|_| UsageError::InvalidValue {
                    key: "timeout".to_string(),
                    expected: "a number of seconds",
                    value: t,
                })
            })
            .transpose()?;

        let positional = match bag.remove(POSITIONAL_KEY) {
            Some(OptionValue::List(items)) => items,
            Some(OptionValue::Str(item)) => vec![item],
            Some(OptionValue::Bool(_)) | None => Vec::new(),
        };

        Ok(Self {
            debug: take_bool(&mut bag, "debug")?,
            log: take_str(&mut bag, "log")?,
            output: take_str(&mut bag, "output")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            config: take_str(&mut bag, "config")?.map(PathBuf::from),
            cache: take_bool(&mut bag, "cache")?,
            sort: take_bool(&mut bag, "sort")?,
            suffix: take_str(&mut bag, "suffix")?,
            scan,
            timeout,
            base_domains: take_bool(&mut bag, "base-domains")?,
            positional,
            extra: bag,
        })
    }
}

fn take_bool(bag: &mut OptionBag, key: &str) -> Result<bool, UsageError> {
    match bag.remove(key) {
        None => Ok(false),
        Some(OptionValue::Bool(b)) => Ok(b),
        Some(OptionValue::Str(value)) => Err(UsageError::InvalidValue {
            key: key.to_string(),
            expected: "true or false",
            value,
        }),
        Some(OptionValue::List(values)) => Err(UsageError::InvalidValue {
            key: key.to_string(),
            expected: "true or false",
            value: values.join(","),
        }),
    }
}

fn take_str(bag: &mut OptionBag, key: &str) -> Result<Option<String>, UsageError> {
    match bag.remove(key) {
        None => Ok(None),
        Some(OptionValue::Str(value)) => Ok(Some(value)),
        Some(OptionValue::List(values)) => Ok(values.into_iter().next()),
        Some(OptionValue::Bool(b)) => Err(UsageError::InvalidValue {
            key: key.to_string(),
            expected: "a value (--key=value)",
            value: b.to_string(),
        }),
    }
}
