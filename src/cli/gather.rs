// src/cli/gather.rs
//! Schema-driven option parsing for `gather`
//!
//! `gather dap,dotgov --dap=<url> --dotgov=<url> --suffix=.gov`
//!
//! Every gatherer named in the first argument becomes a required flag
//! taking one value, next to a fixed set of optional flags.

use super::{OptionBag, UsageError};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;

/// Gatherers that take no source flag of their own
const SET_SERVICES: &[&str] = &["censys"];

const SWITCHES: &[&str] = &["cache", "debug", "ignore-www", "include-parents", "sort"];
const MULTI_VALUED: &[&str] = &["log", "parents", "rdns", "suffix", "timeout"];
const POSITIONAL_ID: &str = "_";
/// Flags clap declares on its own
const BUILTIN_FLAGS: &[&str] = &["help"];

/// Typed options for `gather`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatherOptions {
    /// Gatherers to run, in the order given
    pub gatherers: Vec<String>,
    /// Source value for each gatherer that takes one
    pub sources: BTreeMap<String, String>,
    pub suffix: String,
    pub parents: Option<String>,
    pub cache: bool,
    pub debug: bool,
    pub ignore_www: bool,
    pub include_parents: bool,
    pub sort: bool,
    pub log: Option<String>,
    pub rdns: Vec<String>,
    pub timeout: Option<u64>,
    /// Remaining positional arguments, including the gatherer list
    pub positional: Vec<String>,
    /// Caller-supplied extras, see `runner::run`
    pub extra: OptionBag,
}

/// Value parser accepting only values that end in `end`
pub fn value_ends_with(
    end: &'static str,
) -> impl Fn(&str) -> Result<String, String> + Clone + Send + Sync + 'static {
    move |arg: &str| {
        if arg.ends_with(end) {
            Ok(arg.to_string())
        } else {
            Err(format!("value must end in '{}'", end))
        }
    }
}

/// Build the `gather` command line schema for the given services
pub fn build_gather_command(services: &[String]) -> Command {
    let mut cmd = Command::new("gather").about("Gather domains from the named sources");

    for service in services {
        cmd = cmd.arg(
            Arg::new(service.clone())
                .long(service.clone())
                .num_args(1)
                .required(true),
        );
    }

    for switch in SWITCHES {
        cmd = cmd.arg(Arg::new(*switch).long(*switch).action(ArgAction::SetTrue));
    }

    cmd.arg(Arg::new("log").long("log").num_args(1..))
        .arg(
            Arg::new("parents")
                .long("parents")
                .num_args(1..)
                .value_parser(value_ends_with(".csv")),
        )
        .arg(Arg::new("rdns").long("rdns").num_args(1..))
        .arg(Arg::new("suffix").long("suffix").num_args(1..).required(true))
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .num_args(1..)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(Arg::new(POSITIONAL_ID).num_args(0..).action(ArgAction::Append))
}

fn first_string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_many::<String>(id).and_then(|mut v| v.next().cloned())
}

/// Parse a full `gather` command line (`argv[0]` included).
pub fn parse_gather_args<S: AsRef<str>>(argv: &[S]) -> Result<GatherOptions, UsageError> {
    let list = match argv.get(1).map(|a| a.as_ref()) {
        Some(list) if !list.starts_with('-') => list,
        _ => return Err(UsageError::MissingGatherers),
    };

    // repeats collapse onto their first mention
    let mut gatherers: Vec<String> = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !gatherers.iter().any(|g| g == name) {
            gatherers.push(name.to_string());
        }
    }

    let services: Vec<String> = gatherers
        .iter()
        .filter(|g| !SET_SERVICES.contains(&g.as_str()))
        .cloned()
        .collect();

    if let Some(reserved) = services.iter().find(|s| {
        SWITCHES.contains(&s.as_str())
            || MULTI_VALUED.contains(&s.as_str())
            || BUILTIN_FLAGS.contains(&s.as_str())
            || *s == POSITIONAL_ID
    }) {
        return Err(UsageError::ReservedGatherer(reserved.clone()));
    }

    let matches = build_gather_command(&services)
        .try_get_matches_from(argv.iter().map(|a| a.as_ref().to_string()))?;

    let positional: Vec<String> = matches
        .get_many::<String>(POSITIONAL_ID)
        .map(|v| v.cloned().collect())
        .unwrap_or_default();

    if let Some(flag) = positional.iter().find(|p| p.starts_with("--")) {
        return Err(UsageError::UnknownArgument(flag.clone()));
    }

    // nargs-style flags whose intended cardinality is one
    let sources = services
        .iter()
        .filter_map(|s| first_string(&matches, s).map(|v| (s.clone(), v)))
        .collect();

    let suffix = first_string(&matches, "suffix").unwrap_or_default();

    Ok(GatherOptions {
        gatherers,
        sources,
        suffix,
        parents: first_string(&matches, "parents"),
        cache: matches.get_flag("cache"),
        debug: matches.get_flag("debug"),
        ignore_www: matches.get_flag("ignore-www"),
        include_parents: matches.get_flag("include-parents"),
        sort: matches.get_flag("sort"),
        log: first_string(&matches, "log"),
        rdns: matches
            .get_many::<String>("rdns")
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
        timeout: matches
            .get_many::<u64>("timeout")
            .and_then(|mut v| v.next().copied()),
        positional,
        extra: OptionBag::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_gather() {
        let opts = parse_gather_args(&[
            "gather",
            "dap,censys",
            "--dap=https://analytics.usa.gov/data/live/sites.csv",
            "--suffix=.gov",
            "--parents=parents.csv",
            "--ignore-www",
            "--timeout",
            "30",
            "60",
        ])
        .unwrap();

        assert_eq!(opts.gatherers, vec!["dap", "censys"]);
        assert_eq!(
            opts.sources.get("dap").map(String::as_str),
            Some("https://analytics.usa.gov/data/live/sites.csv")
        );
        assert!(!opts.sources.contains_key("censys"));
        assert_eq!(opts.suffix, ".gov");
        assert_eq!(opts.parents.as_deref(), Some("parents.csv"));
        assert!(opts.ignore_www);
        assert!(!opts.debug);
        assert_eq!(opts.timeout, Some(30));
        assert_eq!(opts.positional, vec!["dap,censys"]);
    }

    #[test]
    fn test_missing_service_flag() {
        let err = parse_gather_args(&["gather", "dap", "--suffix=.gov"]).unwrap_err();
        match err {
            UsageError::Clap(e) => assert_eq!(e.kind(), ErrorKind::MissingRequiredArgument),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_suffix() {
        let err = parse_gather_args(&["gather", "dap", "--dap=x"]).unwrap_err();
        assert!(matches!(err, UsageError::Clap(ref e) if e.kind() == ErrorKind::MissingRequiredArgument));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = parse_gather_args(&["gather", "dap", "--dap=x", "--suffix=.gov", "--bogus"])
            .unwrap_err();
        assert!(matches!(err, UsageError::Clap(ref e) if e.kind() == ErrorKind::UnknownArgument));
    }

    #[test]
    fn test_flag_after_separator_rejected() {
        let err = parse_gather_args(&["gather", "dap", "--dap=x", "--suffix=.gov", "--", "--bogus"])
            .unwrap_err();
        assert!(matches!(err, UsageError::UnknownArgument(ref f) if f == "--bogus"));
        assert_eq!(err.to_string(), "--bogus isn't a valid argument here.");
    }

    #[test]
    fn test_parents_must_be_csv() {
        let err = parse_gather_args(&[
            "gather",
            "censys",
            "--suffix=.gov",
            "--parents=parents.txt",
        ])
        .unwrap_err();
        assert!(matches!(err, UsageError::Clap(ref e) if e.kind() == ErrorKind::ValueValidation));
    }

    #[test]
    fn test_missing_gatherers() {
        let err = parse_gather_args(&["gather", "--suffix=.gov"]).unwrap_err();
        assert!(matches!(err, UsageError::MissingGatherers));
    }

    #[test]
    fn test_reserved_gatherer_name() {
        let err = parse_gather_args(&["gather", "suffix", "--suffix=.gov"]).unwrap_err();
        assert!(matches!(err, UsageError::ReservedGatherer(ref s) if s == "suffix"));
    }

    #[test]
    fn test_repeated_gatherer_collapses() {
        let opts = parse_gather_args(&["gather", "dap,dotgov,dap", "--dap=x", "--dotgov=y", "--suffix=.gov"])
            .unwrap();
        assert_eq!(opts.gatherers, vec!["dap", "dotgov"]);
        assert_eq!(opts.sources.get("dap").map(String::as_str), Some("x"));
        assert_eq!(opts.sources.len(), 2);
    }

    #[test]
    fn test_help_is_not_a_gatherer() {
        let err = parse_gather_args(&["gather", "help", "--help=x", "--suffix=.gov"]).unwrap_err();
        assert!(matches!(err, UsageError::ReservedGatherer(ref s) if s == "help"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_set_service_needs_no_flag() {
        let opts = parse_gather_args(&["gather", "censys", "--suffix=.gov,.mil", "--debug"]).unwrap();
        assert!(opts.sources.is_empty());
        assert_eq!(opts.suffix, ".gov,.mil");
        assert!(opts.debug);
    }
}
