// src/domains.rs
//! Domain lists: CSV loading and sorting, suffix matching

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

fn csv_reader(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open domain list {:?}", path))
}

/// Load a domain CSV as whole rows, first cell lowercased.
///
/// Blank rows are skipped, as is a leading header row whose first cell
/// starts with "domain".
pub fn load_domain_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for record in csv_reader(path)?.records() {
        let record = record.with_context(|| format!("Failed to read row from {:?}", path))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();

        match row.first() {
            Some(first) if !first.trim().is_empty() => {}
            _ => continue,
        }

        row[0] = row[0].to_lowercase();

        if rows.is_empty() && row[0].starts_with("domain") {
            continue;
        }

        rows.push(row);
    }

    Ok(rows)
}

/// Load the first column of a domain CSV
pub fn load_domains(path: &Path) -> Result<Vec<String>> {
    Ok(load_domain_rows(path)?
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect())
}

/// Sort a CSV by domain name "in place", through a temporary copy.
///
/// The whole file is held in memory. Rows sharing a domain collapse into
/// one: the last such row is kept.
pub fn sort_csv(path: &Path) -> Result<()> {
    warn!("Sorting {}...", path.display());

    let mut header: Option<Vec<String>> = None;
    let mut rows: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for record in csv_reader(path)?.records() {
        let record = record.with_context(|| format!("Failed to read row from {:?}", path))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();

        let Some(domain) = row.first() else {
            continue;
        };

        if domain.eq_ignore_ascii_case("domain") {
            header = Some(row);
            continue;
        }

        rows.insert(domain.clone(), row);
    }

    let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp_path)
            .with_context(|| format!("Failed to create {:?}", tmp_path))?;

        if let Some(header) = &header {
            writer.write_record(header)?;
        }
        for row in rows.values() {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {:?} with sorted copy", path))?;

    Ok(())
}

/// Normalize a user-given, comma-separated suffix list so every entry
/// begins with a dot.
pub fn normalize_suffixes(given: &str) -> Vec<String> {
    given
        .split(',')
        .map(str::trim)
        .map(|suffix| {
            if suffix.starts_with('.') {
                suffix.to_string()
            } else {
                format!(".{}", suffix)
            }
        })
        .collect()
}

/// Compile suffixes (each starting with a dot) into one end-anchored regex,
/// e.g. `[".gov", ".gov.uk"]` -> `(?:\.gov|\.gov\.uk)$`
pub fn suffix_pattern<S: AsRef<str>>(suffixes: &[S]) -> Result<Regex> {
    let center = suffixes
        .iter()
        .map(|s| regex::escape(s.as_ref()))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!("(?:{})$", center)).context("Failed to compile suffix pattern")
}
