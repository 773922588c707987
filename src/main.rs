// src/main.rs
use anyhow::Context;
use domain_scan::cli::{OptionBag, Options, ScanOptions};
use domain_scan::context::ScanContext;
use domain_scan::domains::{load_domains, normalize_suffixes, sort_csv, suffix_pattern};
use domain_scan::facts::DomainReport;
use domain_scan::runner::{self, RunError};
use std::path::Path;

#[tokio::main]
async fn main() {
    match runner::run(runner::lossy_args(std::env::args_os()), OptionBag::new(), report).await {
        Ok(count) => tracing::info!("Reported on {} domains", count),
        Err(RunError::Usage(e)) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
        // already logged by the runner
        Err(e) => std::process::exit(e.exit_code()),
    }
}

/// Expand positional arguments into domains: CSV files are loaded (sorted
/// first with `--sort`), anything else is taken as a domain name.
fn collect_domains(opts: &ScanOptions) -> anyhow::Result<Vec<String>> {
    let mut domains = Vec::new();

    for arg in &opts.positional {
        let path = Path::new(arg);
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            if opts.sort {
                sort_csv(path)?;
            }
            let loaded = load_domains(path)
                .with_context(|| format!("Failed to load domains from {}", arg))?;
            tracing::info!("Loaded {} domains from {}", loaded.len(), arg);
            domains.extend(loaded);
        } else {
            domains.push(arg.to_lowercase());
        }
    }

    Ok(domains)
}

/// Print one JSON line of cached facts per domain
async fn report(options: Options, ctx: ScanContext) -> anyhow::Result<usize> {
    let Options::Scan(opts) = options else {
        anyhow::bail!("domain-scan only understands scan-style options");
    };

    let domains = collect_domains(&opts)?;
    if domains.is_empty() {
        anyhow::bail!("No domains given: pass domain names or CSV files of domains");
    }

    let pattern = opts
        .suffix
        .as_deref()
        .map(|s| suffix_pattern(&normalize_suffixes(s)))
        .transpose()?;

    let mut count = 0;
    for domain in &domains {
        if let Some(pattern) = &pattern {
            if !pattern.is_match(domain) {
                tracing::debug!("Skipping {}: outside {}", domain, pattern.as_str());
                continue;
            }
        }

        let mut report = DomainReport::gather(ctx.cache(), domain)?;
        if opts.base_domains {
            report.base_domain = ctx.base_domain_for(domain).await?;
        }

        println!("{}", serde_json::to_string(&report)?);
        count += 1;
    }

    Ok(count)
}
