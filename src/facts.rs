// src/facts.rs
//! Answers to simple questions about a domain, read from cached scan output
//!
//! Nothing here is stored; every fact is recomputed from the cached
//! document. Absent or invalid data gives the conservative default.

use crate::cache::{truthy, Cache};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

pub const PSHTT: &str = "pshtt";
pub const TRUSTYMAIL: &str = "trustymail";

const STARTTLS_RESULTS: &str = "Domain Supports STARTTLS Results";

/// Cached document for `operation`, or `None` when absent or invalid
fn inspection(cache: &Cache, domain: &str, operation: &str) -> Result<Option<Value>> {
    let data = cache.data_for(domain, operation)?;
    Ok(data.filter(truthy))
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.as_object().and_then(|obj| obj.get(key))
}

/// Whether the cached pshtt data says neither HTTPS endpoint is usable.
///
/// Useful for saving time on TLS-related scanning.
pub fn doesnt_support_https(cache: &Cache, domain: &str) -> Result<bool> {
    let Some(data) = inspection(cache, domain, PSHTT)? else {
        return Ok(false);
    };

    let endpoints = field(&data, "endpoints");
    let endpoint_used = |name: &str| {
        endpoints
            .and_then(|e| field(e, name))
            .is_some_and(|endpoint| {
                field(endpoint, "live").is_some_and(truthy)
                    && !field(endpoint, "https_bad_hostname").is_some_and(truthy)
            })
    };

    Ok(!(endpoint_used("https") || endpoint_used("httpswww")))
}

/// Whether the domain canonically prepends `www`
pub fn uses_www(cache: &Cache, domain: &str) -> Result<bool> {
    if domain.starts_with("www.") {
        return Ok(false);
    }

    Ok(canonical(cache, domain)?
        .is_some_and(|url| url.starts_with("http://www") || url.starts_with("https://www")))
}

pub fn mail_servers_that_support_starttls(cache: &Cache, domain: &str) -> Result<Vec<String>> {
    let Some(data) = inspection(cache, domain, TRUSTYMAIL)? else {
        return Ok(Vec::new());
    };

    let servers = field(&data, STARTTLS_RESULTS)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.split(", ").map(str::to_string).collect())
        .unwrap_or_default();

    Ok(servers)
}

/// Whether the cached pshtt data says the domain is not live.
///
/// Useful for skipping scans on dead domains.
pub fn not_live(cache: &Cache, domain: &str) -> Result<bool> {
    let Some(data) = inspection(cache, domain, PSHTT)? else {
        return Ok(false);
    };

    Ok(!field(&data, "Live").is_some_and(truthy))
}

pub fn is_redirect(cache: &Cache, domain: &str) -> Result<bool> {
    let Some(data) = inspection(cache, domain, PSHTT)? else {
        return Ok(false);
    };

    Ok(field(&data, "Redirect") == Some(&Value::Bool(true)))
}

/// Canonical URL from the cached pshtt data, if known
pub fn canonical(cache: &Cache, domain: &str) -> Result<Option<String>> {
    let Some(data) = inspection(cache, domain, PSHTT)? else {
        return Ok(None);
    };

    Ok(field(&data, "Canonical URL")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Every cached fact about one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReport {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
    pub canonical: Option<String>,
    pub not_live: bool,
    pub is_redirect: bool,
    pub uses_www: bool,
    pub doesnt_support_https: bool,
    pub starttls_mail_servers: Vec<String>,
}

impl DomainReport {
    pub fn gather(cache: &Cache, domain: &str) -> Result<Self> {
        Ok(Self {
            domain: domain.to_string(),
            base_domain: None,
            canonical: canonical(cache, domain)?,
            not_live: not_live(cache, domain)?,
            is_redirect: is_redirect(cache, domain)?,
            uses_www: uses_www(cache, domain)?,
            doesnt_support_https: doesnt_support_https(cache, domain)?,
            starttls_mail_servers: mail_servers_that_support_starttls(cache, domain)?,
        })
    }
}
