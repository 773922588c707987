// src/psl.rs
//! Public Suffix List: loaded from the cache, or fetched once and cached

use crate::cache;
use anyhow::{Context, Result};
use publicsuffix::{List, Psl};
use std::path::Path;
use tracing::{debug, warn};

/// File name of the cached list under the cache root
pub const PSL_CACHE_FILE: &str = "public-suffix-list.txt";

fn parse_list(content: &str) -> Result<List> {
    content
        .parse::<List>()
        .map_err(|e| anyhow::anyhow!("Failed to parse Public Suffix List: {:?}", e))
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch Public Suffix List")?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch Public Suffix List: HTTP {}", response.status());
    }

    response
        .text()
        .await
        .context("Failed to read Public Suffix List body")
}

/// Load the list from `cache_file`, or download it from `url` and cache it.
///
/// Returns the parsed list and its raw text. `None` means the download
/// failed; that is logged rather than raised.
pub async fn load_suffix_list(
    client: &reqwest::Client,
    cache_file: &Path,
    url: &str,
) -> Result<Option<(List, String)>> {
    if cache_file.exists() {
        debug!("Using cached Public Suffix List...");
        let content = cache::read(cache_file)?;
        let list = parse_list(&content)?;
        return Ok(Some((list, content)));
    }

    debug!("Downloading the Public Suffix List...");
    let content = match fetch(client, url).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Unable to download the Public Suffix List...");
            debug!("{:?}", e);
            return Ok(None);
        }
    };

    let list = parse_list(&content)?;
    cache::write(&content, cache_file)?;

    Ok(Some((list, content)))
}

/// Registrable base domain: "x.y.domain.gov" -> "domain.gov"
pub fn base_domain(list: &List, subdomain: &str) -> Option<String> {
    let name = subdomain.trim_end_matches('.').to_lowercase();
    let domain = list.domain(name.as_bytes())?;
    String::from_utf8(domain.as_bytes().to_vec()).ok()
}
