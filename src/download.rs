// src/download.rs
//! Fetch a URL to disk, un-gzipping the result when the server gzipped it

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// HTTP client for downloads.
///
/// Automatic decompression is off: gzip bodies land on disk as sent and are
/// expanded by [`download`]. Requests are unbounded unless `timeout` is set.
pub fn http_client(user_agent: &str, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(user_agent).gzip(false);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

/// Download `url` to `destination`, creating its directory.
pub async fn download(client: &reqwest::Client, url: &str, destination: &Path) -> Result<PathBuf> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }

    info!("Downloading {} to {}", url, destination.display());

    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to download {}: HTTP {}", url, response.status());
    }

    let gzipped = response
        .headers()
        .get(reqwest::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    let mut file = tokio::fs::File::create(destination)
        .await
        .with_context(|| format!("Failed to create {:?}", destination))?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    if gzipped {
        debug!("{} was gzip-encoded, decompressing in place", url);
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || gunzip_in_place(&destination))
            .await
            .context("Decompression task failed")??;
    }

    Ok(destination.to_path_buf())
}

/// Replace a gzip file with its decompressed contents
fn gunzip_in_place(path: &Path) -> Result<()> {
    let unzipped = PathBuf::from(format!("{}.unzipped", path.display()));

    {
        let mut decoder = GzDecoder::new(BufReader::new(File::open(path)?));
        let mut out = File::create(&unzipped)
            .with_context(|| format!("Failed to create {:?}", unzipped))?;
        io::copy(&mut decoder, &mut out)
            .with_context(|| format!("Failed to decompress {:?}", path))?;
    }

    std::fs::rename(&unzipped, path)
        .with_context(|| format!("Failed to replace {:?} with decompressed copy", path))?;
    Ok(())
}
