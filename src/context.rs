// src/context.rs
//! Per-run state shared by reference with everything a driver calls

use crate::cache::{self, Cache};
use crate::config::Settings;
use crate::download;
use crate::process::{self, ScanCommand};
use crate::psl::{self, PSL_CACHE_FILE};
use anyhow::Result;
use publicsuffix::List;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::warn;

pub struct ScanContext {
    output_dir: PathBuf,
    cache: Cache,
    settings: Settings,
    http_client: reqwest::Client,
    suffix_list: OnceCell<List>,
}

impl ScanContext {
    pub fn new(output_dir: impl Into<PathBuf>, settings: Settings) -> Result<Self> {
        let output_dir = output_dir.into();
        let http_client = download::http_client(
            &settings.user_agent,
            settings.http_timeout_secs.map(Duration::from_secs),
        )?;

        Ok(Self {
            cache: Cache::new(&output_dir),
            output_dir,
            settings,
            http_client,
            suffix_list: OnceCell::new(),
        })
    }

    pub fn report_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.root()
    }

    pub fn results_dir(&self) -> PathBuf {
        self.output_dir.join("results")
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn download(&self, url: &str, destination: &Path) -> Result<PathBuf> {
        download::download(&self.http_client, url, destination).await
    }

    /// Run a scanner subprocess, bounded by `command_timeout_secs`
    pub async fn scan<S: AsRef<str>>(
        &self,
        command: &[S],
        env: Option<&HashMap<String, String>>,
        allowed_return_codes: &[i32],
    ) -> Option<String> {
        let opts = ScanCommand {
            env,
            allowed_return_codes,
            timeout: self.settings.command_timeout_secs.map(Duration::from_secs),
        };
        process::scan(command, opts).await
    }

    pub fn known_services(&self) -> Result<Value> {
        cache::known_services(&self.settings.known_services)
    }

    async fn fetch_suffix_list(&self) -> Result<List> {
        let cache_file = self.cache.cache_single(PSL_CACHE_FILE);
        let loaded =
            psl::load_suffix_list(&self.http_client, &cache_file, &self.settings.psl_url).await?;

        match loaded {
            Some((list, _content)) => Ok(list),
            None => {
                warn!("Error downloading the PSL.");
                anyhow::bail!("Public Suffix List is unavailable")
            }
        }
    }

    /// The Public Suffix List, loaded on first use and kept for the run
    pub async fn suffix_list(&self) -> Result<&List> {
        self.suffix_list
            .get_or_try_init(|| self.fetch_suffix_list())
            .await
    }

    /// Base domain for a subdomain, e.g. "x.y.domain.gov" -> "domain.gov"
    pub async fn base_domain_for(&self, subdomain: &str) -> Result<Option<String>> {
        let list = self.suffix_list().await?;
        Ok(psl::base_domain(list, subdomain))
    }
}
