// src/cache.rs
//! Filesystem cache of per-domain scan results
//!
//! Every scanner writes its output for a domain to
//! `<output>/cache/<operation>/<domain>.json`. Nothing indexes these files;
//! the path is derived from (root, operation, domain) every time.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key marking a cached result as "tried, nothing usable".
pub const INVALID_KEY: &str = "invalid";

/// Handle on the cache directory under a report root
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Create a cache rooted at `<output_dir>/cache`
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            root: output_dir.as_ref().join("cache"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Predictable cache path for a domain and operation.
    pub fn cache_path(&self, domain: &str, operation: &str, ext: &str) -> PathBuf {
        self.root.join(operation).join(format!("{}.{}", domain, ext))
    }

    pub fn cache_json_path(&self, domain: &str, operation: &str) -> PathBuf {
        self.cache_path(domain, operation, "json")
    }

    /// Path for a one-off file that belongs to no domain or operation
    pub fn cache_single(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Read the cached result of `operation` for `domain`.
    ///
    /// * `Some(Value::Object(empty))` - nothing cached yet
    /// * `None` - cached, but marked invalid
    /// * `Some(value)` - the parsed document
    ///
    /// Unreadable files and malformed JSON are returned as errors.
    pub fn data_for(&self, domain: &str, operation: &str) -> Result<Option<Value>> {
        let path = self.cache_json_path(domain, operation);
        if !path.exists() {
            return Ok(Some(Value::Object(Map::new())));
        }

        let raw = read(&path)?;
        let data = from_json(&raw)
            .with_context(|| format!("Failed to parse cached JSON at {:?}", path))?;

        if is_invalid(&data) {
            debug!("Cached {} data for {} is marked invalid", operation, domain);
            return Ok(None);
        }

        Ok(Some(data))
    }

    /// Cache a result for a domain, pretty-printed with sorted keys
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        domain: &str,
        operation: &str,
        data: &T,
    ) -> Result<PathBuf> {
        let path = self.cache_json_path(domain, operation);
        write(json_for(data)?, &path)?;
        Ok(path)
    }

    /// Cache the invalid marker, optionally on top of partial data
    pub fn write_invalid(
        &self,
        domain: &str,
        operation: &str,
        base: Option<Map<String, Value>>,
    ) -> Result<PathBuf> {
        let path = self.cache_json_path(domain, operation);
        write(invalid(base)?, &path)?;
        Ok(path)
    }
}

/// Whether a cached document carries a truthy `invalid` key
pub fn is_invalid(data: &Value) -> bool {
    data.as_object()
        .and_then(|obj| obj.get(INVALID_KEY))
        .is_some_and(truthy)
}

/// Loose truthiness for values produced by the scanners
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Serialize the invalid marker for a cached response.
pub fn invalid(base: Option<Map<String, Value>>) -> Result<String> {
    let mut data = base.unwrap_or_default();
    data.insert(INVALID_KEY.to_string(), Value::Bool(true));
    json_for(&data)
}

/// Pretty-print with sorted keys and a two-space indent.
///
/// Going through `Value` sorts object keys; chrono types serialize as
/// ISO 8601 strings.
pub fn json_for<T: Serialize + ?Sized>(object: &T) -> Result<String> {
    let value = serde_json::to_value(object).context("Failed to serialize value to JSON")?;
    serde_json::to_string_pretty(&value).context("Failed to format JSON")
}

pub fn from_json(string: &str) -> Result<Value> {
    Ok(serde_json::from_str(string)?)
}

/// Write `content` to `destination`, creating missing parent directories
pub fn write(content: impl AsRef<[u8]>, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }

    fs::write(destination, content)
        .with_context(|| format!("Failed to write {:?}", destination))
}

pub fn read(source: &Path) -> Result<String> {
    fs::read_to_string(source).with_context(|| format!("Failed to read {:?}", source))
}

/// Read the JSON document of known third-party services
pub fn known_services(path: &Path) -> Result<Value> {
    let raw = read(path)?;
    from_json(&raw).with_context(|| format!("Failed to parse known services at {:?}", path))
}
