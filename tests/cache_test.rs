// Integration tests for the result cache and the facts read from it
use domain_scan::cache::{self, Cache};
use domain_scan::config::Settings;
use domain_scan::context::ScanContext;
use domain_scan::facts::{self, DomainReport, PSHTT, TRUSTYMAIL};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_cache_path_is_pure() {
    let cache = Cache::new("/data/scan");
    let path = cache.cache_json_path("example.gov", "pshtt");

    assert_eq!(path, PathBuf::from("/data/scan/cache/pshtt/example.gov.json"));
    assert_eq!(path, cache.cache_json_path("example.gov", "pshtt"));
}

#[test]
fn test_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(dir.path());

    let doc = json!({
        "Domain": "example.gov",
        "Live": true,
        "endpoints": {
            "https": {"live": true, "https_bad_hostname": false, "headers": {"server": "nginx"}}
        },
        "Results": [1, 2.5, null, "x"]
    });
    let written = cache.write_json("example.gov", "pshtt", &doc).unwrap();

    assert!(written.starts_with(dir.path().join("cache").join("pshtt")));
    assert_eq!(cache.data_for("example.gov", "pshtt").unwrap(), Some(doc));
}

#[test]
fn test_written_json_is_sorted_and_pretty() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(dir.path());

    let path = cache
        .write_json("example.gov", "trustymail", &json!({"Live": true, "Domain": "example.gov"}))
        .unwrap();

    let raw = cache::read(&path).unwrap();
    assert_eq!(raw, "{\n  \"Domain\": \"example.gov\",\n  \"Live\": true\n}");
}

#[test]
fn test_report_for_a_pshtt_domain() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(dir.path());

    cache
        .write_json(
            "agency.gov",
            PSHTT,
            &json!({
                "Canonical URL": "https://www.agency.gov",
                "Live": true,
                "Redirect": false,
                "endpoints": {
                    "https": {"live": false},
                    "httpswww": {"live": true, "https_bad_hostname": false}
                }
            }),
        )
        .unwrap();
    cache
        .write_json(
            "agency.gov",
            TRUSTYMAIL,
            &json!({"Domain Supports STARTTLS Results": "mx.agency.gov:25"}),
        )
        .unwrap();

    let report = DomainReport::gather(&cache, "agency.gov").unwrap();
    assert_eq!(
        report,
        DomainReport {
            domain: "agency.gov".to_string(),
            base_domain: None,
            canonical: Some("https://www.agency.gov".to_string()),
            not_live: false,
            is_redirect: false,
            uses_www: true,
            doesnt_support_https: false,
            starttls_mail_servers: vec!["mx.agency.gov:25".to_string()],
        }
    );

    let line = serde_json::to_value(&report).unwrap();
    assert!(line.get("base_domain").is_none());
}

#[test]
fn test_invalid_entries_read_as_no_data() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(dir.path());

    let mut base = serde_json::Map::new();
    base.insert("Live".to_string(), json!(false));
    cache.write_invalid("gone.gov", PSHTT, Some(base)).unwrap();

    assert_eq!(cache.data_for("gone.gov", PSHTT).unwrap(), None);
    assert!(!facts::not_live(&cache, "gone.gov").unwrap());
    assert!(!facts::doesnt_support_https(&cache, "gone.gov").unwrap());
}

#[test]
fn test_context_reads_known_services() {
    let settings = Settings::from_file(Path::new("tests/test_settings.toml")).unwrap();
    assert_eq!(settings.command_timeout_secs, Some(20));

    let ctx = ScanContext::new("./", settings).unwrap();
    let services = ctx.known_services().unwrap();
    assert!(services.get("Google Analytics").is_some());
}
