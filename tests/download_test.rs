// Integration tests for downloads and the Public Suffix List, against a mock server
use domain_scan::config::Settings;
use domain_scan::context::ScanContext;
use domain_scan::download::{download, http_client};
use domain_scan::psl::{load_suffix_list, PSL_CACHE_FILE};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PSL_TEXT: &str = "// test list\ngov\nuk\ngov.uk\n";

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_download_plain_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("domain\nexample.gov\n"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("nested").join("domains.csv");
    let client = http_client("domain-scan-test", None).unwrap();

    let saved = download(&client, &format!("{}/domains.csv", server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(saved, dest);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "domain\nexample.gov\n");
}

#[tokio::test]
async fn test_download_gzip_encoded_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(gzip(b"a.gov\nb.gov\n")),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("sites.csv");
    let client = http_client("domain-scan-test", None).unwrap();

    download(&client, &format!("{}/sites.csv", server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "a.gov\nb.gov\n");
    assert!(!dir.path().join("sites.csv.unzipped").exists());
}

#[tokio::test]
async fn test_download_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = http_client("domain-scan-test", None).unwrap();

    let result = download(&client, &format!("{}/missing", server.uri()), &dir.path().join("x")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_download_respects_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("example.gov\n")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/slow.csv", server.uri());

    let bounded = http_client("domain-scan-test", Some(Duration::from_millis(200))).unwrap();
    assert!(download(&bounded, &url, &dir.path().join("a.csv")).await.is_err());

    let unbounded = http_client("domain-scan-test", None).unwrap();
    download(&unbounded, &url, &dir.path().join("b.csv")).await.unwrap();
    assert_eq!(std::fs::read_to_string(dir.path().join("b.csv")).unwrap(), "example.gov\n");
}

#[tokio::test]
async fn test_psl_fetched_once_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/psl.dat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PSL_TEXT))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let settings = Settings {
        psl_url: format!("{}/psl.dat", server.uri()),
        ..Settings::default()
    };
    let ctx = ScanContext::new(dir.path(), settings).unwrap();

    assert_eq!(
        ctx.base_domain_for("www.agency.gov.uk").await.unwrap(),
        Some("agency.gov.uk".to_string())
    );
    assert_eq!(
        ctx.base_domain_for("x.y.domain.gov").await.unwrap(),
        Some("domain.gov".to_string())
    );

    let cached = dir.path().join("cache").join(PSL_CACHE_FILE);
    assert_eq!(std::fs::read_to_string(cached).unwrap(), PSL_TEXT);
}

#[tokio::test]
async fn test_psl_download_failure_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache_file = dir.path().join(PSL_CACHE_FILE);
    let client = http_client("domain-scan-test", None).unwrap();

    let loaded = load_suffix_list(&client, &cache_file, &format!("{}/psl.dat", server.uri()))
        .await
        .unwrap();

    assert!(loaded.is_none());
    assert!(!cache_file.exists());
}

#[tokio::test]
async fn test_psl_prefers_cache_file() {
    let dir = TempDir::new().unwrap();
    let cache_file = dir.path().join(PSL_CACHE_FILE);
    std::fs::write(&cache_file, PSL_TEXT).unwrap();
    let client = http_client("domain-scan-test", None).unwrap();

    let (_, content) = load_suffix_list(&client, &cache_file, "http://127.0.0.1:9/unused")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(content, PSL_TEXT);
}
