//! Integration tests for documentation retrieval and the notification banner.

use kantan_cms_mcp::cms::{CmsError, DocsClient};
use kantan_cms_mcp::config::{CmsConfig, Credentials};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn docs(base_url: &str) -> DocsClient {
    let config = CmsConfig::new(Credentials::new("proj-1", "key-1").unwrap(), base_url);
    DocsClient::new(&config).unwrap()
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/docs/{page}")))
        .and(header("X-Project-ID", "proj-1"))
        .and(header("X-API-Key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn notification_is_prepended() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/updates"))
        .and(query_param("version", env!("CARGO_PKG_VERSION")))
        .respond_with(ResponseTemplate::new(200).set_body_string("v0.2.0 is available"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "instruction/build", "# Build\nStep 1").await;

    let text = docs(&server.uri()).build_instructions().await.unwrap();
    assert_eq!(text, "Note: v0.2.0 is available\n# Build\nStep 1");
}

#[tokio::test]
async fn failing_notification_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/updates"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "instruction/build", "# Build").await;

    let text = docs(&server.uri()).build_instructions().await.unwrap();
    assert_eq!(text, "# Build");
}

#[tokio::test]
async fn missing_notification_endpoint_is_dropped() {
    let server = MockServer::start().await;
    // Nothing mounted for /updates: the mock server answers 404.
    mount_page(&server, "instruction/form", "# Forms").await;

    let text = docs(&server.uri()).form_instructions().await.unwrap();
    assert_eq!(text, "# Forms");
}

#[tokio::test]
async fn unreachable_docs_host_fails_the_page_not_the_banner() {
    let err = docs("http://127.0.0.1:9")
        .table_of_contents()
        .await
        .unwrap_err();
    assert!(matches!(err, CmsError::Transport { .. }));
}

#[tokio::test]
async fn toc_and_category_paths() {
    let server = MockServer::start().await;
    mount_page(&server, "api/", "collections\nrecords").await;
    mount_page(&server, "api/records", "## Records API").await;

    let client = docs(&server.uri());
    assert_eq!(
        client.table_of_contents().await.unwrap(),
        "collections\nrecords"
    );
    assert_eq!(
        client.category("records").await.unwrap(),
        "## Records API"
    );
}

#[tokio::test]
async fn page_error_status_is_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/api/unknown"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such category"))
        .mount(&server)
        .await;

    let err = docs(&server.uri()).category("unknown").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
