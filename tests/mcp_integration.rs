//! Integration tests for MCP protocol handling.
//!
//! The parsing tests exercise the JSON-RPC layer directly. The session tests
//! drive a full server over in-memory streams against a mock CMS.

use std::io::Cursor;

use kantan_cms_mcp::config::{CmsConfig, Credentials, TemplateConfig};
use kantan_cms_mcp::mcp::protocol::{parse_message, ErrorCode, IncomingMessage, RequestId};
use kantan_cms_mcp::mcp::server::{McpServer, ServerState};
use kantan_cms_mcp::mcp::tools::CmsTools;
use kantan_cms_mcp::mcp::transport::LineTransport;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, RequestId::Number(1));
}

#[test]
fn test_parse_string_id() {
    let json = r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list"}"#;

    let message = parse_message(json).unwrap();
    assert_eq!(message.method(), "tools/list");
    assert_eq!(message.id(), Some(&RequestId::String("abc".to_string())));
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    let IncomingMessage::Notification(notif) = parse_message(json).unwrap() else {
        panic!("Expected Notification");
    };
    assert_eq!(notif.method, "notifications/initialized");
}

#[test]
fn test_parse_invalid_json() {
    assert!(parse_message("not valid json").is_err());
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    assert!(parse_message(json).is_err());
}

// =============================================================================
// Session Tests
// =============================================================================

type MemoryServer = McpServer<Cursor<Vec<u8>>, Vec<u8>>;

const HANDSHAKE: [&str; 2] = [
    r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"it","version":"0"}}}"#,
    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
];

fn config(server: &MockServer) -> CmsConfig {
    CmsConfig::new(Credentials::new("proj-1", "key-1").unwrap(), server.uri()).with_templates(
        TemplateConfig {
            python_url: format!("{}/py.zip", server.uri()),
            bun_url: format!("{}/bun.zip", server.uri()),
        },
    )
}

/// Builds a server whose input is the handshake followed by one `tools/call`
/// per entry.
fn session(config: &CmsConfig, calls: &[(&str, Value)]) -> MemoryServer {
    let mut input = HANDSHAKE.join("\n");
    for (index, (name, arguments)) in calls.iter().enumerate() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": index + 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments },
        });
        input.push('\n');
        input.push_str(&request.to_string());
    }
    input.push('\n');

    McpServer::with_transport(
        CmsTools::new(config).unwrap(),
        LineTransport::new(Cursor::new(input.into_bytes()), Vec::new()),
    )
}

/// Runs the session and returns the tool call results in order.
async fn run(mut server: MemoryServer) -> Vec<Value> {
    server.serve().await.unwrap();
    assert_eq!(server.state(), ServerState::ShuttingDown);

    let output = String::from_utf8(server.into_transport().into_writer()).unwrap();
    let mut messages: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    // First response answers `initialize`.
    let init = messages.remove(0);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    messages.into_iter().map(|m| m["result"].clone()).collect()
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

fn is_error(result: &Value) -> bool {
    result["isError"].as_bool().unwrap_or(false)
}

#[tokio::test]
async fn content_tools_return_pretty_json() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/collections/"))
        .and(query_param("page_size", "5"))
        .and(query_param("page_num", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"id": "blog"}]})))
        .expect(1)
        .mount(&cms)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/collections/blog/records/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1", "title": "Hi"})))
        .expect(1)
        .mount(&cms)
        .await;

    let results = run(session(
        &config(&cms),
        &[
            ("list_collections", json!({"page_size": 5, "page_num": 2, "resp": ""})),
            ("get_record", json!({"collection_id": "blog", "record_id": "r1"})),
        ],
    ))
    .await;

    assert_eq!(results.len(), 2);
    assert!(!is_error(&results[0]));
    let listed: Value = serde_json::from_str(text(&results[0])).unwrap();
    assert_eq!(listed["items"][0]["id"], "blog");

    let record: Value = serde_json::from_str(text(&results[1])).unwrap();
    assert_eq!(record, json!({"id": "r1", "title": "Hi"}));

    // Empty `resp` is not forwarded.
    let requests = cms.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.url.query().unwrap_or_default().contains("resp")));
}

#[tokio::test]
async fn cms_failures_become_tool_errors() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/api_key/validate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&cms)
        .await;

    let results = run(session(
        &config(&cms),
        &[
            ("validate_api_key", json!({})),
            ("get_collection", json!({})),
            ("no_such_tool", json!({})),
        ],
    ))
    .await;

    assert!(is_error(&results[0]));
    assert!(text(&results[0]).contains("401"));
    assert!(text(&results[0]).contains("invalid key"));

    assert!(is_error(&results[1]));
    assert_eq!(
        text(&results[1]),
        "Missing required parameter: collection_id"
    );

    assert!(is_error(&results[2]));
    assert_eq!(text(&results[2]), "Unknown tool: no_such_tool");
}

#[tokio::test]
async fn docs_tools_include_notification() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/updates"))
        .respond_with(ResponseTemplate::new(200).set_body_string("upgrade available"))
        .mount(&cms)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/api/records"))
        .respond_with(ResponseTemplate::new(200).set_body_string("## Records"))
        .mount(&cms)
        .await;

    let results = run(session(
        &config(&cms),
        &[("get_category_api", json!({"category_name": "records"}))],
    ))
    .await;

    assert!(!is_error(&results[0]));
    assert_eq!(text(&results[0]), "Note: upgrade available\n## Records");
}

#[tokio::test]
async fn misspelt_form_tool_name_still_dispatches() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/docs/instruction/form"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Forms"))
        .expect(2)
        .mount(&cms)
        .await;

    let results = run(session(
        &config(&cms),
        &[
            ("get_instruction_for_form_integration", json!({})),
            ("get_instruction_for_form_integartion", json!({})),
        ],
    ))
    .await;

    for result in &results {
        assert!(!is_error(result));
        assert_eq!(text(result), "# Forms");
    }
}

#[tokio::test]
async fn env_file_content_needs_no_network() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&cms)
        .await;

    let results = run(session(&config(&cms), &[("create_env_file_content", json!({}))])).await;

    assert_eq!(text(&results[0]), "PROJECT_ID=proj-1\nCMS_API_KEY=");
}

#[tokio::test]
async fn unsupported_language_is_reported_without_download() {
    let cms = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&cms)
        .await;
    let root = tempfile::tempdir().unwrap();

    let results = run(session(
        &config(&cms),
        &[(
            "download_and_unzip_builder_script",
            json!({"root_path": root.path(), "lang": "ruby"}),
        )],
    ))
    .await;

    assert!(is_error(&results[0]));
    assert_eq!(
        text(&results[0]),
        "Invalid language 'ruby'. Supported languages are 'python' or 'bun'."
    );
    assert!(std::fs::read_dir(root.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn tool_calls_before_initialisation_are_rejected() {
    let cms = MockServer::start().await;
    let input = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"count_collections"}}"#;
    let mut server: MemoryServer = McpServer::with_transport(
        CmsTools::new(&config(&cms)).unwrap(),
        LineTransport::new(Cursor::new(format!("{input}\n").into_bytes()), Vec::new()),
    );

    server.serve().await.unwrap();

    let output = String::from_utf8(server.into_transport().into_writer()).unwrap();
    let response: Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(response["id"], 1);
    assert_eq!(response["error"]["code"], ErrorCode::InvalidRequest.code());
    assert!(cms.received_requests().await.unwrap().is_empty());
}
