use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pagekit::{CacheLifetime, Client, ClientConfig, Identifier};

const USER: &str = "aaaaaaaa-0000-4000-8000-000000000001";
const SPACE: &str = "bbbbbbbb-0000-4000-8000-000000000001";
const PAGE: &str = "cccccccc-0000-4000-8000-000000000001";

async fn mount_user_content(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v3/loadUserContent"))
        .and(header("cookie", "token_v2=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordMap": {
            "notion_user": {USER: {"value": {"email": "me@example.com"}}},
            "space": {SPACE: {"value": {"name": "Home"}}}
        }})))
        .expect(1)
        .mount(server)
        .await;
}

fn config(uri: &str) -> ClientConfig {
    ClientConfig::new("secret")
        .with_api_base_url(format!("{}/api/v3/", uri))
        .with_cache_lifetime(CacheLifetime::Seconds(60))
}

#[tokio::test]
async fn test_get_block_over_http() {
    let server = MockServer::start().await;
    mount_user_content(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .and(body_partial_json(json!({"pageId": PAGE, "chunkNumber": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordMap": {"block": {
            PAGE: {"role": "editor", "value": {"type": "page", "title": "Hi"}}
        }}})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();

    let title = tokio::task::spawn_blocking(move || {
        let client = Client::new(config(&uri)).unwrap();
        let id = Identifier::parse(PAGE).unwrap();
        client.get_block(id).unwrap();
        client.get_block(id).unwrap().title()
    })
    .await
    .unwrap();

    assert_eq!(title, "Hi");
}

#[tokio::test]
async fn test_update_title_over_http() {
    let server = MockServer::start().await;
    mount_user_content(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordMap": {"block": {
            PAGE: {"value": {"type": "page", "properties": {"title": [["Old"]]}}}
        }}})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v3/saveTransactions"))
        .and(body_partial_json(json!({"transactions": [{
            "spaceId": SPACE,
            "operations": [{
                "id": PAGE,
                "path": ["properties", "title"],
                "command": "set",
                "table": "block",
                "args": [["New"]]
            }]
        }]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();

    tokio::task::spawn_blocking(move || {
        let client = Client::new(config(&uri)).unwrap();
        let mut page = client.get_block(Identifier::parse(PAGE).unwrap()).unwrap();
        page.update([("title", "New")]).unwrap();
        assert_eq!(page.title(), "New");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_unauthorized_session_fails_construction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/loadUserContent"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"name": "UnauthorizedError"})),
        )
        .mount(&server)
        .await;

    let uri = server.uri();

    let err = tokio::task::spawn_blocking(move || Client::new(config(&uri)).unwrap_err())
        .await
        .unwrap();

    assert!(matches!(
        err,
        pagekit::Error::RemoteRequestFailed {
            status: Some(401),
            ..
        }
    ));
}
