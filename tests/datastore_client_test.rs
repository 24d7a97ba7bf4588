use httpmock::prelude::*;
use product_autocomplete::domain::model::{EntityKey, KeyId};
use product_autocomplete::domain::ports::DocumentStore;
use product_autocomplete::domain::query::{PrefixRange, Query};
use product_autocomplete::{AppError, DatastoreClient};
use serde_json::json;

#[tokio::test]
async fn test_run_query_sends_bearer_token_and_namespace() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project:runQuery")
                .header("authorization", "Bearer test-token")
                .body_contains("\"namespaceId\":\"shop\"")
                .body_contains("\"kind\":[{\"name\":\"Product\"}]");
            then.status(200).json_body(json!({
                "batch": {
                    "entityResults": [{
                        "entity": {
                            "key": {"path": [{"kind": "Product", "name": "saw"}]},
                            "properties": {"name": {"stringValue": "Saw"}}
                        }
                    }],
                    "moreResults": "NO_MORE_RESULTS"
                }
            }));
        })
        .await;

    let client = DatastoreClient::new(server.base_url(), "demo-project")
        .with_namespace(Some("shop".to_string()))
        .with_access_token(Some("test-token".to_string()));

    let query = Query::new("Product")
        .prefix("downcase_name", &PrefixRange::new("sa"))
        .limit(5);
    let page = client.run_query(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.entities.len(), 1);
    assert!(!page.more_results);
    assert_eq!(
        page.entities[0].key.id(),
        Some(&KeyId::Name("saw".to_string()))
    );
    assert_eq!(page.entities[0].properties["name"], json!("Saw"));
}

#[tokio::test]
async fn test_run_query_without_token_sends_no_auth_header() {
    let server = MockServer::start_async().await;
    let with_auth = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project:runQuery")
                .header_exists("authorization");
            then.status(401);
        })
        .await;
    let without_auth = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/projects/demo-project:runQuery");
            then.status(200).json_body(json!({"batch": {}}));
        })
        .await;

    let client = DatastoreClient::new(server.base_url(), "demo-project");
    let page = client.run_query(&Query::new("Product")).await.unwrap();

    assert!(page.entities.is_empty());
    assert_eq!(with_auth.hits_async().await, 0);
    without_auth.assert_async().await;
}

#[tokio::test]
async fn test_error_status_becomes_store_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/projects/demo-project:runQuery");
            then.status(403).body("permission denied");
        })
        .await;

    let client = DatastoreClient::new(server.base_url(), "demo-project");
    let err = client.run_query(&Query::new("Product")).await.unwrap_err();

    match err {
        AppError::StoreError { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "permission denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_found_and_missing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project:lookup")
                .body_contains("\"id\":\"42\"");
            then.status(200).json_body(json!({
                "found": [{
                    "entity": {
                        "key": {"path": [{"kind": "Product", "id": "42"}]},
                        "properties": {"name": {"stringValue": "Vise"}}
                    }
                }]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo-project:lookup")
                .body_contains("\"id\":\"43\"");
            then.status(200).json_body(json!({"missing": []}));
        })
        .await;

    let client = DatastoreClient::new(format!("{}/", server.base_url()), "demo-project");

    let found = client
        .lookup(&EntityKey::new("Product", KeyId::Id(42)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.properties["name"], json!("Vise"));

    let missing = client
        .lookup(&EntityKey::new("Product", KeyId::Id(43)))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_method_url_trims_trailing_slash() {
    let client = DatastoreClient::new("http://localhost:8081/", "demo-project");
    assert_eq!(
        client.method_url("runQuery"),
        "http://localhost:8081/v1/projects/demo-project:runQuery"
    );
}
