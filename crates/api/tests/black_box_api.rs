use std::collections::BTreeSet;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use usersvc_api::app::{self, AppServices};
use usersvc_api::config::AppConfig;
use usersvc_api::dispatch::StatusPolicy;
use usersvc_infra::kv::InMemoryKeyValueStore;

struct TestServer {
    base_url: String,
    store: Arc<InMemoryKeyValueStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(status_policy: StatusPolicy) -> Self {
        // Same router as prod, but over a store the test can inspect, bound to an ephemeral port.
        let config = AppConfig {
            status_policy,
            ..AppConfig::default()
        };
        let store = Arc::new(InMemoryKeyValueStore::new());
        let services = AppServices::with_store(store.clone(), &config);
        let app = app::router(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn(StatusPolicy::Collapsed).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_returns_every_created_user() {
    let srv = TestServer::spawn(StatusPolicy::Collapsed).await;
    let client = reqwest::Client::new();

    for (id, name) in [("1", "Ann"), ("2", "Bob")] {
        let res = client
            .post(srv.url("/users"))
            .json(&json!({ "ID": id, "Name": name, "LastName": "Doe", "Age": 20 }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let ids: BTreeSet<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["ID"].as_str().unwrap())
        .collect();
    assert_eq!(ids, BTreeSet::from(["1", "2"]));
}

#[tokio::test]
async fn duplicate_create_is_a_client_error() {
    let srv = TestServer::spawn(StatusPolicy::Collapsed).await;
    let client = reqwest::Client::new();

    let first = client
        .post(srv.url("/users"))
        .body(r#"{"ID":"x"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .post(srv.url("/users"))
        .body(r#"{"ID":"x","Name":"Other"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body, json!({ "error": "could not put item: user already exists" }));
}

#[tokio::test]
async fn delete_then_get_reports_missing_user() {
    let srv = TestServer::spawn(StatusPolicy::Typed).await;
    let client = reqwest::Client::new();

    client
        .post(srv.url("/users"))
        .body(r#"{"ID":"7","Name":"Gone"}"#)
        .send()
        .await
        .unwrap();

    let res = client.delete(srv.url("/users/7")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "null");

    let res = client.get(srv.url("/users/7")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(srv.url("/users/7")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable_under_typed_policy() {
    let srv = TestServer::spawn(StatusPolicy::Typed).await;
    srv.store.set_unavailable(true);

    let res = reqwest::get(srv.url("/users")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("failed to fetch record"));
}

#[tokio::test]
async fn patch_is_method_not_allowed() {
    let srv = TestServer::spawn(StatusPolicy::Collapsed).await;
    let res = reqwest::Client::new()
        .patch(srv.url("/users/1"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.text().await.unwrap(), r#""method not allowed""#);
}
