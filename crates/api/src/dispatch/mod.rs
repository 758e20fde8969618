//! Verb-keyed request dispatch.
//!
//! ```text
//! Request { method, path_parameters, body }
//!   ↓ route(method)            pure lookup, no state
//! handler (get / create / replace / delete / unhandled)
//!   ↓ UserRepository           one store round trip (list: one per page)
//! Payload | UserError
//!   ↓ StatusPolicy + envelope
//! Response { status, body }
//! ```
//!
//! The dispatcher is transport-neutral: the HTTP binding in `app::routes`
//! only converts to and from [`Request`] / [`Response`]. It keeps no state
//! between calls, never retries and does not log.

use std::collections::HashMap;
use std::sync::Arc;

use usersvc_infra::UserRepository;
use usersvc_infra::kv::KeyValueStore;

pub mod envelope;
mod handlers;
pub mod status;

pub use envelope::{ErrorBody, METHOD_NOT_ALLOWED_MESSAGE, Payload, Response};
pub use status::StatusPolicy;

/// Name of the path parameter carrying the user ID.
pub const ID_PARAM: &str = "ID";

/// Inbound request descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path_parameters: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.path_parameters.insert(ID_PARAM.to_string(), id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The `ID` path parameter, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.path_parameters
            .get(ID_PARAM)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Which handler serves a method.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Route {
    Get,
    Create,
    Replace,
    Delete,
    Unhandled,
}

/// Map an HTTP method to its handler. Methods are matched case-sensitively,
/// as HTTP defines them.
pub fn route(method: &str) -> Route {
    match method {
        "GET" => Route::Get,
        "POST" => Route::Create,
        "PUT" => Route::Replace,
        "DELETE" => Route::Delete,
        _ => Route::Unhandled,
    }
}

/// Stateless request → response mapping over a [`UserRepository`].
#[derive(Debug)]
pub struct Dispatcher<S> {
    repository: Arc<UserRepository<S>>,
    statuses: StatusPolicy,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            statuses: self.statuses,
        }
    }
}

impl<S> Dispatcher<S> {
    pub fn new(repository: Arc<UserRepository<S>>, statuses: StatusPolicy) -> Self {
        Self {
            repository,
            statuses,
        }
    }

    pub fn repository(&self) -> &UserRepository<S> {
        &self.repository
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.statuses
    }
}

impl<S> Dispatcher<S>
where
    S: KeyValueStore,
{
    /// Handle one request. Every outcome, success or failure, becomes a
    /// [`Response`]; this never fails.
    pub async fn dispatch(&self, request: Request) -> Response {
        let repo = self.repository.as_ref();
        let outcome = match route(&request.method) {
            Route::Get => handlers::get(repo, &request).await,
            Route::Create => handlers::create(repo, &request).await,
            Route::Replace => handlers::replace(repo, &request).await,
            Route::Delete => handlers::delete(repo, &request).await,
            Route::Unhandled => return Response::method_not_allowed(),
        };

        match outcome {
            Ok(payload) => Response::json(Response::OK, &payload),
            Err(err) => Response::error(self.statuses.status_for(err.kind()), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::{Value, json};
    use usersvc_core::{User, UserId};
    use usersvc_infra::kv::InMemoryKeyValueStore;
    use usersvc_infra::RepositoryConfig;

    use super::*;

    type TestDispatcher = Dispatcher<Arc<InMemoryKeyValueStore>>;

    fn dispatcher(statuses: StatusPolicy) -> TestDispatcher {
        let repo = UserRepository::new(
            Arc::new(InMemoryKeyValueStore::new()),
            RepositoryConfig::default(),
        );
        Dispatcher::new(Arc::new(repo), statuses)
    }

    async fn seed(d: &TestDispatcher, id: &str, name: &str) {
        d.repository()
            .create(User::new(UserId::new(id).unwrap(), name, "Doe", 40))
            .await
            .unwrap();
    }

    fn body_json(response: &Response) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn routes_by_verb() {
        assert_eq!(route("GET"), Route::Get);
        assert_eq!(route("POST"), Route::Create);
        assert_eq!(route("PUT"), Route::Replace);
        assert_eq!(route("DELETE"), Route::Delete);
        for other in ["PATCH", "HEAD", "OPTIONS", "get", ""] {
            assert_eq!(route(other), Route::Unhandled, "{other}");
        }
    }

    #[test]
    fn empty_path_id_counts_as_absent() {
        assert_eq!(Request::new("GET").with_id("").id(), None);
        assert_eq!(Request::new("GET").with_id("7").id(), Some("7"));
    }

    #[tokio::test]
    async fn get_without_id_lists_all_users() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "1", "Ann").await;
        seed(&d, "2", "Bob").await;

        let response = d.dispatch(Request::new("GET")).await;
        assert_eq!(response.status, 200);

        let names: BTreeSet<String> = body_json(&response)
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["Name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, BTreeSet::from(["Ann".to_string(), "Bob".to_string()]));
    }

    #[tokio::test]
    async fn get_with_id_returns_the_record() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "1", "Ann").await;

        let response = d.dispatch(Request::new("GET").with_id("1")).await;
        assert_eq!(response.status, 200);
        assert_eq!(
            body_json(&response),
            json!({"ID": "1", "Name": "Ann", "LastName": "Doe", "Age": 40})
        );
    }

    #[tokio::test]
    async fn get_missing_id_is_a_client_error_with_message() {
        let d = dispatcher(StatusPolicy::Collapsed);
        let response = d.dispatch(Request::new("GET").with_id("nope")).await;
        assert_eq!(response.status, 400);
        assert_eq!(body_json(&response), json!({"error": "user does not exist"}));
    }

    #[tokio::test]
    async fn post_creates_and_echoes_the_user() {
        let d = dispatcher(StatusPolicy::Collapsed);
        let body = r#"{"ID":"x","Name":"Xena","LastName":"Warrior","Age":30}"#;

        let response = d.dispatch(Request::new("POST").with_body(body)).await;
        assert_eq!(response.status, 200);
        assert_eq!(body_json(&response)["Name"], "Xena");
        assert_eq!(d.repository().fetch_by_id("x").await.unwrap().age, 30);
    }

    #[tokio::test]
    async fn post_existing_id_is_rejected() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "x", "Original").await;

        let response = d.dispatch(Request::new("POST").with_body(r#"{"ID":"x"}"#)).await;
        assert_eq!(response.status, 400);
        assert_eq!(
            body_json(&response),
            json!({"error": "could not put item: user already exists"})
        );
        assert_eq!(d.repository().fetch_by_id("x").await.unwrap().name, "Original");
    }

    #[tokio::test]
    async fn malformed_body_never_reaches_the_store() {
        let d = dispatcher(StatusPolicy::Collapsed);
        d.repository().store().set_unavailable(true);

        for method in ["POST", "PUT"] {
            let response = d.dispatch(Request::new(method).with_body("{not json")).await;
            assert_eq!(response.status, 400, "{method}");
            let message = body_json(&response)["error"].as_str().unwrap().to_string();
            assert!(message.starts_with("invalid user data"), "{message}");
        }
    }

    #[tokio::test]
    async fn outage_messages_separate_reads_from_writes() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "1", "Ann").await;
        d.repository().store().set_unavailable(true);

        let cases = [
            (Request::new("GET").with_id("1"), "failed to fetch record: "),
            (Request::new("POST").with_body(r#"{"ID":"2"}"#), "could not put item: "),
            (Request::new("PUT").with_body(r#"{"ID":"1"}"#), "could not put item: "),
            (Request::new("DELETE").with_id("1"), "could not put item: "),
        ];
        for (request, prefix) in cases {
            let method = request.method.clone();
            let response = d.dispatch(request).await;
            assert_eq!(response.status, 400, "{method}");
            assert_eq!(
                body_json(&response),
                json!({"error": format!("{prefix}store unavailable: in-memory store switched off")}),
                "{method}"
            );
        }
    }

    #[tokio::test]
    async fn put_replaces_existing_and_rejects_missing() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "1", "Ann").await;

        let ok = d
            .dispatch(Request::new("PUT").with_body(r#"{"ID":"1","Name":"Anne","Age":41}"#))
            .await;
        assert_eq!(ok.status, 200);
        let stored = d.repository().fetch_by_id("1").await.unwrap();
        assert_eq!(stored.name, "Anne");
        assert_eq!(stored.last_name, "");

        let missing = d.dispatch(Request::new("PUT").with_body(r#"{"ID":"2"}"#)).await;
        assert_eq!(missing.status, 400);
        assert_eq!(
            body_json(&missing),
            json!({"error": "could not put item: user does not exist"})
        );
    }

    #[tokio::test]
    async fn delete_returns_null_and_removes_the_user() {
        let d = dispatcher(StatusPolicy::Collapsed);
        seed(&d, "1", "Ann").await;

        let response = d.dispatch(Request::new("DELETE").with_id("1")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "null");

        let again = d.dispatch(Request::new("DELETE").with_id("1")).await;
        assert_eq!(again.status, 400);
    }

    #[tokio::test]
    async fn delete_without_id_is_invalid_input() {
        let d = dispatcher(StatusPolicy::Typed);
        let response = d.dispatch(Request::new("DELETE")).await;
        assert_eq!(response.status, 400);
        assert!(body_json(&response)["error"].as_str().unwrap().contains("ID"));
    }

    #[tokio::test]
    async fn unhandled_method_ignores_input() {
        let d = dispatcher(StatusPolicy::Typed);
        let response = d
            .dispatch(Request::new("PATCH").with_id("1").with_body("anything"))
            .await;
        assert_eq!(response.status, 405);
        assert_eq!(body_json(&response), json!("method not allowed"));
    }

    #[tokio::test]
    async fn typed_policy_distinguishes_failures() {
        let d = dispatcher(StatusPolicy::Typed);
        seed(&d, "1", "Ann").await;

        let not_found = d.dispatch(Request::new("GET").with_id("2")).await;
        assert_eq!(not_found.status, 404);

        let conflict = d.dispatch(Request::new("POST").with_body(r#"{"ID":"1"}"#)).await;
        assert_eq!(conflict.status, 409);

        let invalid = d.dispatch(Request::new("POST").with_body(r#"{"Name":"no id"}"#)).await;
        assert_eq!(invalid.status, 400);

        d.repository().store().set_unavailable(true);
        let down = d.dispatch(Request::new("GET")).await;
        assert_eq!(down.status, 503);
    }
}
