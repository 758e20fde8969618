//! Uniform response envelopes.

use serde::{Deserialize, Serialize};

use usersvc_core::User;

/// Fixed body of the unhandled-method response.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "method not allowed";

/// Transport-neutral response: an HTTP-style status and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub const OK: u16 = 200;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;

    /// Serialize `payload` as the body. Falls back to a 500 error envelope if
    /// serialization fails.
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(Self::INTERNAL_SERVER_ERROR, format!("could not encode response: {e}")),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = ErrorBody::new(message);
        // `ErrorBody` holds a single optional string; encoding it cannot fail.
        let body = serde_json::to_string(&body).unwrap_or_else(|_| String::from("{}"));
        Self { status, body }
    }

    pub fn method_not_allowed() -> Self {
        Self::json(Self::METHOD_NOT_ALLOWED, &METHOD_NOT_ALLOWED_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Error envelope: `{"error": "..."}`, with the field omitted when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }
}

/// Success payload of every operation.
///
/// Serialized without a wrapper: a user object, an array of users, or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    User(User),
    Users(Vec<User>),
    Empty,
}
