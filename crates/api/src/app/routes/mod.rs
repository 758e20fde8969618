use axum::{Router, routing::any};

pub mod system;
pub mod users;

/// Router for the users resource. Every method is accepted here; the
/// dispatcher decides which ones are supported.
pub fn router() -> Router {
    Router::new()
        .route("/users", any(users::users_collection))
        .route("/users/:id", any(users::users_item))
}
