use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::context::RequestContext;
use crate::dispatch::{self, Response};

/// `/users`: list (GET) or create (POST); other verbs fall through to the
/// dispatcher's unhandled-method response.
pub async fn users_collection(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<RequestContext>>,
    method: Method,
    body: Bytes,
) -> axum::response::Response {
    let request = dispatch::Request::new(method.as_str()).with_body(body.to_vec());
    forward(&services, ctx, request).await
}

/// `/users/:id`: fetch, replace, or delete one user.
pub async fn users_item(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: Option<Extension<RequestContext>>,
    method: Method,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let request = dispatch::Request::new(method.as_str())
        .with_id(id)
        .with_body(body.to_vec());
    forward(&services, ctx, request).await
}

async fn forward(
    services: &AppServices,
    ctx: Option<Extension<RequestContext>>,
    request: dispatch::Request,
) -> axum::response::Response {
    let method = request.method.clone();
    let response = services.dispatcher.dispatch(request).await;

    if !response.is_success() {
        let request_id = ctx.map(|Extension(c)| c.request_id().to_string());
        tracing::debug!(
            %method,
            status = response.status,
            request_id = request_id.as_deref().unwrap_or("-"),
            body = %response.body,
            "users request failed"
        );
    }

    into_http(response)
}

fn into_http(response: Response) -> axum::response::Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        response.body,
    )
        .into_response()
}
