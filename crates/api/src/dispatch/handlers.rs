use usersvc_core::{User, UserError, UserResult};
use usersvc_infra::UserRepository;
use usersvc_infra::kv::KeyValueStore;

use super::{ID_PARAM, Payload, Request};

/// One user when an ID is given, otherwise every user.
pub(super) async fn get<S: KeyValueStore>(
    repo: &UserRepository<S>,
    request: &Request,
) -> UserResult<Payload> {
    match request.id() {
        Some(id) => repo.fetch_by_id(id).await.map(Payload::User),
        None => repo.list_all().await.map(Payload::Users),
    }
}

pub(super) async fn create<S: KeyValueStore>(
    repo: &UserRepository<S>,
    request: &Request,
) -> UserResult<Payload> {
    let candidate = User::from_json(&request.body)?;
    repo.create(candidate).await.map(Payload::User)
}

pub(super) async fn replace<S: KeyValueStore>(
    repo: &UserRepository<S>,
    request: &Request,
) -> UserResult<Payload> {
    let candidate = User::from_json(&request.body)?;
    repo.replace(candidate).await.map(Payload::User)
}

pub(super) async fn delete<S: KeyValueStore>(
    repo: &UserRepository<S>,
    request: &Request,
) -> UserResult<Payload> {
    let id = request
        .id()
        .ok_or_else(|| UserError::invalid_input(format!("missing path parameter {ID_PARAM}")))?;
    repo.delete(id).await?;
    Ok(Payload::Empty)
}
