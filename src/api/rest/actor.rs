use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::AppError;
use crate::models::actor::{Actor, Role};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The session identity forwarded by the identity provider in request
/// headers. Requests without a role header act as a guest.
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let Some(role) = header(headers, ACTOR_ROLE_HEADER) else {
            return Ok(CurrentActor(Actor::guest()));
        };
        let role: Role = role.parse().map_err(AppError::Validation)?;
        if role == Role::Guest {
            return Ok(CurrentActor(Actor::guest()));
        }

        let id = header(headers, ACTOR_ID_HEADER).ok_or_else(|| {
            AppError::Validation(format!("{ACTOR_ID_HEADER} header is required for role {role}"))
        })?;

        Ok(CurrentActor(Actor {
            name: header(headers, ACTOR_NAME_HEADER).unwrap_or_else(|| id.clone()),
            email: header(headers, ACTOR_EMAIL_HEADER).unwrap_or_default(),
            id,
            role,
        }))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
