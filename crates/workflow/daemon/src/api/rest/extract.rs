//! Acting-user extraction

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use workflow_types::UserId;

/// Header naming the user on whose behalf the request acts
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting user, taken from the `x-actor-id` header
#[derive(Debug, Clone)]
pub struct Actor(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::MissingActor(format!("{} header is required", ACTOR_HEADER)))?;
        let id = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", ACTOR_HEADER)))?
            .trim();
        if id.is_empty() {
            return Err(ApiError::MissingActor(format!("{} header is empty", ACTOR_HEADER)));
        }
        Ok(Actor(UserId::new(id)))
    }
}
