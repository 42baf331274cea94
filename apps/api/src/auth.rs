use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        request::Parts,
        HeaderMap,
    },
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// A request whose bearer token resolves to a live session in the store.
pub struct AuthUser {
    pub user_id: Uuid,
    pub access_token: String,
    /// The client's `User-Agent`, if it sent one.
    pub user_agent: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let access_token = bearer_token(&parts.headers).ok_or(AppError::AuthenticationRequired)?;
        let Some(user_id) = state.store.authenticated_user(&access_token).await? else {
            // Expired or revoked: its dashboard can no longer be reached.
            state.dashboards.remove(&access_token);
            return Err(AppError::AuthenticationRequired);
        };
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(AuthUser {
            user_id,
            access_token,
            user_agent,
        })
    }
}
