use axum::async_trait;
use axum::extract::FromRequestParts;
use http::header::AUTHORIZATION;
use http::request::Parts;
use tracing::warn;

use crate::errors::AppError;
use crate::models::User;
use crate::routes::blocking;
use crate::state::AppState;

/// The user behind the request's `Authorization: Bearer <jwt>` header.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthenticated("No token provided".into()))?;

        let auth = state.auth.clone();
        blocking(move || auth.authenticate(&token)).await.map(AuthUser).map_err(|e| {
            warn!("{} {} rejected: {}", parts.method, parts.uri.path(), e);
            e
        })
    }
}
