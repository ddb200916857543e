use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

/// The verified identity a request carries. Handlers take this explicitly;
/// nothing reads the session ambiently.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

fn claims_from_parts(parts: &Parts, state: &SharedState) -> Option<jwt::Claims> {
    // Bearer token from the Authorization header first
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Some(token) = auth_header.to_str().ok()?.strip_prefix("Bearer ") {
            return jwt::decode_token(token, &state.config.jwt_secret).ok();
        }
    }

    // Fall back to cookie-based auth
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get("access_token")?;
    jwt::decode_token(cookie.value(), &state.config.jwt_secret).ok()
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state)
            .map(|claims| AuthUser {
                user_id: claims.sub,
                email: claims.email,
            })
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid session".to_string()))
    }
}

/// Identity-or-none, for operations that are only open to logged-out
/// callers. A missing or unverifiable session is simply `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequestParts<SharedState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(claims_from_parts(parts, state).map(
            |claims| AuthUser {
                user_id: claims.sub,
                email: claims.email,
            },
        )))
    }
}
