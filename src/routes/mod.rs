pub mod auth;
pub mod two_factor;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Login path
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/pre-login", post(auth::pre_login))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Password reset lifecycle
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-token", get(auth::validate_reset_token))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Two-factor enrollment
        .route("/api/v1/auth/2fa/setup", post(two_factor::setup))
        .route("/api/v1/auth/2fa/activate", post(two_factor::activate))
        .route("/api/v1/auth/2fa/disable", post(two_factor::disable))
}
