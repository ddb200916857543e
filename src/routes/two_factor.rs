use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::totp;
use crate::db;
use crate::error::AppError;
use crate::models::TwoFactorState;
use crate::routes::auth::MessageResponse;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ActivateRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct TwoFactorSetupResponse {
    pub secret: String,
    pub otpauth_url: String,
}

/// Begin enrollment. Re-invoking before activation keeps the same secret,
/// so an enrollment code the user already scanned stays usable. Activation
/// only happens in `activate`.
pub async fn setup(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<TwoFactorSetupResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let secret = match user.two_factor_secret {
        Some(secret) => secret,
        None => {
            let secret = totp::generate_secret().map_err(AppError::Internal)?;
            db::users::set_two_factor_secret(&state.pool, user.id, &secret).await?;
            secret
        }
    };

    let otpauth_url = totp::provisioning_uri(&secret, &state.config.totp_issuer, &user.email)
        .map_err(AppError::Internal)?;

    Ok(Json(TwoFactorSetupResponse {
        secret,
        otpauth_url,
    }))
}

pub async fn activate(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let secret = match user.two_factor_state() {
        TwoFactorState::Disabled => {
            return Err(AppError::Validation(
                "Two-factor enrollment has not been started".to_string(),
            ));
        }
        TwoFactorState::PendingEnrollment { secret } | TwoFactorState::Activated { secret } => {
            secret
        }
    };

    if !totp::verify(&req.code, &secret).map_err(AppError::Internal)? {
        // Secret stays in place; the caller may retry with a fresh code.
        return Err(AppError::InvalidCode);
    }

    db::users::activate_two_factor(&state.pool, user.id).await?;

    Ok(Json(MessageResponse {
        message: "Two-factor authentication enabled".to_string(),
    }))
}

/// Clears the activation flag and the secret together; re-enrollment
/// starts from a fresh secret.
pub async fn disable(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    db::users::clear_two_factor(&state.pool, auth.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Two-factor authentication disabled".to_string(),
    }))
}
