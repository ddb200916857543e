use axum::Json;
use axum::extract::{Query, State};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::{AuthUser, MaybeAuthUser};
use crate::auth::jwt::{self, Claims};
use crate::auth::password;
use crate::auth::token::generate_reset_token;
use crate::auth::totp;
use crate::config::ResetMailPolicy;
use crate::db;
use crate::error::AppError;
use crate::models::{TwoFactorState, User};
use crate::state::SharedState;
use crate::validation;

pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct PreLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ValidateTokenQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Serialize)]
pub struct PreLoginResponse {
    pub two_factor_activated: bool,
}

#[derive(Serialize)]
pub struct TokenValidityResponse {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub two_factor_activated: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn session_cookie(access_token: &str) -> CookieJar {
    let cookie = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(jwt::SESSION_DAYS))
        .build();

    CookieJar::new().add(cookie)
}

fn clear_session_cookie() -> CookieJar {
    let cookie = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

/// Look up the user and check the password. Unknown email, missing stored
/// hash, and wrong password all collapse to the same `InvalidCredentials`.
async fn verify_credentials(
    state: &SharedState,
    email: &str,
    plaintext: &str,
) -> Result<User, AppError> {
    let Some(user) = db::users::find_by_email(&state.pool, email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    let Some(hash) = user.password.as_deref() else {
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify(plaintext, hash).map_err(AppError::Internal)? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validation::validate_email(&req.email)?;
    validation::validate_new_password(&req.password, &req.password_confirm)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // The unique constraint on email is the only existence check; a
    // select-then-insert would race with concurrent registrations.
    match db::users::create(&state.pool, &req.email, &pw_hash).await {
        Ok(user) => {
            tracing::info!("Registered user {}", user.id);
            Ok(Json(MessageResponse {
                message: "Account created, you can now log in".to_string(),
            }))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::EmailAlreadyRegistered)
        }
        Err(e) => Err(e.into()),
    }
}

/// First half of the login flow: tells the client whether to prompt for a
/// one-time code. Never issues a session; `login` re-runs the full check
/// and is the only place a session is established.
pub async fn pre_login(
    State(state): State<SharedState>,
    Json(req): Json<PreLoginRequest>,
) -> Result<Json<PreLoginResponse>, AppError> {
    validation::validate_email(&req.email)?;
    validation::validate_password(&req.password)?;

    let user = verify_credentials(&state, &req.email, &req.password).await?;

    Ok(Json(PreLoginResponse {
        two_factor_activated: user.two_factor_activated,
    }))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    validation::validate_email(&req.email)?;
    validation::validate_password(&req.password)?;

    let user = verify_credentials(&state, &req.email, &req.password).await?;

    if let TwoFactorState::Activated { secret } = user.two_factor_state() {
        let code = req.code.as_deref().ok_or(AppError::InvalidSecondFactor)?;
        if !totp::verify(code, &secret).map_err(AppError::Internal)? {
            return Err(AppError::InvalidSecondFactor);
        }
    }

    let claims = Claims::new(user.id, user.email.clone());
    let access_token =
        jwt::encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok((
        session_cookie(&access_token),
        Json(AuthResponse { access_token }),
    ))
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

pub async fn me(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        two_factor_activated: user.two_factor_activated,
    }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    caller: MaybeAuthUser,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if caller.is_authenticated() {
        return Err(AppError::AlreadyAuthenticated);
    }

    validation::validate_email(&req.email)?;

    // The response is identical whether or not the email matches a user.
    let response = Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    });

    let Some(user) = db::users::find_by_email(&state.pool, &req.email).await? else {
        return Ok(response);
    };

    let token = generate_reset_token();
    let expiry = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

    // Atomic replace keyed on user_id: only the newest token stays valid,
    // under concurrent requests included.
    db::password_reset_tokens::upsert(&state.pool, user.id, &token, expiry).await?;

    let reset_url = format!("{}/update-password?token={token}", state.config.base_url);
    let outcome = match state.mailer.as_ref() {
        Some(mailer) => mailer.send_password_reset(&user.email, &reset_url).await,
        None => Err("SMTP transport not configured".to_string()),
    };

    if let Err(e) = outcome {
        // The token row is already committed either way; only the response
        // shape depends on the policy.
        match state.config.reset_mail_policy {
            ResetMailPolicy::Required => return Err(AppError::MailTransport(e)),
            ResetMailPolicy::BestEffort => {
                tracing::warn!("Password reset email to {} not sent: {e}", user.email);
            }
        }
    }

    Ok(response)
}

/// Side-effect-free check used by the reset form before it asks the user
/// for a new password.
pub async fn validate_reset_token(
    State(state): State<SharedState>,
    Query(query): Query<ValidateTokenQuery>,
) -> Result<Json<TokenValidityResponse>, AppError> {
    let valid = db::password_reset_tokens::find_by_token(&state.pool, &query.token)
        .await?
        .is_some_and(|t| t.is_live(Utc::now()));

    Ok(Json(TokenValidityResponse { valid }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    caller: MaybeAuthUser,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validation::validate_new_password(&req.password, &req.password_confirm)?;

    // Authenticated password changes go through /change-password with the
    // current password, never through a mailed token.
    if caller.is_authenticated() {
        return Err(AppError::AlreadyAuthenticated);
    }

    let reset_token = db::password_reset_tokens::find_by_token(&state.pool, &req.token)
        .await?
        .ok_or(AppError::TokenInvalidOrExpired)?;

    if !reset_token.is_live(Utc::now()) {
        return Err(AppError::TokenInvalidOrExpired);
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;

    // Delete only after the password update has committed; a crash in
    // between leaves a still-usable token rather than a locked-out user.
    db::password_reset_tokens::delete(&state.pool, reset_token.id).await?;

    Ok(Json(MessageResponse {
        message: "Your password has been updated".to_string(),
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validation::validate_new_password(&req.password, &req.password_confirm)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let current_ok = match user.password.as_deref() {
        Some(hash) => password::verify(&req.current_password, hash).map_err(AppError::Internal)?,
        None => false,
    };
    if !current_ok {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    Ok(Json(MessageResponse {
        message: "Your password has been updated".to_string(),
    }))
}
