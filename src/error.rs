use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unknown email and wrong password share this exact text so a login
/// response never reveals whether an account exists.
pub const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidCredentials,
    InvalidSecondFactor,
    Unauthorized(String),
    AlreadyAuthenticated,
    TokenInvalidOrExpired,
    EmailAlreadyRegistered,
    InvalidCode,
    MailTransport(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation: {msg}"),
            AppError::InvalidCredentials => write!(f, "Authentication failed: bad credentials"),
            AppError::InvalidSecondFactor => write!(f, "Authentication failed: bad one-time code"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::AlreadyAuthenticated => write!(f, "Caller is already authenticated"),
            AppError::TokenInvalidOrExpired => write!(f, "Reset token invalid or expired"),
            AppError::EmailAlreadyRegistered => write!(f, "Email already registered"),
            AppError::InvalidCode => write!(f, "Invalid one-time code"),
            AppError::MailTransport(msg) => write!(f, "Mail transport: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string())
            }
            AppError::InvalidSecondFactor => (
                StatusCode::UNAUTHORIZED,
                "Incorrect one-time code".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::AlreadyAuthenticated => (
                StatusCode::FORBIDDEN,
                "You are already logged in".to_string(),
            ),
            AppError::TokenInvalidOrExpired => (
                StatusCode::BAD_REQUEST,
                "Your token is invalid or has expired".to_string(),
            ),
            AppError::EmailAlreadyRegistered => (
                StatusCode::CONFLICT,
                "An account with this email is already registered".to_string(),
            ),
            AppError::InvalidCode => {
                (StatusCode::BAD_REQUEST, "Invalid one-time code".to_string())
            }
            AppError::MailTransport(msg) => {
                tracing::error!("Mail transport error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not send the reset email".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
