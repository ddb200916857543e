use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[sqlx(rename = "2fa_secret")]
    #[serde(skip_serializing)]
    pub two_factor_secret: Option<String>,
    #[sqlx(rename = "2fa_activated")]
    pub two_factor_activated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Two-factor enrollment state derived from the stored columns.
///
/// A row claiming activation without a secret cannot be challenged, so it
/// maps to `Disabled` rather than existing as a fourth case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwoFactorState {
    Disabled,
    PendingEnrollment { secret: String },
    Activated { secret: String },
}

impl User {
    pub fn two_factor_state(&self) -> TwoFactorState {
        match (self.two_factor_activated, &self.two_factor_secret) {
            (true, Some(secret)) => TwoFactorState::Activated {
                secret: secret.clone(),
            },
            (false, Some(secret)) => TwoFactorState::PendingEnrollment {
                secret: secret.clone(),
            },
            (_, None) => TwoFactorState::Disabled,
        }
    }
}
