use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub totp_issuer: String,
    pub reset_mail_policy: ResetMailPolicy,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// What a failed reset-mail dispatch does to the caller's response. The
/// token write is already committed either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMailPolicy {
    /// Surface the failure as a distinct transport fault.
    Required,
    /// Log the failure and keep the success-shaped response.
    BestEffort,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("GATEHOUSE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid GATEHOUSE_HOST: {e}"))?;

        let port: u16 = env_or("GATEHOUSE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid GATEHOUSE_PORT: {e}"))?;

        let base_url = env_or("GATEHOUSE_BASE_URL", &format!("http://{host}:{port}"));

        let totp_issuer = env_or("GATEHOUSE_TOTP_ISSUER", "Gatehouse");

        let reset_mail_policy = match env_or("GATEHOUSE_RESET_MAIL_POLICY", "required").as_str() {
            "best-effort" => ResetMailPolicy::BestEffort,
            _ => ResetMailPolicy::Required,
        };

        let log_level = env_or("GATEHOUSE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("GATEHOUSE_SMTP_HOST").ok(),
            std::env::var("GATEHOUSE_SMTP_PORT").ok(),
            std::env::var("GATEHOUSE_SMTP_USER").ok(),
            std::env::var("GATEHOUSE_SMTP_PASS").ok(),
            std::env::var("GATEHOUSE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid GATEHOUSE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            totp_issuer,
            reset_mail_policy,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
