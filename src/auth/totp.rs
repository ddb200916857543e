use totp_rs::{Algorithm, Secret, TOTP};

pub const TOTP_DIGITS: usize = 6;
pub const TOTP_STEP: u64 = 30;
/// Accept one step either side of now (±30s of clock drift).
pub const TOTP_SKEW: u8 = 1;

fn build(secret: Vec<u8>, issuer: Option<String>, account: String) -> Result<TOTP, String> {
    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP,
        secret,
        issuer,
        account,
    )
    .map_err(|e| format!("TOTP init failed: {e}"))
}

fn decode_secret(secret_base32: &str) -> Result<Vec<u8>, String> {
    Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| format!("Invalid TOTP secret: {e:?}"))
}

/// Generate a fresh shared secret, base32 encoded for storage and for
/// authenticator apps.
pub fn generate_secret() -> Result<String, String> {
    let bytes = Secret::generate_secret()
        .to_bytes()
        .map_err(|e| format!("Secret generation failed: {e:?}"))?;
    Ok(build(bytes, None, String::new())?.get_secret_base32())
}

/// The `otpauth://` URI an authenticator app enrolls from, encoding the
/// issuer label, the account email, and the secret.
pub fn provisioning_uri(
    secret_base32: &str,
    issuer: &str,
    account: &str,
) -> Result<String, String> {
    let totp = build(
        decode_secret(secret_base32)?,
        Some(issuer.to_string()),
        account.to_string(),
    )?;
    Ok(totp.get_url())
}

/// Check a submitted 6-digit code against the stored secret at the current
/// time, within the configured skew window.
pub fn verify(code: &str, secret_base32: &str) -> Result<bool, String> {
    let totp = build(decode_secret(secret_base32)?, None, String::new())?;
    totp.check_current(code)
        .map_err(|e| format!("System clock error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_unique_base32() {
        let a = generate_secret().unwrap();
        let b = generate_secret().unwrap();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn current_code_verifies() {
        let secret = generate_secret().unwrap();
        let totp = build(decode_secret(&secret).unwrap(), None, String::new()).unwrap();
        let code = totp.generate_current().unwrap();
        assert!(verify(&code, &secret).unwrap());
    }

    #[test]
    fn mangled_code_fails() {
        let secret = generate_secret().unwrap();
        let totp = build(decode_secret(&secret).unwrap(), None, String::new()).unwrap();
        let code = totp.generate_current().unwrap();
        let wrong: String = code
            .chars()
            .map(|c| if c == '0' { '1' } else { '0' })
            .collect();
        assert!(!verify(&wrong, &secret).unwrap());
    }

    #[test]
    fn uri_encodes_issuer_account_and_secret() {
        let secret = generate_secret().unwrap();
        let uri = provisioning_uri(&secret, "Gatehouse", "a@x.com").unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Gatehouse"));
        assert!(uri.contains(&secret));
    }

    #[test]
    fn bad_secret_is_an_error() {
        assert!(verify("123456", "not base32!").is_err());
    }
}
