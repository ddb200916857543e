pub fn render_password_reset(email: &str, reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>Hey, {email}!</p>
    <p>You requested to reset your password. Here's your password reset link:</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_template_carries_the_link() {
        let html = render_password_reset("a@x.com", "https://example.com/update-password?token=abc");
        assert!(html.contains("https://example.com/update-password?token=abc"));
        assert!(html.contains("a@x.com"));
    }
}
