//! Outbound email for verification and password-reset links
//!
//! Transactional mail is delivered through the Resend HTTP API. Sending is
//! strictly best-effort: a failed send is logged and the triggering request
//! still succeeds, so handlers spawn sends off the request path and never
//! await a delivery result.

use crate::config::MailConfig;

/// Transactional email sender
#[derive(Clone)]
pub struct Mailer {
    config: MailConfig,
    client: reqwest::Client,
}

impl Mailer {
    /// Creates a new mailer
    pub fn new(config: MailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Whether outbound mail is configured
    ///
    /// Without an API key sends are skipped with a warning, which keeps
    /// local development working without a mail account.
    pub fn is_enabled(&self) -> bool {
        !self.config.resend_api_key.is_empty()
    }

    /// Sends one email via the Resend API
    ///
    /// Failures are logged and swallowed.
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) {
        if !self.is_enabled() {
            tracing::warn!(subject = %subject, "Email not configured, skipping send");
            return;
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [to],
            "subject": subject,
            "html": html,
            "text": text,
        });

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.resend_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(to = %to, subject = %subject, "Email sent");
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(status = %status, body = %body, "Failed to send email");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send email");
            }
        }
    }

    /// Sends the email-verification link to a new (or re-requesting) user
    pub async fn send_verification_email(&self, to: &str, username: &str, verify_url: &str) {
        let (html, text) = verification_email_body(username, verify_url);
        self.send(to, "Verify your email", &html, &text).await;
    }

    /// Sends the password-reset link
    pub async fn send_password_reset_email(&self, to: &str, username: &str, reset_url: &str) {
        let (html, text) = password_reset_email_body(username, reset_url);
        self.send(to, "Reset your password", &html, &text).await;
    }
}

/// Builds the verification email (html, text)
pub fn verification_email_body(username: &str, verify_url: &str) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Welcome, {username}!</h2>
    <p>We're excited to have you on board.</p>
    <p>To get started, please verify your email address by clicking the button below:</p>
    <p>
        <a href="{verify_url}" style="display: inline-block; padding: 12px 24px; background-color: #22BC66; color: white; text-decoration: none; border-radius: 6px; font-weight: bold;">
            Verify Your Email
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">
        If you did not create an account, no further action is required.
    </p>
</body>
</html>"#
    );

    let text = format!(
        "Welcome, {username}!\n\n\
         To get started, please verify your email address:\n{verify_url}\n\n\
         If you did not create an account, no further action is required.\n"
    );

    (html, text)
}

/// Builds the password-reset email (html, text)
pub fn password_reset_email_body(username: &str, reset_url: &str) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Hi {username},</h2>
    <p>You have requested to reset your password.</p>
    <p>Click the button below to reset it:</p>
    <p>
        <a href="{reset_url}" style="display: inline-block; padding: 12px 24px; background-color: #FF5733; color: white; text-decoration: none; border-radius: 6px; font-weight: bold;">
            Reset Your Password
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">
        If you did not request a password reset, please ignore this email.
    </p>
</body>
</html>"#
    );

    let text = format!(
        "Hi {username},\n\n\
         You have requested to reset your password. Use the link below:\n{reset_url}\n\n\
         If you did not request a password reset, please ignore this email.\n"
    );

    (html, text)
}
