/// Email dispatcher
///
/// Thin client for an HTTP email API. Carries the OTP to the user's
/// address; dispatch failure is a hard error for the registration call but
/// never rolls back the already-persisted account row.

use serde::Serialize;

use crate::configuration::EmailSettings;
use crate::error::{AppError, UpstreamError};

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    sender: String,
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(settings: &EmailSettings, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            sender: settings.sender.clone(),
        }
    }

    pub fn from_settings(settings: &EmailSettings) -> Self {
        Self::new(settings, reqwest::Client::new())
    }

    /// Send the verification code to a registrant.
    ///
    /// With no API key configured, delivery is skipped and logged; the code
    /// is still persisted and verifiable.
    pub async fn send_verification_code(
        &self,
        recipient: &str,
        username: &str,
        code: &str,
    ) -> Result<(), AppError> {
        if self.api_key.is_empty() {
            tracing::warn!(
                username = %username,
                "Email delivery disabled (no API key configured); skipping dispatch"
            );
            return Ok(());
        }

        let url = format!("{}/emails", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject: "Verify your email address".to_string(),
            html: verification_email_html(username, code),
        };

        self.http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach email service: {}", e);
                AppError::Upstream(UpstreamError::EmailDispatch(e.to_string()))
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                AppError::Upstream(UpstreamError::EmailDispatch(e.to_string()))
            })?;

        tracing::info!(username = %username, "Verification email dispatched");
        Ok(())
    }
}

fn verification_email_html(username: &str, code: &str) -> String {
    format!(
        r#"
        <h1>Hello {},</h1>
        <p>Use the code below to verify your email address:</p>
        <h2>{}</h2>
        <p>This code will expire in 1 hour.</p>
        <p>If you did not request this, you can safely ignore this email.</p>
        "#,
        username, code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_body_carries_code_and_username() {
        let html = verification_email_html("alice", "123456");

        assert!(html.contains("alice"));
        assert!(html.contains("123456"));
        assert!(html.contains("1 hour"));
    }
}
