// Outbound email over SMTP
// Sends the account verification and password reset messages

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::error::ApiError;

/// SMTP mailer shared through application state
///
/// Sends are awaited inline; a failed send fails the request so the caller
/// knows the email never went out.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    client_url: String,
}

impl Mailer {
    /// Build the transport from configuration
    ///
    /// Credentials are optional so a local debug relay (e.g. mailpit on
    /// port 1025) works without auth.
    pub fn new(config: &MailConfig, client_url: &str) -> Result<Self, ApiError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ApiError::Internal(format!("invalid SMTP configuration: {}", e)))?
            .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from.clone(),
            client_url: client_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send the email-verification message for a fresh or re-registered account
    pub async fn send_verification(&self, to: &str, username: &str, token: &str) -> Result<(), ApiError> {
        let link = format!("{}/verify-email?token={}", self.client_url, token);
        let body = format!(
            "Hi {},\n\n\
             Welcome! Please confirm your email address by opening the link below. \
             The link expires in 24 hours.\n\n{}\n\n\
             If you did not create this account, you can ignore this message.\n",
            username, link
        );
        self.send(to, "Verify your email address", body).await
    }

    /// Send the password-reset message
    pub async fn send_password_reset(&self, to: &str, username: &str, token: &str) -> Result<(), ApiError> {
        let link = format!("{}/reset-password?token={}", self.client_url, token);
        let body = format!(
            "Hi {},\n\n\
             A password reset was requested for your account. Open the link below \
             to choose a new password. The link expires in 10 minutes.\n\n{}\n\n\
             If you did not request this, you can ignore this message.\n",
            username, link
        );
        self.send(to, "Reset your password", body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), ApiError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ApiError::Internal(format!("invalid From address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| ApiError::Internal(format!("invalid recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| ApiError::Internal(format!("failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to send email: {}", e)))?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}
