use async_trait::async_trait;
use tracing::info;

use crate::domain::user::errors::MailerError;
use crate::domain::user::ports::Mailer;

/// Mailer that records the handoff instead of speaking SMTP.
///
/// The delivery transport lives outside this service; this adapter is the
/// seam where it plugs in.
pub struct LoggingMailer {
    from_address: String,
}

impl LoggingMailer {
    pub fn new(from_address: String) -> Self {
        Self { from_address }
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send_verification_code(
        &self,
        recipient: &str,
        code: u32,
    ) -> Result<(), MailerError> {
        info!(
            from = %self.from_address,
            to = %recipient,
            code,
            "Dispatching verification code email"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_never_fails() {
        let mailer = LoggingMailer::new("no-reply@localhost".to_string());
        assert!(mailer
            .send_verification_code("user@example.com", 123_456)
            .await
            .is_ok());
    }
}
