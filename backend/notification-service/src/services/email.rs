/// Email transport for admin notifications
use crate::config::SmtpConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Sends one rendered HTML email
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP mailer (or no-op when no host is configured)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// If SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.host.trim().is_empty() {
            warn!("SMTP host not configured; admin emails will be logged only");
            None
        } else {
            let builder = if config.starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

            let builder = if let (Some(username), Some(password)) =
                (&config.username, &config.password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(subject, recipient = to, "SMTP disabled; skipping admin email");
            return Ok(());
        };

        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Transport(format!("Invalid recipient address {}: {}", to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Transport(format!("Failed to build email message: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::Transport(format!("Failed to send email: {}", e)))?;

        info!(subject, recipient = to, "admin email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> SmtpConfig {
        SmtpConfig {
            host: host.to_string(),
            port: 587,
            username: None,
            password: None,
            from: "Cinema Admin <noreply@cinema.dev>".to_string(),
            starttls: true,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_empty_host_is_noop() {
        let mailer = SmtpMailer::new(&config("")).unwrap();
        assert!(!mailer.is_enabled());
        tokio_test::assert_ok!(tokio_test::block_on(mailer.send(
            "admin@example.com",
            "subject",
            "<p>hi</p>"
        )));
    }

    #[test]
    fn test_invalid_from_is_rejected() {
        let mut cfg = config("");
        cfg.from = "not an address".to_string();
        assert!(SmtpMailer::new(&cfg).is_err());
    }
}
