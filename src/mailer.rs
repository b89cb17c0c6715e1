use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid mail address or message: {0}")]
    Message(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Outbound mail transport. The trait seam exists so notification logic can
/// be exercised in tests with a recording transport instead of a live SMTP
/// server.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipients: &[String])
        -> Result<(), MailError>;
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl MailConfig {
    /// Reads SMTP settings from the environment. Returns `None` when
    /// `SMTP_HOST` is unset, in which case notifications are disabled.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        let host = std::env::var("SMTP_HOST").ok()?;
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from = std::env::var("MAIL_FROM").unwrap_or_else(|_| username.clone());
        Some(MailConfig {
            host,
            username,
            password,
            from,
        })
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(SmtpMailer {
            transport,
            from: config.from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), MailError> {
        let from = self
            .from
            .parse()
            .map_err(|_| MailError::Message(format!("Invalid sender address: {}", self.from)))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in recipients {
            let mailbox = recipient
                .parse()
                .map_err(|_| MailError::Message(format!("Invalid recipient: {}", recipient)))?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .body(body.to_string())
            .map_err(|err| MailError::Message(err.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        Ok(())
    }
}

/// Stand-in transport used when no SMTP settings are configured. Logs the
/// mail instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        subject: &str,
        _body: &str,
        recipients: &[String],
    ) -> Result<(), MailError> {
        tracing::info!(
            subject = %subject,
            recipients = ?recipients,
            "SMTP not configured, logging mail instead of sending"
        );
        Ok(())
    }
}
