use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::config::Config;

/// Connection timeout for the SMTP relay.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of a notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Nothing was attempted (e.g. no sender credentials).
    Skipped(String),
    /// The attempt failed; carries the underlying error text.
    Failed(String),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Delivery::Sent => None,
            Delivery::Skipped(reason) | Delivery::Failed(reason) => Some(reason),
        }
    }
}

/// Sends plain-text notification emails through an authenticated STARTTLS relay.
///
/// Every call opens its own connection and closes it afterwards.
#[derive(Clone)]
pub struct Notifier {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: Option<String>,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username: config.smtp_username.clone(),
            password: config.smtp_password.clone(),
            from: config.smtp_from.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `From` mailbox: the configured sender, else the login when it is an address, else
    /// `<login>@<relay host>`. The login itself is always used verbatim for authentication.
    pub fn sender(&self) -> anyhow::Result<Mailbox> {
        if let Some(ref from) = self.from {
            return Ok(from.parse()?);
        }
        if let Ok(mailbox) = self.username.parse::<Mailbox>() {
            return Ok(mailbox);
        }
        Ok(format!("{}@{}", self.username, self.host).parse()?)
    }

    /// Sends one email to `recipient`. Never returns an error; failures come back as
    /// [`Delivery::Failed`].
    pub async fn send(&self, subject: &str, body: &str, recipient: &str) -> Delivery {
        if !self.is_configured() {
            return Delivery::Skipped("Email credentials not configured".to_string());
        }

        match self.deliver(subject, body, recipient).await {
            Ok(()) => Delivery::Sent,
            Err(e) => Delivery::Failed(format!("{:#}", e)),
        }
    }

    async fn deliver(&self, subject: &str, body: &str, recipient: &str) -> anyhow::Result<()> {
        let from = self.sender()?;
        let to: Mailbox = recipient.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        tracing::debug!("Sending email via {}:{} to {}", self.host, self.port, recipient);
        transport.send(message).await?;

        Ok(())
    }
}
