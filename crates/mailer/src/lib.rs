//! Outgoing mail.
//!
//! Messages go out over SMTP. An HTTP relay (JSON POST to a configured
//! endpoint) is available for hosted mail APIs, and a log-only transport
//! records messages in memory when nothing is configured.

use std::sync::{Mutex, PoisonError};

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail relay rejected the message ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("cannot build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Connection parameters for [`Mailer::smtp`].
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// STARTTLS is required when `true`; plaintext otherwise.
    pub tls: bool,
    pub credentials: Option<(String, String)>,
}

#[derive(Debug)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Body posted to the relay endpoint.
#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug)]
pub struct RelayTransport {
    client: Client,
    endpoint: String,
    from: String,
    api_key: Option<String>,
}

impl RelayTransport {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let mut req = self.client.post(&self.endpoint).json(&RelayMessage {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = resp
            .text()
            .await
            .unwrap_or_else(|_| "relay error".to_string());
        Err(MailError::Rejected { status, message })
    }
}

#[derive(Debug, Default)]
pub struct LogTransport {
    sent: Mutex<Vec<Email>>,
}

#[derive(Debug)]
pub enum Mailer {
    Smtp(SmtpTransport),
    Relay(RelayTransport),
    Log(LogTransport),
}

impl Mailer {
    /// SMTP transport sending as `from`.
    pub fn smtp(config: SmtpConfig, from: &str) -> Result<Self, MailError> {
        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
        };
        let mut builder = builder.port(config.port);
        if let Some((username, password)) = config.credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self::Smtp(SmtpTransport {
            transport: builder.build(),
            from: from.parse()?,
        }))
    }

    /// Relay transport posting to `endpoint`, optionally authenticated with a
    /// bearer token.
    pub fn relay(
        client: Client,
        endpoint: impl Into<String>,
        from: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self::Relay(RelayTransport {
            client,
            endpoint: endpoint.into(),
            from: from.into(),
            api_key,
        })
    }

    pub fn log() -> Self {
        Self::Log(LogTransport::default())
    }

    /// Sends a verification email. Errors from the transport are returned
    /// to the caller unchanged.
    pub async fn send_verification_email(&self, email: &Email) -> Result<(), MailError> {
        match self {
            Self::Smtp(smtp) => {
                smtp.send(email).await?;
                tracing::info!("verification email sent to {} over smtp", email.to);
            }
            Self::Relay(relay) => {
                relay.send(email).await?;
                tracing::info!("verification email relayed to {}", email.to);
            }
            Self::Log(log) => {
                tracing::info!(
                    "verification email for {} (log transport): {}",
                    email.to,
                    email.subject
                );
                log.sent
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(email.clone());
            }
        }
        Ok(())
    }

    /// Messages recorded by the log transport. Always empty for the others.
    pub fn sent(&self) -> Vec<Email> {
        match self {
            Self::Smtp(_) | Self::Relay(_) => Vec::new(),
            Self::Log(log) => log
                .sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Builds the account verification message pointing at `link`.
pub fn verification_email(to: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Verify your email address".to_string(),
        html: format!(
            "<p>Welcome!</p>\
             <p>Please confirm your email address by following \
             <a href=\"{link}\">this link</a>.</p>\
             <p>If you did not create an account you can ignore this message.</p>"
        ),
    }
}
