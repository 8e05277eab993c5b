//! Email delivery via SMTP.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// An email from a seller to a client.
#[derive(Debug, Clone)]
pub struct OutgoingEmail<'a> {
    pub to: &'a str,
    /// Seller name and address; replies go to the seller.
    pub reply_to: Option<(&'a str, &'a str)>,
    pub subject: &'a str,
    pub html: &'a str,
    pub text: Option<&'a str>,
}

/// SMTP sender.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send an email, as HTML or as HTML with a plain text alternative.
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid or delivery fails.
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    pub async fn send(&self, email: OutgoingEmail<'_>) -> Result<(), EmailError> {
        let message = build_message(&self.from_address, &email)?;
        self.mailer.send(message).await?;
        info!("Email sent");
        Ok(())
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, EmailError> {
    raw.parse()
        .map_err(|_| EmailError::InvalidAddress(raw.to_string()))
}

fn build_message(from: &str, email: &OutgoingEmail<'_>) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(email.to)?)
        .subject(email.subject);

    if let Some((name, address)) = email.reply_to {
        let address = address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(address.to_string()))?;
        builder = builder.reply_to(Mailbox::new(Some(name.to_string()), address));
    }

    let message = match email.text {
        Some(text) => builder.multipart(MultiPart::alternative_plain_html(
            text.to_string(),
            email.html.to_string(),
        ))?,
        None => builder.singlepart(SinglePart::html(email.html.to_string()))?,
    };
    Ok(message)
}
