//! Passcode email delivery.
//!
//! Delivery sits behind the [`Mailer`] trait so the handlers never care
//! whether mail goes over SMTP or, in tests, nowhere at all. The SMTP
//! transport is verified once at startup; a failure there is logged and
//! the server keeps going.

use crate::cli::globals::GlobalArgs;
use crate::otp::OtpAction;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use tracing::instrument;

/// Email delivery abstraction used by the issuance handler.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error so the handler can report
    /// the dispatch failure.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;

    /// Probe the transport once at startup.
    async fn verify_connection(&self) -> Result<()>;
}

/// Subject and HTML body for a passcode email.
#[must_use]
pub fn otp_message(action: OtpAction, code: &str, expiry_minutes: u64) -> (String, String) {
    let (purpose, prompt) = match action {
        OtpAction::Verify => ("Email Verification", "verify your email"),
        OtpAction::Reset => ("Password Reset", "reset your password"),
    };

    let subject = format!("Your OTP for {purpose}");

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Your One-Time Password (OTP)</h2>
  <p>Use this code to {prompt}:</p>
  <div style="font-size: 24px; font-weight: bold; margin: 20px 0;">{code}</div>
  <p><small>This OTP expires in {expiry_minutes} minutes.</small></p>
</div>"#
    );

    (subject, html)
}

/// SMTP transport, implicit TLS on port 465 and STARTTLS otherwise.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let credentials = Credentials::new(
            globals.smtp_user.clone(),
            globals.smtp_password.expose_secret().to_string(),
        );

        let builder = if globals.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&globals.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&globals.smtp_host)?
        };

        let transport = builder
            .port(globals.smtp_port)
            .credentials(credentials)
            .build();

        let from: Mailbox = globals.mail_from.parse().map_err(|err| {
            anyhow!("Error parsing From mailbox {}: {err}", globals.mail_from)
        })?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, html))]
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        self.transport.send(message).await?;

        Ok(())
    }

    async fn verify_connection(&self) -> Result<()> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(anyhow!("SMTP server rejected the connection"))
        }
    }
}
