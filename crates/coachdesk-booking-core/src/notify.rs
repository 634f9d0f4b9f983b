//! Confirmation notifier
//!
//! Picks a recipient, renders the confirmation template and hands the
//! message to a [`Mailer`]. Failures are reported in [`NotificationResult`]
//! and never propagate to the booking flow.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use coachdesk_db::EmailTemplateRepository;

use crate::template::{default_template, render, render_html, EmailTemplate};

/// Placeholder addresses that are never delivered to
pub const DENY_LIST: &[&str] = &[
    "test@example.com",
    "user@example.com",
    "example@example.com",
    "email@example.com",
    "customer@example.com",
    "noreply@example.com",
    "test@test.com",
];

/// Notification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid email address: {0}")]
    InvalidFormat(String),

    #[error("placeholder email address: {0}")]
    DenyListed(String),

    #[error("no valid recipient")]
    NoRecipient,

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template lookup failed: {0}")]
    TemplateLookup(String),

    #[error("message build failed: {0}")]
    Message(String),

    #[error("smtp error: {0}")]
    Transport(String),
}

/// Trim an address and check it is deliverable
pub fn validate_email(raw: &str) -> Result<String, NotifyError> {
    let email = raw.trim();
    let invalid = || NotifyError::InvalidFormat(email.to_string());

    let address: Address = email.parse().map_err(|_| invalid())?;
    // Public domains only
    let domain = address.domain();
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }

    let lowered = email.to_ascii_lowercase();
    if DENY_LIST.contains(&lowered.as_str()) {
        return Err(NotifyError::DenyListed(email.to_string()));
    }

    Ok(email.to_string())
}

/// Possible recipients, highest priority first
#[derive(Debug, Clone, Default)]
pub struct RecipientCandidates {
    /// Email of the logged-in user's profile
    pub profile_email: Option<String>,
    /// Email reported by Stripe for the session
    pub session_email: Option<String>,
    /// Email stored on the transaction
    pub transaction_email: Option<String>,
}

impl RecipientCandidates {
    fn in_priority_order(&self) -> impl Iterator<Item = &str> {
        [
            self.profile_email.as_deref(),
            self.session_email.as_deref(),
            self.transaction_email.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// First candidate that passes [`validate_email`]
pub fn resolve_recipient(candidates: &RecipientCandidates) -> Result<String, NotifyError> {
    for candidate in candidates.in_priority_order() {
        match validate_email(candidate) {
            Ok(email) => return Ok(email),
            Err(e) => debug!(error = %e, "Skipping recipient candidate"),
        }
    }
    Err(NotifyError::NoRecipient)
}

/// Rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Outcome of a notification attempt
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResult {
    pub sent: bool,
    pub recipient: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    fn sent(recipient: String) -> Self {
        Self {
            sent: true,
            recipient: Some(recipient),
            error: None,
        }
    }

    fn failed(recipient: Option<String>, error: &NotifyError) -> Self {
        Self {
            sent: false,
            recipient,
            error: Some(error.to_string()),
        }
    }
}

/// Email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError>;
}

/// SMTP settings
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `Coaching <hello@example.org>`
    pub from: String,
    /// Use STARTTLS; disable only for local relays
    pub tls: bool,
}

/// SMTP mailer backed by lettre
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the SMTP transport. No connection is made until the first send.
    pub fn new(config: &MailerConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidFormat(format!("{}: {e}", config.from)))?;

        let mut builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidFormat(format!("{}: {e}", email.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Renders and delivers confirmation emails
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    templates: Arc<dyn EmailTemplateRepository>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, templates: Arc<dyn EmailTemplateRepository>) -> Self {
        Self { mailer, templates }
    }

    /// Persisted template for `key`, else the built-in default
    async fn template(&self, key: &str) -> Result<EmailTemplate, NotifyError> {
        match self.templates.find_by_key(key).await {
            Ok(Some(row)) => return Ok(row.into()),
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "Template lookup failed, using default"),
        }
        default_template(key).ok_or_else(|| NotifyError::TemplateNotFound(key.to_string()))
    }

    /// Send the confirmation for `template_key` to the best candidate
    #[instrument(skip(self, candidates, vars))]
    pub async fn send_confirmation(
        &self,
        template_key: &str,
        candidates: &RecipientCandidates,
        vars: HashMap<&str, String>,
    ) -> NotificationResult {
        let result = self.try_send(template_key, candidates, vars).await;
        let label = if result.sent { "sent" } else { "failed" };
        metrics::counter!(
            "booking_notifications_total",
            "template" => template_key.to_string(),
            "result" => label
        )
        .increment(1);
        result
    }

    async fn try_send(
        &self,
        template_key: &str,
        candidates: &RecipientCandidates,
        mut vars: HashMap<&str, String>,
    ) -> NotificationResult {
        let recipient = match resolve_recipient(candidates) {
            Ok(email) => email,
            Err(e) => {
                warn!(error = %e, "No deliverable recipient for confirmation");
                return NotificationResult::failed(None, &e);
            }
        };

        let template = match self.template(template_key).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Confirmation template unavailable");
                return NotificationResult::failed(Some(recipient), &e);
            }
        };

        vars.entry("customer_email").or_insert_with(|| recipient.clone());
        // Header values are not HTML, so the subject is rendered raw
        let email = OutgoingEmail {
            to: recipient.clone(),
            subject: render(&template.subject, &vars),
            html_body: render_html(&template.html_body, &vars),
        };

        match self.mailer.send(email).await {
            Ok(()) => {
                info!(to = %recipient, template = template_key, "Confirmation email sent");
                NotificationResult::sent(recipient)
            }
            Err(e) => {
                warn!(to = %recipient, error = %e, "Confirmation email failed");
                NotificationResult::failed(Some(recipient), &e)
            }
        }
    }
}
