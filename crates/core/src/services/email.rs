//! Transactional email delivery.
//!
//! Messages are rendered from [`EmailTemplate`] and handed to an
//! [`EmailTransport`]. Three transports exist: the Resend HTTP API, an SMTP
//! relay through `lettre`, and a log-only fallback used when nothing is
//! configured. Callers treat delivery as best effort.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use serde::{Deserialize, Serialize};
use terapie_common::{AppError, AppResult, EmailProviderKind, EmailSettings};
use tracing::{info, warn};

use super::email_template::{EmailTemplate, RenderedEmail};

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    pub html_body: String,
    /// Reply-to address (optional)
    pub reply_to: Option<String>,
}

/// Email delivery result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    /// Whether the provider accepted the message
    pub success: bool,
    /// Message ID from provider (if available)
    pub message_id: Option<String>,
    /// Error message (if refused)
    pub error: Option<String>,
}

impl EmailDeliveryResult {
    fn accepted(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    fn refused(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// Something that can deliver a rendered message.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Whether messages actually leave the process.
    fn delivers(&self) -> bool {
        true
    }

    /// Deliver a message. A refusal by the provider is `Ok` with `success = false`;
    /// transport failures are `Err`.
    async fn deliver(&self, message: &EmailMessage) -> AppResult<EmailDeliveryResult>;
}

/// Resend HTTP API transport.
pub struct ResendTransport {
    http_client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendTransport {
    const ENDPOINT: &'static str = "https://api.resend.com/emails";

    #[must_use]
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn deliver(&self, message: &EmailMessage) -> AppResult<EmailDeliveryResult> {
        let mut body = serde_json::json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "html": message.html_body,
            "text": message.text_body,
        });
        if let Some(reply_to) = &message.reply_to {
            body["reply_to"] = serde_json::Value::String(reply_to.clone());
        }

        let response = self
            .http_client
            .post(Self::ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Resend request failed: {e}")))?;

        if response.status().is_success() {
            #[derive(Deserialize)]
            struct ResendResponse {
                id: Option<String>,
            }
            let result: ResendResponse = response
                .json()
                .await
                .unwrap_or(ResendResponse { id: None });
            Ok(EmailDeliveryResult::accepted(result.id))
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult::refused(format!("{status}: {error_text}")))
        }
    }
}

/// SMTP relay transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(settings: &EmailSettings) -> AppResult<Self> {
        let host = settings
            .smtp_host
            .as_deref()
            .ok_or_else(|| AppError::Config("email.smtp_host is required for SMTP".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(settings.smtp_port);

        if let (Some(user), Some(pass)) = (&settings.smtp_username, &settings.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: sender_mailbox(settings)?,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, message: &EmailMessage) -> AppResult<EmailDeliveryResult> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone());

        if let Some(reply_to) = &message.reply_to {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid reply-to address: {e}")))?;
            builder = builder.reply_to(reply_to);
        }

        let email = builder
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        match self.transport.send(email).await {
            Ok(response) => Ok(EmailDeliveryResult::accepted(
                response.message().next().map(ToString::to_string),
            )),
            Err(e) if e.is_permanent() => Ok(EmailDeliveryResult::refused(e.to_string())),
            Err(e) => Err(AppError::Email(format!("SMTP delivery failed: {e}"))),
        }
    }
}

/// Writes messages to the log instead of sending them.
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    fn delivers(&self) -> bool {
        false
    }

    async fn deliver(&self, message: &EmailMessage) -> AppResult<EmailDeliveryResult> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text_body,
            "Email delivery disabled, message logged"
        );
        Ok(EmailDeliveryResult::accepted(None))
    }
}

fn sender_mailbox(settings: &EmailSettings) -> AppResult<Mailbox> {
    format!("{} <{}>", settings.from_name, settings.from_address)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))
}

/// Email service.
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn EmailTransport>,
    site_url: String,
    site_name: String,
    admin_address: String,
}

impl EmailService {
    /// Create a service over an explicit transport.
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        site_url: impl Into<String>,
        site_name: impl Into<String>,
        admin_address: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            site_url: site_url.into().trim_end_matches('/').to_string(),
            site_name: site_name.into(),
            admin_address: admin_address.into(),
        }
    }

    /// Build the configured transport.
    pub fn from_settings(settings: &EmailSettings, site_url: &str) -> AppResult<Self> {
        let transport: Arc<dyn EmailTransport> = match settings.provider {
            EmailProviderKind::Resend => {
                let api_key = settings.resend_api_key.clone().ok_or_else(|| {
                    AppError::Config("email.resend_api_key is required for Resend".to_string())
                })?;
                let from = format!("{} <{}>", settings.from_name, settings.from_address);
                Arc::new(ResendTransport::new(api_key, from))
            }
            EmailProviderKind::Smtp => Arc::new(SmtpTransport::new(settings)?),
            EmailProviderKind::Log => Arc::new(LogTransport),
        };

        info!(provider = transport.name(), "Email transport configured");

        Ok(Self::new(
            transport,
            site_url,
            settings.from_name.clone(),
            settings.admin_address.clone(),
        ))
    }

    /// Log-only service, used in tests and when email is not configured.
    #[must_use]
    pub fn disabled(site_url: &str) -> Self {
        Self::new(Arc::new(LogTransport), site_url, "Terapie", "contact@localhost")
    }

    /// Whether messages actually leave the process.
    #[must_use]
    pub fn delivers(&self) -> bool {
        self.transport.delivers()
    }

    /// Public site URL without trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Inbox receiving contact form submissions.
    #[must_use]
    pub fn admin_address(&self) -> &str {
        &self.admin_address
    }

    /// Absolute URL for a site path.
    #[must_use]
    pub fn link(&self, path: &str) -> String {
        format!("{}/{}", self.site_url, path.trim_start_matches('/'))
    }

    /// Send a raw message.
    pub async fn send(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let result = self.transport.deliver(&message).await?;
        if result.success {
            info!(
                provider = self.transport.name(),
                to = %message.to,
                subject = %message.subject,
                "Email sent"
            );
        } else {
            warn!(
                provider = self.transport.name(),
                to = %message.to,
                error = ?result.error,
                "Email refused by provider"
            );
        }
        Ok(result)
    }

    /// Render a template and send it.
    pub async fn send_template(
        &self,
        to: &str,
        template: &EmailTemplate,
        reply_to: Option<&str>,
    ) -> AppResult<EmailDeliveryResult> {
        let RenderedEmail {
            subject,
            text_body,
            html_body,
        } = template.render(&self.site_name, &self.site_url);

        self.send(EmailMessage {
            to: to.to_string(),
            subject,
            text_body,
            html_body,
            reply_to: reply_to.map(ToString::to_string),
        })
        .await
    }

    /// Send and swallow every failure. Used after the primary write succeeded.
    pub async fn send_best_effort(&self, to: &str, template: &EmailTemplate) {
        if let Err(e) = self.send_template(to, template, None).await {
            warn!(to = %to, kind = template.kind(), error = %e, "Notification email failed");
        }
    }
}

/// Transport that records messages in memory.
#[derive(Default)]
pub struct RecordingTransport {
    sent: std::sync::Mutex<Vec<EmailMessage>>,
    refuse: bool,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose provider refuses every message.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            sent: std::sync::Mutex::default(),
            refuse: true,
        }
    }

    /// Messages handed to the transport so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &EmailMessage) -> AppResult<EmailDeliveryResult> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        if self.refuse {
            Ok(EmailDeliveryResult::refused(
                "You can only send testing emails to your own email address".to_string(),
            ))
        } else {
            Ok(EmailDeliveryResult::accepted(Some("rec-1".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_template_uses_transport() {
        let transport = Arc::new(RecordingTransport::new());
        let service = EmailService::new(
            transport.clone(),
            "https://terapie.ro/",
            "Terapie",
            "contact@terapie.ro",
        );

        let result = service
            .send_template(
                "ana@example.com",
                &EmailTemplate::PasswordReset {
                    name: "Ana".to_string(),
                    url: "https://terapie.ro/reset?token=x".to_string(),
                },
                Some("office@terapie.ro"),
            )
            .await
            .unwrap();

        assert!(result.success);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("office@terapie.ro"));
        assert!(sent[0].html_body.contains("https://terapie.ro/reset?token=x"));
    }

    #[tokio::test]
    async fn test_refusal_is_not_an_error() {
        let service = EmailService::new(
            Arc::new(RecordingTransport::refusing()),
            "https://terapie.ro",
            "Terapie",
            "contact@terapie.ro",
        );

        let result = service
            .send(EmailMessage {
                to: "x@example.com".to_string(),
                subject: "s".to_string(),
                text_body: "t".to_string(),
                html_body: "<p>t</p>".to_string(),
                reply_to: None,
            })
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_link_joins_paths() {
        let service = EmailService::disabled("https://terapie.ro/");
        assert_eq!(service.link("/auth/login"), "https://terapie.ro/auth/login");
        assert_eq!(service.link("dashboard"), "https://terapie.ro/dashboard");
        assert!(!service.delivers());
    }

    #[test]
    fn test_smtp_requires_host() {
        let settings = EmailSettings {
            provider: EmailProviderKind::Smtp,
            ..EmailSettings::default()
        };
        assert!(matches!(
            EmailService::from_settings(&settings, "http://localhost"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_resend_requires_api_key() {
        let settings = EmailSettings {
            provider: EmailProviderKind::Resend,
            ..EmailSettings::default()
        };
        assert!(matches!(
            EmailService::from_settings(&settings, "http://localhost"),
            Err(AppError::Config(_))
        ));
    }
}
