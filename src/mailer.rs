//! Contact Mailer: relays visitor inquiries to the site owner.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;

use crate::config::SmtpConfig;
use crate::error::MailError;

/// Inquiry submitted through the contact form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub from_name: String,
    pub from_email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// A fully formatted plain-text message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: Mailbox,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub fn format_subject(inquiry: &Inquiry) -> String {
    inquiry
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Ново запитване от {}", inquiry.from_name.trim()))
}

pub fn format_body(inquiry: &Inquiry) -> String {
    let mut body = format!(
        "Име: {}\nИмейл: {}\n",
        inquiry.from_name.trim(),
        inquiry.from_email.trim()
    );
    if let Some(phone) = inquiry.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        body.push_str(&format!("Телефон: {}\n", phone));
    }
    body.push_str(&format!("\nСъобщение:\n{}", inquiry.message));
    body
}

/// Where inquiries go: a transport plus the owner's parsed address.
#[derive(Clone)]
struct Delivery {
    transport: Arc<dyn MailTransport>,
    recipient: Mailbox,
}

#[derive(Clone)]
pub struct ContactMailer {
    delivery: Option<Delivery>,
}

impl ContactMailer {
    pub fn new(transport: Arc<dyn MailTransport>, recipient: Mailbox) -> Self {
        Self {
            delivery: Some(Delivery {
                transport,
                recipient,
            }),
        }
    }

    /// Mailer that refuses every send with `NotConfigured`.
    pub fn disabled() -> Self {
        Self { delivery: None }
    }

    /// SMTP mailer when credentials are configured, otherwise a disabled one.
    /// Both the sender and the recipient addresses are parsed here, so a
    /// bad setting fails at startup instead of on a visitor's request.
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, MailError> {
        match smtp {
            Some(config) => {
                let recipient: Mailbox = config.recipient.parse()?;
                let transport = SmtpMailTransport::new(config)?;
                Ok(Self::new(Arc::new(transport), recipient))
            }
            None => {
                tracing::warn!("SMTP_EMAIL / SMTP_PASSWORD not set; contact form is disabled");
                Ok(Self::disabled())
            }
        }
    }

    pub async fn send_inquiry(&self, inquiry: &Inquiry) -> Result<(), MailError> {
        let delivery = self.delivery.as_ref().ok_or(MailError::NotConfigured)?;

        let mail = OutgoingMail {
            to: delivery.recipient.clone(),
            reply_to: Some(inquiry.from_email.trim().to_string()),
            subject: format_subject(inquiry),
            body: format_body(inquiry),
        };

        delivery.transport.send(mail).await?;
        tracing::info!(from = %inquiry.from_email, "Contact inquiry relayed");
        Ok(())
    }
}

pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.username.parse()?,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(mail.to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN);

        // A malformed visitor address only loses the Reply-To header.
        if let Some(reply_to) = mail.reply_to.and_then(|r| r.parse::<Mailbox>().ok()) {
            builder = builder.reply_to(reply_to);
        }

        let message = builder.body(mail.body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().await.push(mail);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;

    fn inquiry(phone: Option<&str>) -> Inquiry {
        Inquiry {
            from_name: "Maria".to_string(),
            from_email: "maria@example.com".to_string(),
            phone: phone.map(str::to_string),
            message: "Need supervision for a house.".to_string(),
            subject: None,
        }
    }

    #[test]
    fn test_body_without_phone() {
        assert_eq!(
            format_body(&inquiry(None)),
            "Име: Maria\nИмейл: maria@example.com\n\nСъобщение:\nNeed supervision for a house."
        );
    }

    #[test]
    fn test_body_with_phone() {
        let body = format_body(&inquiry(Some(" 0888 123 456 ")));
        assert!(body.contains("Телефон: 0888 123 456\n"));
        assert!(body.ends_with("Съобщение:\nNeed supervision for a house."));
    }

    #[test]
    fn test_default_and_custom_subject() {
        assert_eq!(format_subject(&inquiry(None)), "Ново запитване от Maria");

        let mut custom = inquiry(None);
        custom.subject = Some("Quote".to_string());
        assert_eq!(format_subject(&custom), "Quote");
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_fails_closed() {
        let mailer = ContactMailer::disabled();
        let result = mailer.send_inquiry(&inquiry(None)).await;
        assert!(matches!(result, Err(MailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_inquiry_goes_to_fixed_recipient() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = ContactMailer::new(transport.clone(), "owner@example.com".parse().unwrap());

        mailer.send_inquiry(&inquiry(None)).await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.email.to_string(), "owner@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("maria@example.com"));
    }

    fn smtp_config(recipient: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: "site@example.com".to_string(),
            password: "secret".to_string(),
            recipient: recipient.to_string(),
        }
    }

    #[test]
    fn test_bad_recipient_is_rejected_at_startup() {
        let result = ContactMailer::from_config(Some(&smtp_config("owner-at-example")));
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_missing_smtp_config_disables_mailer() {
        let mailer = ContactMailer::from_config(None).unwrap();
        assert!(mailer.delivery.is_none());
    }
}
