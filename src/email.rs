//! SMTP delivery of alert reports

use crate::config::EmailConfig;
use crate::error::WindWatchError;
use crate::report::Report;
use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::{
    Message, Transport, transport::smtp::SmtpTransport,
    transport::smtp::authentication::Credentials,
};

/// Accepts rendered reports for delivery.
///
/// The scheduler treats delivery failures as operator-log material, so
/// implementations report them as errors but must never panic.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, report: &Report) -> crate::Result<()>;
}

// Mail-client priority headers set on urgent alerts
macro_rules! priority_header {
    ($header:ident, $name:literal, $value:literal) => {
        #[derive(Clone)]
        struct $header;

        impl Header for $header {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($name)
            }

            fn parse(_s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Self)
            }

            fn display(&self) -> HeaderValue {
                HeaderValue::new(Self::name(), $value.to_string())
            }
        }
    };
}

priority_header!(Priority, "Priority", "Urgent");
priority_header!(Importance, "Importance", "high");
priority_header!(XPriority, "X-Priority", "1");
priority_header!(XMsMailPriority, "X-MSMail-Priority", "high");

/// Sends alert reports over authenticated SMTP
pub struct SmtpAlertSink {
    config: EmailConfig,
}

impl SmtpAlertSink {
    #[must_use]
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn mailer(&self) -> crate::Result<SmtpTransport> {
        let credentials = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let mailer = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| WindWatchError::email(format!("invalid SMTP relay: {e}")))?
            .credentials(credentials)
            .build();

        Ok(mailer)
    }

    fn build_message(&self, report: &Report) -> crate::Result<Message> {
        let from = format!("WindWatch <{}>", self.config.from_address)
            .parse()
            .map_err(|e| WindWatchError::email(format!("invalid from address: {e}")))?;
        let to = self
            .config
            .recipient
            .parse()
            .map_err(|e| WindWatchError::email(format!("invalid recipient address: {e}")))?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(report.subject.clone())
            .header(ContentType::TEXT_HTML);

        if report.high_priority {
            builder = builder
                .header(Priority)
                .header(Importance)
                .header(XPriority)
                .header(XMsMailPriority);
        }

        builder
            .body(report.html.clone())
            .map_err(|e| WindWatchError::email(format!("failed to build message: {e}")))
    }
}

#[async_trait]
impl AlertSink for SmtpAlertSink {
    async fn send(&self, report: &Report) -> crate::Result<()> {
        let email = self.build_message(report)?;
        let mailer = self.mailer()?;

        mailer
            .send(&email)
            .map_err(|e| WindWatchError::email(format!("failed to send alert: {e}")))?;

        tracing::info!(
            subject = %report.subject,
            recipient = %self.config.recipient,
            "alert email sent"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> SmtpAlertSink {
        SmtpAlertSink::new(EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "windwatch".to_string(),
            smtp_password: "secret".to_string(),
            from_address: "no-reply@example.com".to_string(),
            recipient: "pilot@example.com".to_string(),
        })
    }

    fn report(high_priority: bool) -> Report {
        Report {
            subject: "test alert".to_string(),
            html: "<div>windy</div>".to_string(),
            high_priority,
        }
    }

    #[test]
    fn test_urgent_reports_carry_priority_headers() {
        let message = sink().build_message(&report(true)).unwrap();
        let headers = message.headers().to_string();
        assert!(headers.contains("X-Priority: 1"));
        assert!(headers.contains("Importance: high"));
        assert!(headers.contains("X-MSMail-Priority: high"));
    }

    #[test]
    fn test_routine_reports_are_plain() {
        let message = sink().build_message(&report(false)).unwrap();
        let headers = message.headers().to_string();
        assert!(!headers.contains("X-Priority"));
        assert!(headers.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_invalid_recipient_is_an_email_error() {
        let mut bad = sink();
        bad.config.recipient = "not-an-address".to_string();
        let result = bad.build_message(&report(false));
        assert!(matches!(result, Err(WindWatchError::Email { .. })));
    }
}
