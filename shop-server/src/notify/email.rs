//! Outgoing email
//!
//! [`Mailer`] is the delivery seam: SES in production, the log in
//! development, an in-memory recorder in tests. Callers treat every send as
//! best-effort.

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use shared::models::{OrderStatus, TrackingEntry};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// The emails the storefront sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    OrderOtp {
        order_id: i64,
        otp: String,
        valid_minutes: i64,
    },
    OrderStatus {
        order_id: i64,
        status: OrderStatus,
        tracking: TrackingEntry,
    },
    Welcome {
        name: String,
    },
}

impl EmailTemplate {
    pub fn subject(&self) -> String {
        match self {
            EmailTemplate::OrderOtp { order_id, .. } => {
                format!("Order Confirmation OTP - {order_id}")
            }
            EmailTemplate::OrderStatus { order_id, .. } => format!("Order Update - {order_id}"),
            EmailTemplate::Welcome { .. } => "Welcome to Our Store!".to_string(),
        }
    }

    pub fn body_text(&self) -> String {
        match self {
            EmailTemplate::OrderOtp {
                order_id,
                otp,
                valid_minutes,
            } => format!(
                "Your order {order_id} has been received and requires verification.\n\n\
                 Your OTP code: {otp}\n\n\
                 Please enter this OTP to confirm your order. This code is valid for {valid_minutes} minutes.\n\
                 If you didn't place this order, please contact our support team immediately."
            ),
            EmailTemplate::OrderStatus {
                order_id,
                status,
                tracking,
            } => {
                let summary = match status {
                    OrderStatus::Pending => "Your order is awaiting confirmation.",
                    OrderStatus::Confirmed => "Your order has been confirmed and is being processed.",
                    OrderStatus::Shipped => "Your order has been shipped and is on its way to you.",
                    OrderStatus::Delivered => "Your order has been delivered successfully.",
                    OrderStatus::Cancelled => "Your order has been cancelled.",
                };
                let updated = chrono::DateTime::from_timestamp_millis(tracking.timestamp)
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default();
                format!(
                    "Your order {order_id} status has been updated.\n\n\
                     Status: {}\n{summary}\n\n\
                     Location: {}\nUpdated: {updated}\n\n\
                     You can track your order status anytime from your account dashboard.",
                    status.as_str().to_uppercase(),
                    tracking.location,
                )
            }
            EmailTemplate::Welcome { name } => format!(
                "Dear {name},\n\n\
                 Thank you for creating an account with us. We're excited to have you as part of our community!\n\n\
                 Browse our featured products and check out our latest deals.\n\
                 If you have any questions, feel free to contact our support team."
            ),
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            EmailTemplate::OrderOtp { .. } => "order_otp",
            EmailTemplate::OrderStatus { .. } => "order_status",
            EmailTemplate::Welcome { .. } => "welcome",
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &EmailTemplate) -> Result<(), MailError>;
}

/// Send on a detached task; failures are logged and dropped
pub fn send_in_background(mailer: Arc<dyn Mailer>, to: String, email: EmailTemplate) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &email).await {
            tracing::warn!(to = %to, kind = email.kind(), error = %e, "Email delivery failed");
        }
    });
}

/// AWS SES v2 delivery
pub struct SesMailer {
    ses: SesClient,
    from: String,
}

impl SesMailer {
    pub fn new(ses: SesClient, from: impl Into<String>) -> Self {
        Self {
            ses,
            from: from.into(),
        }
    }

    /// Build a client from the default AWS config chain (`SES_REGION` overrides the region)
    pub async fn from_env(from: impl Into<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(ses_region))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };
        Self::new(ses, from)
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> Result<(), MailError> {
        let subject = Content::builder()
            .data(email.subject())
            .build()
            .map_err(|e| MailError::Build(e.to_string()))?;

        let body = Body::builder()
            .text(
                Content::builder()
                    .data(email.body_text())
                    .build()
                    .map_err(|e| MailError::Build(e.to_string()))?,
            )
            .build();

        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(to = to, kind = email.kind(), "Email sent");
        Ok(())
    }
}

/// Development delivery: write the email to the log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> Result<(), MailError> {
        tracing::info!(to = to, kind = email.kind(), subject = %email.subject(), "Email (log only)");
        tracing::debug!(to = to, body = %email.body_text(), "Email body");
        Ok(())
    }
}

/// One captured send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub email: EmailTemplate,
}

/// In-memory delivery for tests; can be switched to fail every send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent OTP sent for `order_id`
    pub fn last_otp(&self, order_id: i64) -> Option<String> {
        self.sent().into_iter().rev().find_map(|s| match s.email {
            EmailTemplate::OrderOtp {
                order_id: id, otp, ..
            } if id == order_id => Some(otp),
            _ => None,
        })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("recording mailer set to fail".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to.to_string(),
                email: email.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_email_contains_code() {
        let email = EmailTemplate::OrderOtp {
            order_id: 42,
            otp: "482913".into(),
            valid_minutes: 10,
        };
        assert_eq!(email.subject(), "Order Confirmation OTP - 42");
        assert!(email.body_text().contains("482913"));
        assert!(email.body_text().contains("valid for 10 minutes"));
    }

    #[test]
    fn test_status_email_mentions_location() {
        let email = EmailTemplate::OrderStatus {
            order_id: 42,
            status: OrderStatus::Shipped,
            tracking: TrackingEntry {
                seq: 3,
                status: "Shipped".into(),
                location: "Mumbai Hub".into(),
                description: "Order status updated to shipped".into(),
                timestamp: 1_700_000_000_000,
            },
        };
        let body = email.body_text();
        assert!(body.contains("Status: SHIPPED"));
        assert!(body.contains("Mumbai Hub"));
    }

    #[tokio::test]
    async fn test_recording_mailer() {
        let mailer = RecordingMailer::new();
        mailer
            .send(
                "asha@example.com",
                &EmailTemplate::Welcome {
                    name: "Asha".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(mailer.sent().len(), 1);
        assert!(RecordingMailer::failing()
            .send("x@example.com", &EmailTemplate::Welcome { name: "X".into() })
            .await
            .is_err());
    }
}
