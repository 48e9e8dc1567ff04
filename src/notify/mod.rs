pub mod mailer;
pub mod recipients;
pub mod report;

pub use mailer::{Notifier, SmtpConnector};
pub use report::ForecastReport;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Recipient list error: {0}")]
    Recipients(String),

    #[error("Invalid email address {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(String),
}
