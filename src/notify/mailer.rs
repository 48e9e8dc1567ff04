use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};
use crate::notify::report::ForecastReport;
use crate::notify::MailError;

/// Opens a session against a mail server.
pub trait MailConnector {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn MailSession>, MailError>;
}

pub trait MailSession {
    fn send(&mut self, message: &Message) -> Result<(), MailError>;
}

/// Implicit-TLS SMTP with login credentials.
pub struct SmtpConnector {
    credentials: Credentials,
}

impl SmtpConnector {
    pub fn new(username: String, password: String) -> Self {
        Self {
            credentials: Credentials::new(username, password),
        }
    }
}

impl MailConnector for SmtpConnector {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn MailSession>, MailError> {
        let transport = SmtpTransport::relay(host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(port)
            .credentials(self.credentials.clone())
            .build();

        Ok(Box::new(SmtpSession { transport }))
    }
}

struct SmtpSession {
    transport: SmtpTransport,
}

impl MailSession for SmtpSession {
    fn send(&mut self, message: &Message) -> Result<(), MailError> {
        self.transport
            .send(message)
            .map(|_| ())
            .map_err(|e| MailError::Smtp(e.to_string()))
    }
}

pub struct Notifier<C: MailConnector> {
    connector: C,
    host: String,
    port: u16,
    sender: String,
    subject: String,
}

impl<C: MailConnector> Notifier<C> {
    pub fn new(connector: C, host: impl Into<String>, port: u16, sender: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            connector,
            host: host.into(),
            port,
            sender: sender.into(),
            subject: subject.into(),
        }
    }

    /// Mail the report to each recipient over its own connection.
    /// Stops at the first failure; returns the number of messages sent.
    pub fn send_report(&self, report: &ForecastReport, recipients: &[String]) -> Result<usize, MailError> {
        let from = parse_mailbox(&self.sender)?;
        let html = report.render_html();
        let mut sent = 0;

        for recipient in recipients {
            if let Err(e) = self.send_one(&from, recipient, &html) {
                error!("Failed to send email to {}: {}", recipient, e);
                return Err(e);
            }
            info!("Email sent successfully to {}", recipient);
            sent += 1;
        }

        Ok(sent)
    }

    fn send_one(&self, from: &Mailbox, recipient: &str, html: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        let mut session = self.connector.connect(&self.host, self.port)?;
        session.send(&message)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|e| MailError::Address(format!("{}: {}", address, e)))
}
