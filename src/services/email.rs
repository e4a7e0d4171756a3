use crate::config::email::EmailConfig;
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// An "email a friend" message for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    pub subject: String,
    pub body: String,
}

impl ShareMessage {
    pub fn new(sender_name: &str, title: &str, article_url: &str, comments: &str) -> Self {
        Self {
            subject: format!("{} recommends you read {}", sender_name, title),
            body: format!(
                "Read {} at {}\n\n{}'s comments: {}",
                title, article_url, sender_name, comments
            ),
        }
    }
}

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. If SMTP is not configured, email
    /// sending is skipped.
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::disabled();
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build())
        {
            Ok(t) => Self {
                transport: Some(t),
                from_address: Some(cfg.from_address),
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: None,
        }
    }

    /// Returns true if SMTP is configured and available.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Deliver a share. Returns `Ok(false)` when SMTP is not configured.
    pub async fn send_share(
        &self,
        to: &str,
        reply_to: Option<&str>,
        message: &ShareMessage,
    ) -> Result<bool> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping share to {to}");
            return Ok(false);
        };

        let from_mailbox = parse_mailbox(from_address)?;
        let to_mailbox = parse_mailbox(to)?;

        let mut builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }
        let email = builder.body(message.body.clone())?;

        transport.send(email).await?;
        tracing::info!("Share email sent to {to}: {}", message.subject);
        Ok(true)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid address '{}': {}", address, e)
        })
}
