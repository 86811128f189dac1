//! IMAP/SMTP provider behind the `MailService` capability.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use imap::{ClientBuilder, ConnectionMode};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message as OutgoingMessage},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vimail_core::{MailError, MailService, Message, MessageDecoder};

mod decode;

pub use decode::MailparseDecoder;

const INBOX: &str = "INBOX";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapConfig {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub skip_tls_verify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    #[serde(default)]
    pub skip_tls_verify: bool,
}

fn default_imap_port() -> u16 {
    993
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Clone)]
pub struct ImapSmtpService {
    imap: ImapConfig,
    smtp: SmtpConfig,
    decoder: Arc<dyn MessageDecoder>,
}

impl ImapSmtpService {
    pub fn new(imap: ImapConfig, smtp: SmtpConfig) -> Self {
        Self::with_decoder(imap, smtp, Arc::new(MailparseDecoder))
    }

    pub fn with_decoder(
        imap: ImapConfig,
        smtp: SmtpConfig,
        decoder: Arc<dyn MessageDecoder>,
    ) -> Self {
        Self {
            imap,
            smtp,
            decoder,
        }
    }
}

#[async_trait]
impl MailService for ImapSmtpService {
    async fn list_inbox(&self, limit: usize) -> Result<Vec<Message>, MailError> {
        let imap = self.imap.clone();
        let decoder = self.decoder.clone();
        let joined =
            tokio::task::spawn_blocking(move || fetch_inbox(&imap, limit, decoder.as_ref()))
                .await
                .map_err(|err| MailError::transport(err.to_string()))?;
        joined.map_err(|err| MailError::transport(err.to_string()))
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        send_smtp(&self.smtp, to, subject, body)
            .await
            .map_err(|err| MailError::transport(err.to_string()))
    }
}

fn imap_connect(imap: &ImapConfig) -> Result<imap::Session<imap::Connection>> {
    debug!(host = %imap.host, port = imap.port, "imap connect");
    let client = ClientBuilder::new(imap.host.as_str(), imap.port)
        .tls_kind(imap::TlsKind::Native)
        .mode(ConnectionMode::AutoTls)
        .danger_skip_tls_verify(imap.skip_tls_verify)
        .connect()?;
    let session = client
        .login(&imap.username, &imap.password)
        .map_err(|e| e.0)?;
    debug!("imap login ok");
    Ok(session)
}

fn fetch_inbox(
    imap: &ImapConfig,
    limit: usize,
    decoder: &dyn MessageDecoder,
) -> Result<Vec<Message>> {
    let mut session = imap_connect(imap)?;
    let mailbox = session.select(INBOX)?;
    debug!(exists = mailbox.exists, "imap inbox selected");
    if mailbox.exists == 0 || limit == 0 {
        let _ = session.logout();
        return Ok(Vec::new());
    }
    let mut uids: Vec<u32> = session.uid_search("ALL")?.into_iter().collect();
    uids.sort_unstable_by(|a, b| b.cmp(a));
    uids.truncate(limit);
    if uids.is_empty() {
        let _ = session.logout();
        return Ok(Vec::new());
    }
    let uid_set = uids
        .iter()
        .map(|uid| uid.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let fetches = session.uid_fetch(uid_set, "(UID FLAGS BODY.PEEK[])")?;
    let mut messages = Vec::with_capacity(uids.len());
    for fetch in fetches.iter() {
        let Some(uid) = fetch.uid else {
            continue;
        };
        let Some(raw) = fetch.body() else {
            continue;
        };
        let unread = !fetch
            .flags()
            .iter()
            .any(|f| matches!(f, imap::types::Flag::Seen));
        match decoder.decode(&uid.to_string(), raw, unread) {
            Ok(message) => messages.push(message),
            Err(err) => debug!(uid, %err, "skipping undecodable message"),
        }
    }
    let _ = session.logout();
    messages.sort_by(|a, b| b.date.cmp(&a.date));
    debug!(count = messages.len(), "imap inbox fetched");
    Ok(messages)
}

async fn send_smtp(smtp: &SmtpConfig, to: &str, subject: &str, body: &str) -> Result<()> {
    let from_addr = parse_mailbox(&smtp.from)?;
    let to_addr = parse_mailbox(to)?;
    let email = OutgoingMessage::builder()
        .from(from_addr)
        .to(to_addr)
        .subject(subject)
        .body(body.to_string())?;

    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let mut tls_builder = TlsParameters::builder(smtp.host.clone());
    if smtp.skip_tls_verify {
        tls_builder = tls_builder
            .dangerous_accept_invalid_certs(true)
            .dangerous_accept_invalid_hostnames(true);
    }
    let tls_parameters = tls_builder.build()?;
    let tls = if smtp.port == 465 {
        Tls::Wrapper(tls_parameters)
    } else {
        Tls::Required(tls_parameters)
    };
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        .port(smtp.port)
        .tls(tls)
        .credentials(creds)
        .build();

    debug!(host = %smtp.host, port = smtp.port, "smtp send");
    mailer
        .send(email)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

fn parse_mailbox(input: &str) -> Result<Mailbox> {
    let trimmed = input.trim();
    if let (Some(start), Some(end)) = (trimmed.find('<'), trimmed.rfind('>')) {
        if start < end {
            let name = trimmed[..start].trim().trim_matches('"');
            let addr = trimmed[start + 1..end].trim();
            let name = (!name.is_empty()).then(|| name.to_string());
            return Ok(Mailbox::new(name, addr.parse()?));
        }
    }
    Ok(Mailbox::new(None, trimmed.parse()?))
}

#[cfg(test)]
mod tests {
    use super::{ImapConfig, SmtpConfig, parse_mailbox};

    #[test]
    fn parse_mailbox_handles_display_names() -> anyhow::Result<()> {
        let mailbox = parse_mailbox("Alice Example <alice@example.com>")?;
        assert_eq!(mailbox.name.as_deref(), Some("Alice Example"));
        assert_eq!(mailbox.email.to_string(), "alice@example.com");

        let bare = parse_mailbox(" bob@example.com ")?;
        assert_eq!(bare.name, None);
        assert_eq!(bare.email.to_string(), "bob@example.com");

        assert!(parse_mailbox("not an address").is_err());
        Ok(())
    }

    #[test]
    fn config_ports_default() -> anyhow::Result<()> {
        let imap: ImapConfig = toml::from_str(
            "host = \"imap.example.com\"\nusername = \"me\"\npassword = \"pw\"\n",
        )?;
        assert_eq!(imap.port, 993);
        assert!(!imap.skip_tls_verify);
        let smtp: SmtpConfig = toml::from_str(
            "host = \"smtp.example.com\"\nusername = \"me\"\npassword = \"pw\"\nfrom = \"me@example.com\"\n",
        )?;
        assert_eq!(smtp.port, 587);
        Ok(())
    }
}
