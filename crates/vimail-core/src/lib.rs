use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mailparse::{MailAddr, addrparse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod demo;

pub use demo::{DemoMailService, SentMessage};

pub const DEFAULT_INBOX_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub body: String,
    pub unread: bool,
}

impl Message {
    /// Name part of the sender ("Alice" for `Alice <alice@x.com>`), or the
    /// bare address when no display name is present.
    pub fn display_from(&self) -> String {
        let trimmed = self.from.trim();
        if let Some(start) = trimmed.find('<') {
            let name = trimmed[..start].trim().trim_matches('"').trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
        extract_email(trimmed)
    }

    pub fn sender_address(&self) -> String {
        extract_email(&self.from)
    }

    pub fn local_date(&self) -> DateTime<Local> {
        self.date.with_timezone(&Local)
    }
}

pub fn extract_email(input: &str) -> String {
    let trimmed = input.trim();
    if let (Some(start), Some(end)) = (trimmed.find('<'), trimmed.rfind('>')) {
        if start < end {
            return trimmed[start + 1..end].trim().to_string();
        }
    }
    trimmed.to_string()
}

pub fn reply_subject(original: &str) -> String {
    let subject = original.trim();
    if subject.to_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

/// Control characters and tabs become spaces, runs of spaces collapse to one.
pub fn sanitize_subject(subject: &str) -> String {
    let mut out = String::with_capacity(subject.len());
    let mut last_space = false;
    for ch in subject.chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        if ch == ' ' {
            if last_space {
                continue;
            }
            last_space = true;
        } else {
            last_space = false;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

/// Accepts `local@domain` with an optional display name around it.
pub fn is_valid_address(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    let Ok(list) = addrparse(trimmed) else {
        return false;
    };
    let mut addrs = list.iter();
    let (Some(MailAddr::Single(info)), None) = (addrs.next(), addrs.next()) else {
        return false;
    };
    let addr = info.addr.trim();
    let mut parts = addr.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !addr.chars().any(char::is_whitespace)
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient (To) is required")]
    MissingRecipient,
    #[error("invalid email address: {0}")]
    InvalidRecipient(String),
    #[error("subject is required")]
    MissingSubject,
    #[error("message body is required")]
    MissingBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode failed: {0}")]
pub struct DecodeError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl MailError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

#[async_trait]
pub trait MailService: Send + Sync {
    async fn list_inbox(&self, limit: usize) -> Result<Vec<Message>, MailError>;
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Turns a raw RFC 5322 message into a [`Message`]. Implementations absorb
/// body decoding failures by yielding an empty body; only unusable headers
/// are reported as [`DecodeError`].
pub trait MessageDecoder: Send + Sync {
    fn decode(&self, id: &str, raw: &[u8], unread: bool) -> Result<Message, DecodeError>;
}

fn xdg_state_dir() -> PathBuf {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
        })
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

pub fn log_path() -> PathBuf {
    xdg_state_dir().join("vimail").join("vimail.log")
}

/// Installs the debug log when `VIMAIL_LOG` is set. The terminal belongs to
/// the UI, so output only ever goes to the state-dir log file.
pub fn init_logging() {
    let Ok(directive) = std::env::var("VIMAIL_LOG") else {
        return;
    };
    let directive = match directive.trim() {
        "" | "1" | "true" => "debug".to_string(),
        other => other.to_string(),
    };
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        MailError, Message, ValidationError, extract_email, is_valid_address, reply_subject,
        sanitize_subject,
    };

    fn message(from: &str) -> Message {
        Message {
            id: "1".to_string(),
            thread_id: "1".to_string(),
            from: from.to_string(),
            to: "me@example.com".to_string(),
            subject: "Hello".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            body: String::new(),
            unread: true,
        }
    }

    #[test]
    fn display_from_prefers_name() {
        assert_eq!(message("Alice Example <alice@x.com>").display_from(), "Alice Example");
        assert_eq!(message("\"Bob\" <bob@x.com>").display_from(), "Bob");
        assert_eq!(message("carol@x.com").display_from(), "carol@x.com");
        assert_eq!(message("<dave@x.com>").display_from(), "dave@x.com");
    }

    #[test]
    fn extract_email_prefers_angle_addr() {
        assert_eq!(extract_email("Alice <alice@x.com>"), "alice@x.com");
        assert_eq!(extract_email("  bob@x.com "), "bob@x.com");
    }

    #[test]
    fn reply_subject_never_doubles_prefix() {
        assert_eq!(reply_subject("Hello"), "Re: Hello");
        assert_eq!(reply_subject("Re: Hello"), "Re: Hello");
        assert_eq!(reply_subject("RE:Hello"), "RE:Hello");
        assert_eq!(reply_subject(""), "Re: ");
    }

    #[test]
    fn sanitize_subject_collapses_whitespace() {
        assert_eq!(sanitize_subject("  a\tb\r\n  c  "), "a b c");
        assert_eq!(sanitize_subject("plain"), "plain");
        assert_eq!(sanitize_subject("\t\t"), "");
    }

    #[test]
    fn address_validation() {
        assert!(is_valid_address("alice@x.com"));
        assert!(is_valid_address("Alice <alice@x.com>"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("alice"));
        assert!(!is_valid_address("alice@"));
        assert!(!is_valid_address("@x.com"));
        assert!(!is_valid_address("a@b@c"));
    }

    #[test]
    fn validation_errors_read_as_reasons() {
        let err: MailError = ValidationError::MissingSubject.into();
        assert_eq!(err.to_string(), "subject is required");
        assert_eq!(
            MailError::transport("quota exceeded").to_string(),
            "transport error: quota exceeded"
        );
    }
}
