use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{MailError, MailService, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory provider used when no account is configured.
#[derive(Debug, Default)]
pub struct DemoMailService {
    inbox: Mutex<Vec<Message>>,
    sent: Mutex<Vec<SentMessage>>,
    fail_next: Mutex<Option<String>>,
}

impl DemoMailService {
    pub fn new(inbox: Vec<Message>) -> Self {
        Self {
            inbox: Mutex::new(inbox),
            sent: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    pub fn seeded() -> Self {
        let now = Utc::now();
        let seed = [
            (
                "Alice Example <alice@example.com>",
                "Welcome to vimail",
                "Hi there,\n\nThis inbox is running against the demo provider.\nPress c to compose, r to reply, enter to read.\n\nAlice",
                true,
            ),
            (
                "Bob Builder <bob@example.com>",
                "Re: Weekend plans",
                "Saturday works for me.\n\n> Are you free this weekend?",
                false,
            ),
            (
                "carol@example.com",
                "Quarterly report",
                "The numbers are in. Revenue grew across every region this quarter, with the strongest gains in the north where the new distribution partnership started paying off earlier than planned.\n\nFull details attached to the shared drive.",
                false,
            ),
            ("newsletter@example.com", "(no subject)", "", false),
        ];
        let inbox = seed
            .iter()
            .enumerate()
            .map(|(idx, (from, subject, body, unread))| Message {
                id: format!("demo-{}", idx + 1),
                thread_id: format!("demo-thread-{}", idx + 1),
                from: from.to_string(),
                to: "me@example.com".to_string(),
                subject: subject.to_string(),
                date: now - Duration::hours(idx as i64 * 7),
                body: body.to_string(),
                unread: *unread,
            })
            .collect();
        Self::new(inbox)
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// The next provider call fails with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        if let Ok(mut guard) = self.fail_next.lock() {
            *guard = Some(reason.into());
        }
    }

    fn take_failure(&self) -> Option<String> {
        self.fail_next.lock().ok().and_then(|mut guard| guard.take())
    }
}

#[async_trait]
impl MailService for DemoMailService {
    async fn list_inbox(&self, limit: usize) -> Result<Vec<Message>, MailError> {
        if let Some(reason) = self.take_failure() {
            return Err(MailError::transport(reason));
        }
        let inbox = self
            .inbox
            .lock()
            .map_err(|_| MailError::transport("demo inbox unavailable"))?;
        Ok(inbox.iter().take(limit).cloned().collect())
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if let Some(reason) = self.take_failure() {
            return Err(MailError::transport(reason));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::transport("demo outbox unavailable"))?;
        sent.push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
