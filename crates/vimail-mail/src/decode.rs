use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::debug;

use vimail_core::{DecodeError, Message, MessageDecoder};

const HTML_WRAP_COLS: usize = 80;

/// `mailparse` + `html2text` decoder: plain text wins, HTML is stripped as a
/// fallback, and an unreadable body decodes to an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailparseDecoder;

impl MessageDecoder for MailparseDecoder {
    fn decode(&self, id: &str, raw: &[u8], unread: bool) -> Result<Message, DecodeError> {
        let parsed = mailparse::parse_mail(raw).map_err(|e| DecodeError(e.to_string()))?;
        let headers = &parsed.headers;
        let from = headers.get_first_value("From").unwrap_or_default();
        let to = headers.get_first_value("To").unwrap_or_default();
        let subject = headers
            .get_first_value("Subject")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "(no subject)".to_string());
        let date = headers
            .get_first_value("Date")
            .and_then(|raw| mailparse::dateparse(&raw).ok())
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_default();
        let thread_id = thread_id(&parsed).unwrap_or_else(|| id.to_string());
        let body = match select_body(&parsed) {
            Ok(body) => normalize_display_text(&body),
            Err(err) => {
                debug!(id, %err, "body decode failed, using empty body");
                String::new()
            }
        };
        Ok(Message {
            id: id.to_string(),
            thread_id,
            from: from.trim().to_string(),
            to: to.trim().to_string(),
            subject,
            date,
            body,
            unread,
        })
    }
}

fn thread_id(parsed: &ParsedMail) -> Option<String> {
    let headers = &parsed.headers;
    let first_id = |value: String| {
        value
            .split_whitespace()
            .next()
            .map(|token| token.trim_matches(|c| c == '<' || c == '>').to_string())
            .filter(|token| !token.is_empty())
    };
    headers
        .get_first_value("References")
        .and_then(first_id)
        .or_else(|| headers.get_first_value("In-Reply-To").and_then(first_id))
        .or_else(|| headers.get_first_value("Message-ID").and_then(first_id))
}

fn select_body(parsed: &ParsedMail) -> Result<String, mailparse::MailParseError> {
    if parsed.subparts.is_empty() {
        let body = parsed.get_body()?;
        if parsed.ctype.mimetype.eq_ignore_ascii_case("text/html") {
            return Ok(html_to_text(&body));
        }
        return Ok(body);
    }
    let mut text_plain: Option<String> = None;
    let mut text_html: Option<String> = None;
    walk_parts(parsed, &mut |part| {
        let ctype = part.ctype.mimetype.to_lowercase();
        if ctype == "text/plain" && text_plain.is_none() {
            if let Ok(body) = part.get_body() {
                text_plain = Some(body);
            }
        }
        if ctype == "text/html" && text_html.is_none() {
            if let Ok(body) = part.get_body() {
                text_html = Some(body);
            }
        }
    });
    if let Some(text) = text_plain {
        return Ok(text);
    }
    Ok(text_html.map(|html| html_to_text(&html)).unwrap_or_default())
}

fn walk_parts<'a>(part: &'a ParsedMail<'a>, visit: &mut impl FnMut(&'a ParsedMail<'a>)) {
    visit(part);
    for sub in &part.subparts {
        walk_parts(sub, visit);
    }
}

fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), HTML_WRAP_COLS)
}

fn normalize_display_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out: Vec<&str> = Vec::new();
    let mut prev_blank = false;
    for line in normalized.split('\n') {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        prev_blank = blank;
        out.push(if blank { "" } else { line.trim_end() });
    }
    out.join("\n")
}
