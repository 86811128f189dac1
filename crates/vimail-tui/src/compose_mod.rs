use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use tracing::{debug, info};

use vimail_core::{
    MailError, Message, ValidationError, is_valid_address, reply_subject, sanitize_subject,
};

use super::app_mod::{Key, SubView};
use super::task_mod::{Submission, Task};
use super::text_buffer_mod::TextBuffer;
use super::util_mod::{char_len, hard_wrap_spans, slice_chars, with_cursor};

/// To, blank, Subject, blank and the body label.
const FORM_HEADER_ROWS: usize = 5;
const BODY_INDENT: &str = "  ";
const MIN_BODY_ROWS: usize = 3;
const LABEL_COLS: usize = 10;
const REPLY_DATE_FORMAT: &str = "%a, %b %-d, %Y at %-I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComposeFocus {
    To,
    Subject,
    Body,
}

impl ComposeFocus {
    fn next(self) -> Self {
        match self {
            ComposeFocus::To => ComposeFocus::Subject,
            ComposeFocus::Subject => ComposeFocus::Body,
            ComposeFocus::Body => ComposeFocus::To,
        }
    }

    fn prev(self) -> Self {
        match self {
            ComposeFocus::To => ComposeFocus::Body,
            ComposeFocus::Subject => ComposeFocus::To,
            ComposeFocus::Body => ComposeFocus::Subject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Pending,
    Sent,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Editing,
    Sending,
}

pub(crate) struct ComposerView {
    to: TextBuffer,
    subject: TextBuffer,
    body: TextBuffer,
    focus: ComposeFocus,
    outcome: Outcome,
    phase: Phase,
    width: u16,
    height: u16,
}

impl Default for ComposerView {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerView {
    pub(crate) fn new() -> Self {
        Self {
            to: TextBuffer::new(),
            subject: TextBuffer::new(),
            body: TextBuffer::new(),
            focus: ComposeFocus::To,
            outcome: Outcome::Pending,
            phase: Phase::Editing,
            width: 0,
            height: 0,
        }
    }

    /// Form pre-filled to answer `original`, focus on the body above the quote.
    pub(crate) fn reply(original: &Message) -> Self {
        let mut body = vec![
            String::new(),
            String::new(),
            format!(
                "On {}, {} wrote:",
                original.local_date().format(REPLY_DATE_FORMAT),
                original.display_from()
            ),
            String::new(),
        ];
        body.extend(
            original
                .body
                .trim_end()
                .split('\n')
                .map(|line| format!("> {}", line.trim_end_matches('\r'))),
        );

        let mut to = TextBuffer::from_text(&original.sender_address());
        to.move_cursor_to_end_of_text();
        let mut subject = TextBuffer::from_text(&reply_subject(&original.subject));
        subject.move_cursor_to_end_of_text();

        Self {
            to,
            subject,
            body: TextBuffer::from_lines(body),
            focus: ComposeFocus::Body,
            ..Self::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn focus(&self) -> ComposeFocus {
        self.focus
    }

    pub(crate) fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn to_text(&self) -> String {
        self.to.text()
    }

    #[cfg(test)]
    pub(crate) fn subject_text(&self) -> String {
        self.subject.text()
    }

    #[cfg(test)]
    pub(crate) fn body(&self) -> &TextBuffer {
        &self.body
    }

    fn focused_mut(&mut self) -> &mut TextBuffer {
        match self.focus {
            ComposeFocus::To => &mut self.to,
            ComposeFocus::Subject => &mut self.subject,
            ComposeFocus::Body => &mut self.body,
        }
    }

    fn set_focus(&mut self, focus: ComposeFocus) {
        self.focus = focus;
        self.focused_mut().move_cursor_to_end_of_text();
    }

    pub(crate) fn submission(&self) -> Result<Submission, ValidationError> {
        let to = self.to.text().trim().to_string();
        if to.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        if !is_valid_address(&to) {
            return Err(ValidationError::InvalidRecipient(to));
        }
        let subject = sanitize_subject(&self.subject.text());
        if subject.is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        let body = self.body.text();
        if body.trim().is_empty() {
            return Err(ValidationError::MissingBody);
        }
        Ok(Submission { to, subject, body })
    }

    fn submit(&mut self) -> Option<Task> {
        match self.submission() {
            Ok(submission) => {
                info!(to = %submission.to, "sending message");
                self.phase = Phase::Sending;
                self.outcome = Outcome::Pending;
                Some(Task::Send(submission))
            }
            Err(err) => {
                debug!(%err, "compose validation failed");
                self.outcome = Outcome::Failed(err.to_string());
                None
            }
        }
    }

    pub(crate) fn on_send_finished(&mut self, result: Result<(), MailError>) {
        if self.phase != Phase::Sending {
            debug!("send completion ignored, composer not sending");
            return;
        }
        self.phase = Phase::Editing;
        self.outcome = match result {
            Ok(()) => Outcome::Sent,
            Err(err) => {
                info!(%err, "send failed");
                Outcome::Failed(err.to_string())
            }
        };
    }

    fn edit(&mut self, key: Key) {
        let body = self.focus == ComposeFocus::Body;
        match key {
            Key::Char(ch) => self.focused_mut().insert_char(ch),
            Key::Enter if body => self.body.newline(),
            Key::Enter => self.set_focus(self.focus.next()),
            Key::Backspace => {
                self.focused_mut().backspace(body);
            }
            Key::Left => self.focused_mut().move_cursor_back(),
            Key::Right => self.focused_mut().move_cursor_forward(),
            Key::Home => self.focused_mut().move_cursor_head(),
            Key::End => self.focused_mut().move_cursor_end(),
            Key::Up if body => self.body.move_cursor_up(),
            Key::Down if body => self.body.move_cursor_down(),
            _ => {}
        }
    }

    fn body_rows(&self) -> usize {
        (self.height as usize)
            .saturating_sub(FORM_HEADER_ROWS)
            .max(MIN_BODY_ROWS)
    }

    /// Single-line fields scroll sideways by whole segments so the cursor
    /// stays on screen.
    /// Body lines wrapped to the content width, plus the row holding the cursor.
    fn body_display_rows(&self) -> (Vec<String>, usize) {
        let avail = (self.width as usize).saturating_sub(BODY_INDENT.len());
        let (cursor_line, cursor_col) = self.body.cursor();
        let body_focused = self.focus == ComposeFocus::Body;
        let mut rows = Vec::new();
        let mut cursor_row = 0usize;
        for (idx, line) in self.body.lines().iter().enumerate() {
            let text = if body_focused && idx == cursor_line {
                with_cursor(line, cursor_col)
            } else {
                line.clone()
            };
            let spans = hard_wrap_spans(&text, avail);
            if idx == cursor_line {
                let col = cursor_col.min(char_len(line));
                let within = spans
                    .iter()
                    .position(|(start, end)| col >= *start && col < *end)
                    .unwrap_or(spans.len() - 1);
                cursor_row = rows.len() + within;
            }
            rows.extend(
                spans
                    .into_iter()
                    .map(|(start, end)| slice_chars(&text, start, end)),
            );
        }
        (rows, cursor_row)
    }

    fn field_line(&self, label: &str, buffer: &TextBuffer, focus: ComposeFocus) -> Line<'static> {
        let focused = self.focus == focus;
        let line = buffer.line_at(0).unwrap_or_default();
        let (text, cursor) = if focused {
            let col = buffer.cursor().1.min(char_len(line));
            (with_cursor(line, col), col)
        } else {
            (line.to_string(), 0)
        };
        let avail = (self.width as usize).saturating_sub(LABEL_COLS);
        let spans = hard_wrap_spans(&text, avail);
        let (start, end) = spans
            .iter()
            .copied()
            .find(|(start, end)| cursor >= *start && cursor < *end)
            .or_else(|| spans.last().copied())
            .unwrap_or((0, 0));
        let text = slice_chars(&text, start, end);
        Line::from(vec![
            Span::styled(format!("{:<width$}", label, width = LABEL_COLS), label_style(focused)),
            Span::raw(text),
        ])
    }
}

fn label_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    }
}

impl SubView for ComposerView {
    fn handle_key(&mut self, key: Key) -> Option<Task> {
        if self.phase == Phase::Sending {
            debug!(?key, "key ignored while sending");
            return None;
        }
        if matches!(self.outcome, Outcome::Failed(_)) {
            return match key {
                Key::Submit => self.submit(),
                Key::Cancel => {
                    self.outcome = Outcome::Cancelled;
                    None
                }
                other => {
                    self.outcome = Outcome::Pending;
                    self.handle_key(other)
                }
            };
        }
        match key {
            Key::Submit => return self.submit(),
            Key::Cancel => self.outcome = Outcome::Cancelled,
            Key::NextField => self.set_focus(self.focus.next()),
            Key::PrevField => self.set_focus(self.focus.prev()),
            other => self.edit(other),
        }
        None
    }

    fn render_lines(&self) -> Vec<Line<'static>> {
        if self.phase == Phase::Sending {
            return vec![Line::from("  ✉ Sending...")];
        }
        let mut out = vec![
            self.field_line("To:", &self.to, ComposeFocus::To),
            Line::default(),
            self.field_line("Subject:", &self.subject, ComposeFocus::Subject),
            Line::default(),
            Line::styled("Message:", label_style(self.focus == ComposeFocus::Body)),
        ];
        let (rows, cursor_row) = self.body_display_rows();
        let start = (cursor_row + 1).saturating_sub(self.body_rows());
        out.extend(
            rows.into_iter()
                .skip(start)
                .take(self.body_rows())
                .map(|row| Line::from(format!("{}{}", BODY_INDENT, row))),
        );
        out
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn status(&self) -> String {
        match (&self.phase, &self.outcome) {
            (Phase::Sending, _) => "sending".to_string(),
            (_, Outcome::Failed(_)) => "failed".to_string(),
            _ => match self.focus {
                ComposeFocus::To => "editing To".to_string(),
                ComposeFocus::Subject => "editing Subject".to_string(),
                ComposeFocus::Body => {
                    let (line, col) = self.body.cursor();
                    format!(
                        "editing Body {}:{} of {}",
                        line + 1,
                        col + 1,
                        self.body.line_count()
                    )
                }
            },
        }
    }
}
