use ratatui::{
    style::{Modifier, Style},
    text::Line,
};
use tracing::debug;

use vimail_core::{MailError, Message};

use super::app_mod::{Key, SubView};
use super::task_mod::Task;
use super::util_mod::{pad_to_width, truncate_to_width};

const FROM_COLS: usize = 22;
const MIN_MARKER_ROWS: usize = 3;

pub(crate) struct ListView {
    messages: Vec<Message>,
    selected: usize,
    loading: bool,
    error: Option<MailError>,
    limit: usize,
    width: u16,
    height: u16,
}

impl ListView {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            selected: 0,
            loading: false,
            error: None,
            limit: limit.max(1),
            width: 0,
            height: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    #[cfg(test)]
    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn error(&self) -> Option<&MailError> {
        self.error.as_ref()
    }

    pub(crate) fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub(crate) fn selected_message(&self) -> Option<&Message> {
        self.messages.get(self.selected)
    }

    /// Starts a reload unless one is already in flight.
    pub(crate) fn refresh(&mut self) -> Option<Task> {
        if self.loading {
            debug!("list refresh ignored, already loading");
            return None;
        }
        self.loading = true;
        Some(Task::LoadInbox { limit: self.limit })
    }

    pub(crate) fn on_loaded(&mut self, result: Result<Vec<Message>, MailError>) {
        if !self.loading {
            debug!("stale inbox completion ignored");
            return;
        }
        self.loading = false;
        match result {
            Ok(messages) => {
                debug!(count = messages.len(), "inbox loaded");
                self.messages = messages;
                self.error = None;
                self.selected = self.selected.min(self.messages.len().saturating_sub(1));
            }
            Err(err) => {
                debug!(%err, "inbox load failed");
                self.error = Some(err);
            }
        }
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.loading || self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn viewport_rows(&self) -> usize {
        (self.height as usize).max(1)
    }

    /// Scroll markers need two rows of their own plus one message row.
    fn shows_markers(&self) -> bool {
        self.messages.len() > self.viewport_rows() && self.viewport_rows() >= MIN_MARKER_ROWS
    }

    /// Rows of `messages` shown for the current selection: `(start, end)`.
    /// When the list overflows, two rows are kept for the scroll markers.
    pub(crate) fn visible_window(&self) -> (usize, usize) {
        let count = self.messages.len();
        let height = self.viewport_rows();
        if count <= height {
            return (0, count);
        }
        let rows = if self.shows_markers() {
            height - 2
        } else {
            height
        };
        let start = self.selected.saturating_sub(rows / 2).min(count - rows);
        (start, start + rows)
    }

    fn summary_line(&self, message: &Message, selected: bool) -> Line<'static> {
        let width = self.width as usize;
        let marker = if selected { "> " } else { "  " };
        let unread = if message.unread { "●" } else { " " };
        let date = message.local_date().format("%b %d").to_string();
        let from = pad_to_width(&message.display_from(), FROM_COLS);
        let text = format!("{}{} {}  {}  {}", marker, unread, from, message.subject, date);
        let text = if width > 0 {
            truncate_to_width(&text, width)
        } else {
            text
        };
        let style = if selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else if message.unread {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::styled(text, style)
    }
}

impl SubView for ListView {
    fn handle_key(&mut self, key: Key) -> Option<Task> {
        let page = self.viewport_rows() as isize;
        match key {
            Key::Up | Key::ScrollUp => self.move_selection(-1),
            Key::Down | Key::ScrollDown => self.move_selection(1),
            Key::PageUp => self.move_selection(-page),
            Key::PageDown => self.move_selection(page),
            Key::Home => self.move_selection(isize::MIN),
            Key::End => self.move_selection(isize::MAX),
            Key::Refresh => return self.refresh(),
            _ => {}
        }
        None
    }

    fn render_lines(&self) -> Vec<Line<'static>> {
        if self.loading {
            return vec![Line::from("  Loading...")];
        }
        if self.messages.is_empty() {
            return vec![Line::from("  No messages")];
        }
        let (start, end) = self.visible_window();
        let markers = self.shows_markers();
        let mut lines = Vec::with_capacity(end - start + 2);
        if markers && start > 0 {
            lines.push(Line::from(format!("  ↑ {} more", start)));
        }
        for (idx, message) in self.messages[start..end].iter().enumerate() {
            lines.push(self.summary_line(message, start + idx == self.selected));
        }
        if markers && end < self.messages.len() {
            lines.push(Line::from(format!("  ↓ {} more", self.messages.len() - end)));
        }
        lines
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn status(&self) -> String {
        if self.loading {
            return "loading".to_string();
        }
        let unread = self.messages.iter().filter(|m| m.unread).count();
        format!("{} messages, {} unread", self.messages.len(), unread)
    }
}
