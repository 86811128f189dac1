use ratatui::{
    style::{Modifier, Style},
    text::Line,
};

use vimail_core::Message;

use super::app_mod::{Key, SubView};
use super::task_mod::Task;
use super::util_mod::{truncate_to_width, wrap_line};

/// From, Subject and Date rows above the body.
pub(crate) const READER_HEADER_ROWS: usize = 3;
const EMPTY_PLACEHOLDER: &str = "(Empty message)";

#[derive(Default)]
pub(crate) struct ReaderView {
    message: Option<Message>,
    lines: Vec<String>,
    /// `lines` wrapped to the current width; scrolling counts these.
    rows: Vec<String>,
    offset: usize,
    width: u16,
    height: u16,
}

impl ReaderView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub(crate) fn body_lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn set_message(&mut self, message: Message) {
        let mut lines: Vec<String> = message.body.split('\n').map(str::to_string).collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            lines.push(EMPTY_PLACEHOLDER.to_string());
        }
        self.lines = lines;
        self.offset = 0;
        self.message = Some(message);
        self.rewrap();
    }

    fn rewrap(&mut self) {
        let width = self.width as usize;
        self.rows = self
            .lines
            .iter()
            .flat_map(|line| wrap_line(line, width))
            .collect();
        self.offset = self.offset.min(self.max_offset());
    }

    fn viewport_rows(&self) -> usize {
        (self.height as usize).saturating_sub(READER_HEADER_ROWS + 1)
    }

    fn max_offset(&self) -> usize {
        self.rows.len().saturating_sub(self.viewport_rows())
    }

    pub(crate) fn scroll(&mut self, delta: isize) {
        self.offset = self.offset.saturating_add_signed(delta).min(self.max_offset());
    }
}

impl SubView for ReaderView {
    fn handle_key(&mut self, key: Key) -> Option<Task> {
        let page = self.viewport_rows().max(1) as isize;
        match key {
            Key::Up | Key::ScrollUp => self.scroll(-1),
            Key::Down | Key::ScrollDown => self.scroll(1),
            Key::PageUp => self.scroll(-page),
            Key::PageDown => self.scroll(page),
            Key::Home => self.offset = 0,
            Key::End => self.offset = self.max_offset(),
            _ => {}
        }
        None
    }

    fn render_lines(&self) -> Vec<Line<'static>> {
        let Some(message) = self.message.as_ref() else {
            return vec![Line::from("  No message selected")];
        };
        let width = self.width as usize;
        let fit = |text: String| {
            if width > 0 {
                truncate_to_width(&text, width)
            } else {
                text
            }
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut out = vec![
            Line::styled(fit(format!("From: {}", message.from)), bold),
            Line::styled(fit(format!("Subject: {}", message.subject)), bold),
            Line::from(fit(format!(
                "Date: {}",
                message.local_date().format("%a, %d %b %Y %H:%M")
            ))),
            Line::from("─".repeat(width.max(1))),
        ];
        let rows = self.viewport_rows();
        out.extend(
            self.rows
                .iter()
                .skip(self.offset)
                .take(rows)
                .map(|row| Line::from(row.clone())),
        );
        out
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.rewrap();
    }

    fn status(&self) -> String {
        if self.message.is_none() {
            return String::new();
        }
        let end = (self.offset + self.viewport_rows()).min(self.rows.len());
        format!("lines {}-{} of {}", self.offset + 1, end, self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{READER_HEADER_ROWS, ReaderView};
    use crate::app_mod::{Key, SubView};
    use crate::list_mod::tests::sample_message;
    use crate::util_mod::line_text;

    fn reader_with_body(body: &str, height: u16) -> ReaderView {
        let mut reader = ReaderView::new();
        reader.resize(40, height);
        let mut message = sample_message(1);
        message.body = body.to_string();
        reader.set_message(message);
        reader
    }

    #[test]
    fn trailing_blank_lines_are_trimmed() {
        let reader = reader_with_body("one\n\ntwo\n\n  \n", 20);
        assert_eq!(reader.body_lines(), ["one", "", "two"]);
    }

    #[test]
    fn empty_body_shows_placeholder() {
        for body in ["", "\n\n", "   "] {
            let reader = reader_with_body(body, 20);
            assert_eq!(reader.body_lines(), ["(Empty message)"]);
        }
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let body = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        // 14 rows of content minus header and rule leaves 10 body rows.
        let mut reader = reader_with_body(&body, 14);
        reader.scroll(-5);
        assert_eq!(reader.offset(), 0);
        reader.scroll(100);
        assert_eq!(reader.offset(), 20);
        let _ = reader.handle_key(Key::Home);
        assert_eq!(reader.offset(), 0);
        let _ = reader.handle_key(Key::End);
        assert_eq!(reader.offset(), 20);
    }

    #[test]
    fn short_body_never_scrolls() {
        let mut reader = reader_with_body("a\nb", 14);
        reader.scroll(3);
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn resize_reclamps_offset() {
        let body = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let mut reader = reader_with_body(&body, 14);
        reader.scroll(100);
        reader.resize(40, 34);
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn new_message_resets_offset() {
        let body = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let mut reader = reader_with_body(&body, 14);
        reader.scroll(4);
        reader.set_message(sample_message(2));
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn long_lines_wrap_to_width() {
        let reader = reader_with_body("alpha beta gamma delta epsilon zeta eta theta iota", 20);
        let lines: Vec<String> = reader.render_lines().iter().map(line_text).collect();
        let body = &lines[READER_HEADER_ROWS + 1..];
        assert!(body.len() > 1);
        assert!(body.iter().all(|row| row.chars().count() <= 40));
        assert!(lines[0].starts_with("From: "));
    }

    #[test]
    fn end_shows_last_wrapped_line() {
        let body = (0..12)
            .map(|i| format!("line{:02} aaaa bbbb cccc", i))
            .collect::<Vec<_>>()
            .join("\n");
        let mut reader = reader_with_body(&body, 14);
        reader.resize(20, 14);
        // Each source line wraps into two rows.
        let _ = reader.handle_key(Key::End);
        assert_eq!(reader.offset(), 14);
        let lines: Vec<String> = reader.render_lines().iter().map(line_text).collect();
        let body = &lines[READER_HEADER_ROWS + 1..];
        assert_eq!(body.len(), 10);
        assert_eq!(body[8], "line11 aaaa bbbb");
        assert_eq!(body[9], "cccc");
        assert_eq!(reader.status(), "lines 15-24 of 24");
    }

    #[test]
    fn widening_rewraps_and_reclamps() {
        let body = (0..12)
            .map(|i| format!("line{:02} aaaa bbbb cccc", i))
            .collect::<Vec<_>>()
            .join("\n");
        let mut reader = reader_with_body(&body, 14);
        reader.resize(20, 14);
        let _ = reader.handle_key(Key::End);
        reader.resize(40, 14);
        assert_eq!(reader.offset(), 2);
        let lines: Vec<String> = reader.render_lines().iter().map(line_text).collect();
        assert_eq!(lines.last().map(String::as_str), Some("line11 aaaa bbbb cccc"));
    }
}
