use super::util_mod::{char_len, char_to_byte_idx};

/// Owned lines plus a `(line, col)` cursor. Columns count chars, never bytes.
/// There is always at least one line and the cursor is always in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextBuffer {
    lines: Vec<String>,
    line: usize,
    col: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub(crate) fn new() -> Self {
        Self {
            lines: vec![String::new()],
            line: 0,
            col: 0,
        }
    }

    pub(crate) fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(str::to_string).collect())
    }

    pub(crate) fn from_lines(lines: Vec<String>) -> Self {
        let mut buf = Self {
            lines,
            line: 0,
            col: 0,
        };
        buf.clamp_cursor();
        buf
    }

    pub(crate) fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn line_at(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    pub(crate) fn set_cursor(&mut self, line: usize, col: usize) {
        self.line = line;
        self.col = col;
        self.clamp_cursor();
    }

    fn line_len(&self, index: usize) -> usize {
        self.lines.get(index).map(|l| char_len(l)).unwrap_or(0)
    }

    fn clamp_cursor(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.line = self.line.min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.line));
    }

    /// Inserts `ch` at `(line, col)` and leaves the cursor just after it.
    pub(crate) fn insert_at(&mut self, line: usize, col: usize, ch: char) {
        let line = line.min(self.lines.len() - 1);
        let col = col.min(self.line_len(line));
        let target = &mut self.lines[line];
        let idx = char_to_byte_idx(target, col);
        target.insert(idx, ch);
        self.line = line;
        self.col = col + 1;
        self.clamp_cursor();
    }

    /// Removes the char at `(line, col)`; the cursor lands on `col`.
    pub(crate) fn delete_at(&mut self, line: usize, col: usize) -> Option<char> {
        if line >= self.lines.len() || col >= self.line_len(line) {
            return None;
        }
        let target = &mut self.lines[line];
        let idx = char_to_byte_idx(target, col);
        let removed = target.remove(idx);
        self.line = line;
        self.col = col;
        self.clamp_cursor();
        Some(removed)
    }

    /// Text from `col` onward moves to a new line right after `line`; the
    /// cursor moves to the start of that new line.
    pub(crate) fn split_line(&mut self, line: usize, col: usize) {
        let line = line.min(self.lines.len() - 1);
        let col = col.min(self.line_len(line));
        let idx = char_to_byte_idx(&self.lines[line], col);
        let tail = self.lines[line].split_off(idx);
        self.lines.insert(line + 1, tail);
        self.line = line + 1;
        self.col = 0;
        self.clamp_cursor();
    }

    /// Appends line `line + 1` onto `line`; the cursor sits at the seam.
    pub(crate) fn join_line(&mut self, line: usize) -> bool {
        if line + 1 >= self.lines.len() {
            return false;
        }
        let seam = self.line_len(line);
        let next = self.lines.remove(line + 1);
        self.lines[line].push_str(&next);
        self.line = line;
        self.col = seam;
        self.clamp_cursor();
        true
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        self.insert_at(self.line, self.col, ch);
    }

    pub(crate) fn newline(&mut self) {
        self.split_line(self.line, self.col);
    }

    /// Deletes left of the cursor. At column 0 the line joins onto the
    /// previous one only when `join_lines` is set.
    pub(crate) fn backspace(&mut self, join_lines: bool) -> bool {
        if self.col > 0 {
            return self.delete_at(self.line, self.col - 1).is_some();
        }
        if join_lines && self.line > 0 {
            return self.join_line(self.line - 1);
        }
        false
    }

    pub(crate) fn move_cursor_back(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub(crate) fn move_cursor_forward(&mut self) {
        self.col = (self.col + 1).min(self.line_len(self.line));
    }

    pub(crate) fn move_cursor_head(&mut self) {
        self.col = 0;
    }

    pub(crate) fn move_cursor_end(&mut self) {
        self.col = self.line_len(self.line);
    }

    pub(crate) fn move_cursor_up(&mut self) {
        if self.line > 0 {
            self.set_cursor(self.line - 1, self.col);
        }
    }

    pub(crate) fn move_cursor_down(&mut self) {
        if self.line + 1 < self.lines.len() {
            self.set_cursor(self.line + 1, self.col);
        }
    }

    pub(crate) fn move_cursor_to_end_of_text(&mut self) {
        let last = self.lines.len() - 1;
        self.set_cursor(last, self.line_len(last));
    }
}

#[cfg(test)]
mod tests {
    use super::TextBuffer;

    #[test]
    fn new_buffer_has_one_empty_line() {
        let buf = TextBuffer::new();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(""));
        assert_eq!(buf.cursor(), (0, 0));
        assert_eq!(buf.text(), "");
        assert_eq!(TextBuffer::from_lines(Vec::new()).line_count(), 1);
    }

    #[test]
    fn split_then_join_restores_line_and_cursor() {
        for text in ["hello world", "", "héllo wörld", "x"] {
            let len = text.chars().count();
            for col in 0..=len {
                let mut buf = TextBuffer::from_lines(vec![
                    "above".to_string(),
                    text.to_string(),
                    "below".to_string(),
                ]);
                buf.set_cursor(1, col);
                let before = buf.clone();

                buf.split_line(1, col);
                assert_eq!(buf.line_count(), 4);
                assert_eq!(buf.cursor(), (2, 0));

                assert!(buf.join_line(1));
                assert_eq!(buf, before);
            }
        }
    }

    #[test]
    fn insert_and_delete_track_cursor() {
        let mut buf = TextBuffer::from_text("ac");
        buf.set_cursor(0, 1);
        buf.insert_char('b');
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), (0, 2));

        assert_eq!(buf.delete_at(0, 0), Some('a'));
        assert_eq!(buf.text(), "bc");
        assert_eq!(buf.cursor(), (0, 0));
        assert_eq!(buf.delete_at(0, 5), None);
        assert_eq!(buf.delete_at(3, 0), None);
    }

    #[test]
    fn backspace_joins_only_when_allowed() {
        let mut buf = TextBuffer::from_text("one\ntwo");
        buf.set_cursor(1, 0);
        assert!(!buf.backspace(false));
        assert_eq!(buf.line_count(), 2);
        assert!(buf.backspace(true));
        assert_eq!(buf.text(), "onetwo");
        assert_eq!(buf.cursor(), (0, 3));

        buf.set_cursor(0, 0);
        assert!(!buf.backspace(true));
        assert_eq!(buf.text(), "onetwo");
    }

    #[test]
    fn vertical_motion_clamps_column() {
        let mut buf = TextBuffer::from_text("a long line\nab\n");
        buf.set_cursor(0, 9);
        buf.move_cursor_down();
        assert_eq!(buf.cursor(), (1, 2));
        buf.move_cursor_down();
        assert_eq!(buf.cursor(), (2, 0));
        buf.move_cursor_down();
        assert_eq!(buf.cursor(), (2, 0));
        buf.move_cursor_up();
        buf.move_cursor_up();
        assert_eq!(buf.cursor(), (0, 0));
        buf.move_cursor_up();
        assert_eq!(buf.cursor(), (0, 0));
    }

    #[test]
    fn horizontal_motion_stays_on_line() {
        let mut buf = TextBuffer::from_text("ab\ncd");
        buf.set_cursor(1, 0);
        buf.move_cursor_back();
        assert_eq!(buf.cursor(), (1, 0));
        buf.move_cursor_end();
        buf.move_cursor_forward();
        assert_eq!(buf.cursor(), (1, 2));
        buf.move_cursor_head();
        assert_eq!(buf.cursor(), (1, 0));
    }

    #[test]
    fn set_cursor_clamps_out_of_range() {
        let mut buf = TextBuffer::from_text("abc\nde");
        buf.set_cursor(9, 9);
        assert_eq!(buf.cursor(), (1, 2));
        buf.move_cursor_to_end_of_text();
        assert_eq!(buf.cursor(), (1, 2));
    }
}
