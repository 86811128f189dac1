use unicode_width::{UnicodeWidthChar as _, UnicodeWidthStr as _};

pub(crate) const CURSOR_GLYPH: char = '█';

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Draws the block cursor over the cell at `col`, or after the text when the
/// cursor sits at the end of the line.
pub(crate) fn with_cursor(line: &str, col: usize) -> String {
    let mut out = String::with_capacity(line.len() + CURSOR_GLYPH.len_utf8());
    let mut placed = false;
    for (idx, ch) in line.chars().enumerate() {
        if idx == col {
            out.push(CURSOR_GLYPH);
            placed = true;
        } else {
            out.push(ch);
        }
    }
    if !placed {
        out.push(CURSOR_GLYPH);
    }
    out
}

/// Greedy word wrap on whitespace. A token wider than `width` keeps its own
/// row instead of being split.
pub(crate) fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.width() <= width {
        return vec![line.to_string()];
    }
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.width() + 1 + word.width() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            rows.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Splits `text` into `(start, end)` char ranges no wider than `width`
/// columns, breaking anywhere. Width 0 disables the split.
pub(crate) fn hard_wrap_spans(text: &str, width: usize) -> Vec<(usize, usize)> {
    if width == 0 {
        return vec![(0, char_len(text))];
    }
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut used = 0usize;
    for (idx, ch) in text.chars().enumerate() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && idx > start {
            spans.push((start, idx));
            start = idx;
            used = 0;
        }
        used += w;
    }
    spans.push((start, char_len(text)));
    spans
}

pub(crate) fn slice_chars(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

pub(crate) fn pad_to_width(text: &str, width: usize) -> String {
    let truncated = truncate_to_width(text, width);
    let fill = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(fill))
}

#[cfg(test)]
pub(crate) fn line_text(line: &ratatui::text::Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        char_to_byte_idx, hard_wrap_spans, pad_to_width, slice_chars, truncate_to_width,
        with_cursor, wrap_line,
    };

    #[test]
    fn cursor_glyph_replaces_or_appends() {
        assert_eq!(with_cursor("abc", 1), "a█c");
        assert_eq!(with_cursor("abc", 3), "abc█");
        assert_eq!(with_cursor("", 0), "█");
        assert_eq!(with_cursor("hé", 1), "h█");
    }

    #[test]
    fn wrap_packs_words_greedily() {
        assert_eq!(
            wrap_line("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_line("short", 10), vec!["short"]);
        assert_eq!(wrap_line("", 10), vec![""]);
    }

    #[test]
    fn wrap_keeps_long_tokens_whole() {
        assert_eq!(
            wrap_line("see https://example.com/a/very/long/path ok", 12),
            vec!["see", "https://example.com/a/very/long/path", "ok"]
        );
    }

    #[test]
    fn hard_wrap_breaks_inside_words() {
        assert_eq!(hard_wrap_spans("abcdefgh", 3), vec![(0, 3), (3, 6), (6, 8)]);
        assert_eq!(hard_wrap_spans("abc", 3), vec![(0, 3)]);
        assert_eq!(hard_wrap_spans("", 3), vec![(0, 0)]);
        assert_eq!(hard_wrap_spans("abcdef", 0), vec![(0, 6)]);
        // Wide chars count two columns.
        assert_eq!(hard_wrap_spans("日本語", 4), vec![(0, 2), (2, 3)]);
        assert_eq!(slice_chars("héllo", 1, 3), "él");
    }

    #[test]
    fn byte_index_follows_chars() {
        assert_eq!(char_to_byte_idx("héllo", 2), 3);
        assert_eq!(char_to_byte_idx("abc", 10), 3);
    }

    #[test]
    fn truncation_marks_overflow() {
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("hi", 6), "hi");
        assert_eq!(pad_to_width("hi", 4), "hi  ");
    }
}
