use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app_mod::{AppEvent, Key, ViewMode};

/// Translates a terminal event into a logical event for the current mode.
/// Key releases, repeats, mouse and focus events yield `None`.
pub(crate) fn translate(event: &Event, mode: ViewMode) -> Option<AppEvent> {
    match event {
        Event::Resize(width, height) => Some(AppEvent::Resize {
            width: *width,
            height: *height,
        }),
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, mode).map(AppEvent::Key),
        _ => None,
    }
}

pub(crate) fn map_key(key: &KeyEvent, mode: ViewMode) -> Option<Key> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(Key::Quit);
    }
    match mode {
        ViewMode::List => map_list(key.code),
        ViewMode::Reader => map_reader(key.code),
        ViewMode::Compose => map_compose(key.code, ctrl),
    }
}

fn map_list(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char('q') => Key::Quit,
        KeyCode::Esc => Key::Escape,
        KeyCode::Char('c') => Key::Compose,
        KeyCode::Char('r') => Key::Reply,
        KeyCode::Enter => Key::Open,
        KeyCode::Char('R') | KeyCode::F(5) => Key::Refresh,
        KeyCode::Char('k') | KeyCode::Up => Key::Up,
        KeyCode::Char('j') | KeyCode::Down => Key::Down,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Char('g') | KeyCode::Home => Key::Home,
        KeyCode::Char('G') | KeyCode::End => Key::End,
        _ => return None,
    };
    Some(key)
}

fn map_reader(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char('q') => Key::Quit,
        KeyCode::Esc => Key::Escape,
        KeyCode::Char('k') | KeyCode::Up => Key::ScrollUp,
        KeyCode::Char('j') | KeyCode::Down => Key::ScrollDown,
        KeyCode::PageUp | KeyCode::Char('b') => Key::PageUp,
        KeyCode::PageDown | KeyCode::Char(' ') => Key::PageDown,
        KeyCode::Char('g') | KeyCode::Home => Key::Home,
        KeyCode::Char('G') | KeyCode::End => Key::End,
        _ => return None,
    };
    Some(key)
}

fn map_compose(code: KeyCode, ctrl: bool) -> Option<Key> {
    if ctrl {
        return match code {
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('\u{13}') => Some(Key::Submit),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Key::Cancel),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Key::Quit),
            _ => None,
        };
    }
    let key = match code {
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::NextField,
        KeyCode::BackTab => Key::PrevField,
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Char(ch) => Key::Char(ch),
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    use super::{map_key, translate};
    use crate::app_mod::{AppEvent, Key, ViewMode};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn letters_are_commands_in_list_and_text_in_compose() {
        let q = press(KeyCode::Char('q'));
        assert_eq!(map_key(&q, ViewMode::List), Some(Key::Quit));
        assert_eq!(map_key(&q, ViewMode::Compose), Some(Key::Char('q')));
        let r = press(KeyCode::Char('r'));
        assert_eq!(map_key(&r, ViewMode::List), Some(Key::Reply));
        assert_eq!(map_key(&r, ViewMode::Reader), None);
    }

    #[test]
    fn enter_opens_in_list_and_splits_in_compose() {
        let enter = press(KeyCode::Enter);
        assert_eq!(map_key(&enter, ViewMode::List), Some(Key::Open));
        assert_eq!(map_key(&enter, ViewMode::Compose), Some(Key::Enter));
    }

    #[test]
    fn compose_control_chords() {
        assert_eq!(map_key(&ctrl('s'), ViewMode::Compose), Some(Key::Submit));
        assert_eq!(map_key(&ctrl('x'), ViewMode::Compose), Some(Key::Cancel));
        assert_eq!(map_key(&ctrl('q'), ViewMode::Compose), Some(Key::Quit));
        assert_eq!(map_key(&ctrl('z'), ViewMode::Compose), None);
        assert_eq!(
            map_key(&press(KeyCode::BackTab), ViewMode::Compose),
            Some(Key::PrevField)
        );
    }

    #[test]
    fn ctrl_c_maps_to_quit() {
        for mode in [ViewMode::List, ViewMode::Reader, ViewMode::Compose] {
            assert_eq!(map_key(&ctrl('c'), mode), Some(Key::Quit));
        }
    }

    #[test]
    fn only_presses_and_resizes_translate() {
        let mut release = press(KeyCode::Char('j'));
        release.kind = KeyEventKind::Release;
        assert_eq!(translate(&Event::Key(release), ViewMode::List), None);
        assert_eq!(
            translate(&Event::Key(press(KeyCode::Char('j'))), ViewMode::List),
            Some(AppEvent::Key(Key::Down))
        );
        assert_eq!(
            translate(&Event::Resize(120, 40), ViewMode::Reader),
            Some(AppEvent::Resize {
                width: 120,
                height: 40
            })
        );
        assert_eq!(translate(&Event::FocusGained, ViewMode::List), None);
    }
}
