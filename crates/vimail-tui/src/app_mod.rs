use ratatui::text::Line;
use tracing::{debug, info};

use super::compose_mod::{ComposerView, Outcome, Phase};
use super::list_mod::ListView;
use super::reader_mod::ReaderView;
use super::task_mod::{Completion, Task};

/// Header, rule and footer rows around the content area.
pub(crate) const CHROME_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewMode {
    List,
    Reader,
    Compose,
}

impl ViewMode {
    fn title(self) -> &'static str {
        match self {
            ViewMode::List => "Inbox",
            ViewMode::Reader => "Message",
            ViewMode::Compose => "Compose",
        }
    }

    fn hints(self) -> &'static str {
        match self {
            ViewMode::List => "j/k move · enter open · c compose · r reply · R refresh · q quit",
            ViewMode::Reader => "j/k scroll · space page · g/G top/bottom · esc back",
            ViewMode::Compose => "tab next field · ctrl+s send · ctrl+x cancel · esc back",
        }
    }
}

/// Mode-independent input, produced by the keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Key {
    Quit,
    Escape,
    Compose,
    Reply,
    Open,
    Refresh,
    Up,
    Down,
    PageUp,
    PageDown,
    NextField,
    PrevField,
    Submit,
    Cancel,
    ScrollUp,
    ScrollDown,
    Left,
    Right,
    Home,
    End,
    Enter,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AppEvent {
    Key(Key),
    Resize { width: u16, height: u16 },
    Completed(Completion),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Update {
    pub(crate) quit: bool,
    pub(crate) tasks: Vec<Task>,
}

pub(crate) trait SubView {
    fn handle_key(&mut self, key: Key) -> Option<Task>;
    fn render_lines(&self) -> Vec<Line<'static>>;
    /// `height` is the content area, chrome already removed.
    fn resize(&mut self, width: u16, height: u16);
    fn status(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LastError {
    pub(crate) origin: ViewMode,
    pub(crate) message: String,
}

/// Everything one render needs; built from state without side effects.
pub(crate) struct Screen {
    pub(crate) header: String,
    pub(crate) content: Vec<Line<'static>>,
    pub(crate) footer: String,
}

pub(crate) struct App {
    mode: ViewMode,
    previous_mode: Option<ViewMode>,
    width: u16,
    height: u16,
    list: ListView,
    reader: ReaderView,
    composer: ComposerView,
    last_error: Option<LastError>,
}

impl App {
    pub(crate) fn new(inbox_limit: usize) -> Self {
        Self {
            mode: ViewMode::List,
            previous_mode: None,
            width: 0,
            height: 0,
            list: ListView::new(inbox_limit),
            reader: ReaderView::new(),
            composer: ComposerView::new(),
            last_error: None,
        }
    }

    /// Tasks to run before the first event: the initial inbox load.
    pub(crate) fn init(&mut self) -> Vec<Task> {
        self.list.refresh().into_iter().collect()
    }

    pub(crate) fn mode(&self) -> ViewMode {
        self.mode
    }

    #[cfg(test)]
    pub(crate) fn previous_mode(&self) -> Option<ViewMode> {
        self.previous_mode
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub(crate) fn list(&self) -> &ListView {
        &self.list
    }

    #[cfg(test)]
    pub(crate) fn reader(&self) -> &ReaderView {
        &self.reader
    }

    #[cfg(test)]
    pub(crate) fn composer(&self) -> &ComposerView {
        &self.composer
    }

    #[cfg(test)]
    pub(crate) fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    pub(crate) fn handle_event(&mut self, event: AppEvent) -> Update {
        let mut update = Update::default();
        match event {
            AppEvent::Resize { width, height } => self.resize(width, height),
            AppEvent::Completed(completion) => self.on_completion(completion),
            AppEvent::Key(key) => self.on_key(key, &mut update),
        }
        self.settle_composer(&mut update);
        self.sync_last_error();
        update
    }

    fn content_height(&self) -> u16 {
        self.height.saturating_sub(CHROME_ROWS)
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let content = self.content_height();
        self.list.resize(width, content);
        self.reader.resize(width, content);
        self.composer.resize(width, content);
    }

    /// Completions go to the view that owns them, whatever the current mode.
    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::InboxLoaded(result) => self.list.on_loaded(result),
            Completion::SendFinished(result) => self.composer.on_send_finished(result),
        }
    }

    fn on_key(&mut self, key: Key, update: &mut Update) {
        if self.mode == ViewMode::Compose
            && self.composer.phase() == Phase::Sending
            && matches!(key, Key::Quit | Key::Escape)
        {
            debug!(?key, "ignored while sending");
            return;
        }
        match (self.mode, key) {
            (ViewMode::List, Key::Quit) => update.quit = true,
            (_, Key::Quit) | (ViewMode::Reader | ViewMode::Compose, Key::Escape) => {
                self.return_to_previous();
            }
            (ViewMode::List, Key::Escape) if self.list.error().is_some() => {
                self.list.dismiss_error();
            }
            (ViewMode::List, Key::Compose) => self.start_compose(ComposerView::new()),
            (ViewMode::List, Key::Reply) => {
                if let Some(message) = self.list.selected_message().cloned() {
                    self.start_compose(ComposerView::reply(&message));
                }
            }
            (ViewMode::List, Key::Open) => {
                if let Some(message) = self.list.selected_message().cloned() {
                    debug!(id = %message.id, "open message");
                    self.previous_mode = Some(ViewMode::List);
                    self.mode = ViewMode::Reader;
                    self.reader.set_message(message);
                }
            }
            (mode, key) => {
                let task = match mode {
                    ViewMode::List => self.list.handle_key(key),
                    ViewMode::Reader => self.reader.handle_key(key),
                    ViewMode::Compose => self.composer.handle_key(key),
                };
                update.tasks.extend(task);
            }
        }
    }

    fn start_compose(&mut self, mut composer: ComposerView) {
        composer.resize(self.width, self.content_height());
        self.composer = composer;
        self.previous_mode = Some(ViewMode::List);
        self.mode = ViewMode::Compose;
    }

    fn return_to_previous(&mut self) {
        let leaving = self.mode;
        self.mode = self.previous_mode.take().unwrap_or(ViewMode::List);
        if leaving == ViewMode::Compose {
            let mut fresh = ComposerView::new();
            fresh.resize(self.width, self.content_height());
            self.composer = fresh;
        }
        debug!(from = ?leaving, to = ?self.mode, "mode change");
    }

    /// Leaves Compose once the form reached a terminal outcome.
    fn settle_composer(&mut self, update: &mut Update) {
        if self.mode != ViewMode::Compose {
            return;
        }
        match self.composer.outcome() {
            Outcome::Sent => {
                info!("message sent");
                self.return_to_previous();
                update.tasks.extend(self.list.refresh());
            }
            Outcome::Cancelled => self.return_to_previous(),
            Outcome::Pending | Outcome::Failed(_) => {}
        }
    }

    fn sync_last_error(&mut self) {
        let compose_error = match (self.mode, self.composer.outcome()) {
            (ViewMode::Compose, Outcome::Failed(reason)) => Some(LastError {
                origin: ViewMode::Compose,
                message: reason.clone(),
            }),
            _ => None,
        };
        self.last_error = compose_error.or_else(|| {
            self.list.error().map(|err| LastError {
                origin: ViewMode::List,
                message: err.to_string(),
            })
        });
    }

    fn active_view(&self) -> &dyn SubView {
        match self.mode {
            ViewMode::List => &self.list,
            ViewMode::Reader => &self.reader,
            ViewMode::Compose => &self.composer,
        }
    }

    pub(crate) fn screen(&self) -> Screen {
        let status = self.active_view().status();
        let mut header = format!("vimail · {}", self.mode.title());
        if !status.is_empty() {
            header.push_str(" · ");
            header.push_str(&status);
        }
        let content = match &self.last_error {
            Some(err) if err.origin == self.mode => error_lines(err),
            Some(err) => {
                header.push_str(&format!(" · ! {}", err.message));
                self.active_view().render_lines()
            }
            None => self.active_view().render_lines(),
        };
        Screen {
            header,
            content,
            footer: self.mode.hints().to_string(),
        }
    }
}

fn error_lines(err: &LastError) -> Vec<Line<'static>> {
    let hint = match err.origin {
        ViewMode::Compose => "keep typing to edit · ctrl+s to retry · esc to discard",
        ViewMode::List | ViewMode::Reader => "R to retry · esc to dismiss",
    };
    vec![
        Line::default(),
        Line::from(format!("  ✗ Error: {}", err.message)),
        Line::default(),
        Line::from(format!("  {}", hint)),
    ]
}
