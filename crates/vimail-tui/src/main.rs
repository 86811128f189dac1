use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{debug, info};

use vimail_core::{MailService, init_logging};

mod app_mod;
mod compose_mod;
mod config_mod;
mod keymap_mod;
mod list_mod;
mod reader_mod;
mod render_mod;
mod task_mod;
mod text_buffer_mod;
mod util_mod;

use app_mod::{App, AppEvent};
use config_mod::{INBOX_LIMIT_ENV, build_service, load_config, resolve_inbox_limit};
use task_mod::{COMPLETION_QUEUE_CAPACITY, Completion, spawn_tasks};

const TICK_RATE: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "vimail", version, about = "Terminal email client")]
struct Cli {
    /// Config file to use instead of the default search path.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
    /// Number of inbox messages to fetch.
    #[arg(short = 'n', long = "limit")]
    limit: Option<usize>,
    /// Run against the built-in demo inbox.
    #[arg(long)]
    demo: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let env_limit = std::env::var(INBOX_LIMIT_ENV).ok();
    let limit = resolve_inbox_limit(cli.limit, env_limit.as_deref(), &config);
    let (service, provider) = build_service(&config, cli.demo);
    info!(provider, limit, "starting");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }
    let res = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| {
            let res = run_app(&mut terminal, App::new(limit), &rt, &service);
            let _ = terminal.show_cursor();
            res
        });

    let restored = first_error([
        disable_raw_mode(),
        execute!(std::io::stdout(), LeaveAlternateScreen),
    ]);

    rt.shutdown_timeout(Duration::from_millis(200));
    if let Err(err) = &res {
        debug!(%err, "exited with error");
    }
    if let Err(err) = &restored {
        debug!(%err, "terminal restore failed");
    }
    res.and(restored.map_err(anyhow::Error::from))
}

/// Teardown steps have all run by the time they are collected here.
fn first_error(steps: impl IntoIterator<Item = std::io::Result<()>>) -> std::io::Result<()> {
    steps.into_iter().fold(Ok(()), |acc, step| acc.and(step))
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    rt: &tokio::runtime::Runtime,
    service: &Arc<dyn MailService>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Completion>(COMPLETION_QUEUE_CAPACITY);
    let size = terminal.size()?;
    let _ = app.handle_event(AppEvent::Resize {
        width: size.width,
        height: size.height,
    });
    spawn_tasks(rt.handle(), service, &tx, app.init());

    loop {
        terminal.draw(|frame| render_mod::draw(frame, &app))?;

        // One event per frame: a finished task first, otherwise input.
        let next = if let Ok(completion) = rx.try_recv() {
            Some(AppEvent::Completed(completion))
        } else if event::poll(TICK_RATE)? {
            keymap_mod::translate(&event::read()?, app.mode())
        } else {
            None
        };
        let Some(next) = next else {
            continue;
        };
        let update = app.handle_event(next);
        if update.quit {
            info!("quit");
            return Ok(());
        }
        spawn_tasks(rt.handle(), service, &tx, update.tasks);
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::first_error;

    #[test]
    fn teardown_reports_first_failure() {
        let mut ran = Vec::new();
        let mut step = |name: &'static str, fail: bool| {
            ran.push(name);
            if fail {
                Err(io::Error::other(name))
            } else {
                Ok(())
            }
        };
        let res = first_error([step("raw mode", true), step("alternate screen", true)]);
        assert_eq!(ran, ["raw mode", "alternate screen"]);
        assert_eq!(res.map_err(|e| e.to_string()), Err("raw mode".to_string()));
        assert!(first_error([Ok(()), Ok(())]).is_ok());
    }
}
