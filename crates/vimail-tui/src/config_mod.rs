use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use vimail_core::{DEFAULT_INBOX_LIMIT, DemoMailService, MailService};
use vimail_mail::{ImapConfig, ImapSmtpService, SmtpConfig};

pub(crate) const INBOX_LIMIT_ENV: &str = "VIMAIL_INBOX_LIMIT";

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AppConfig {
    pub(crate) imap: Option<ImapConfig>,
    pub(crate) smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub(crate) ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UiConfig {
    #[serde(default = "default_inbox_limit")]
    pub(crate) inbox_limit: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            inbox_limit: DEFAULT_INBOX_LIMIT,
        }
    }
}

fn default_inbox_limit() -> usize {
    DEFAULT_INBOX_LIMIT
}

fn xdg_config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

fn config_path_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("vimail.toml"),
        xdg_config_dir().join("vimail").join("vimail.toml"),
    ]
}

pub(crate) fn parse_config(text: &str) -> Result<AppConfig> {
    Ok(toml::from_str(text)?)
}

/// An explicit path must exist. Without one, the first readable candidate
/// wins and no file at all means defaults.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        return parse_config(&text).with_context(|| format!("parsing config {}", path.display()));
    }
    for path in config_path_candidates() {
        if let Ok(text) = std::fs::read_to_string(&path) {
            info!(path = %path.display(), "config loaded");
            return parse_config(&text)
                .with_context(|| format!("parsing config {}", path.display()));
        }
    }
    Ok(AppConfig::default())
}

/// Flag beats environment beats file. Zero or unparsable values are skipped.
pub(crate) fn resolve_inbox_limit(
    flag: Option<usize>,
    env: Option<&str>,
    config: &AppConfig,
) -> usize {
    let from_env = env.and_then(|raw| match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(raw, "ignoring {}", INBOX_LIMIT_ENV);
            None
        }
    });
    [flag, from_env, Some(config.ui.inbox_limit)]
        .into_iter()
        .flatten()
        .find(|limit| *limit > 0)
        .unwrap_or(DEFAULT_INBOX_LIMIT)
}

/// Real provider when both `[imap]` and `[smtp]` are configured, otherwise
/// the seeded in-memory one.
pub(crate) fn build_service(
    config: &AppConfig,
    demo: bool,
) -> (Arc<dyn MailService>, &'static str) {
    match (&config.imap, &config.smtp, demo) {
        (Some(imap), Some(smtp), false) => {
            info!(host = %imap.host, "using imap/smtp provider");
            (
                Arc::new(ImapSmtpService::new(imap.clone(), smtp.clone())),
                "imap",
            )
        }
        _ => {
            if !demo {
                warn!("no [imap]/[smtp] account configured, running demo inbox");
            }
            (Arc::new(DemoMailService::seeded()), "demo")
        }
    }
}
