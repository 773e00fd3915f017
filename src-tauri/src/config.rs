use std::{env, path::PathBuf};

use dirs::home_dir;

const CONFIG_DIR: &str = ".plex-viewer";
const DEFAULT_DEV_URL: &str = "http://localhost:1420";

pub const PRODUCT_NAME: &str = "Plex Viewer";
pub const PRODUCT_DESCRIPTION: &str = "A desktop wrapper for viewing Plex";
pub const PRODUCT_LICENSE: &str = "MIT";
pub const BUG_REPORT_URL: &str = "https://github.com/ztoben/plex-viewer/issues";
pub const PACKAGED_PAGE: &str = "index.html";

pub const ENV_MODE: &str = "PLEX_VIEWER_MODE";
pub const ENV_DEV_URL: &str = "PLEX_VIEWER_DEV_URL";
pub const ENV_CONFIG_DIR: &str = "PLEX_VIEWER_CONFIG_DIR";
pub const ENV_LOG_LEVEL: &str = "PLEX_VIEWER_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
    Test,
}

impl RunMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(RunMode::Development),
            "production" | "prod" => Some(RunMode::Production),
            "test" => Some(RunMode::Test),
            _ => None,
        }
    }

    fn build_default() -> Self {
        if cfg!(debug_assertions) {
            RunMode::Development
        } else {
            RunMode::Production
        }
    }
}

/// Where the main window's page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    DevServer(String),
    Packaged(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub mode: RunMode,
    pub dev_url: String,
    pub config_dir: PathBuf,
    pub log_level: log::LevelFilter,
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup(ENV_MODE)
            .and_then(|raw| {
                let parsed = RunMode::parse(&raw);
                if parsed.is_none() {
                    eprintln!("Ignoring unknown {ENV_MODE} value: {raw}");
                }
                parsed
            })
            .unwrap_or_else(RunMode::build_default);

        let dev_url = lookup(ENV_DEV_URL)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEV_URL.into());

        let config_dir = lookup(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .or_else(default_config_dir)
            .unwrap_or_else(|| PathBuf::from(".").join(CONFIG_DIR));

        let log_level = lookup(ENV_LOG_LEVEL)
            .and_then(|raw| raw.parse::<log::LevelFilter>().ok())
            .unwrap_or(if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            });

        Self {
            mode,
            dev_url,
            config_dir,
            log_level,
        }
    }

    pub fn page_source(&self) -> PageSource {
        match self.mode {
            RunMode::Development => PageSource::DevServer(self.dev_url.clone()),
            RunMode::Production | RunMode::Test => PageSource::Packaged(PathBuf::from(PACKAGED_PAGE)),
        }
    }

    pub fn is_development(&self) -> bool {
        self.mode == RunMode::Development
    }

    pub fn checks_for_updates(&self) -> bool {
        self.mode == RunMode::Production
    }
}

fn default_config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR))
}
