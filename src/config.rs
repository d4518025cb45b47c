//! Run configuration.
//!
//! Resolution order, later wins:
//! - built-in defaults, every path relative to the run root
//! - optional TOML file (`--config`, else `<config dir>/menuwatch/config.toml`)
//! - environment variables, the only source of credentials
//! - command line flags

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::RunArgs;
use crate::error::ConfigError;

pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

const DEFAULT_DATA_PATH: &str = "data/items_demo.csv";
const DEFAULT_STATE_PATH: &str = "item_state.json";
const DEFAULT_HISTORY_PATH: &str = "status_history.json";
const DEFAULT_DASHBOARD_PATH: &str = "index.html";
const DEFAULT_REPORT_PATH: &str = "items_report.xlsx";
const DEFAULT_LOG_PATH: &str = "monitor_log.txt";

const GITHUB_API: &str = "https://api.github.com";
const TELEGRAM_API: &str = "https://api.telegram.org";

/// A credential that never shows up in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: Option<Secret>,
    pub repository: Option<String>,
    pub actor: Option<String>,
    pub api_base: String,
    pub remote_dir: Option<String>,
    pub branch: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: Option<Secret>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
    pub attempts: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub data_path: PathBuf,
    pub state_path: PathBuf,
    pub history_path: PathBuf,
    pub dashboard_path: PathBuf,
    pub report_path: PathBuf,
    pub log_path: PathBuf,
    pub utc_offset: FixedOffset,
    pub github: GithubConfig,
    pub telegram: TelegramConfig,
    pub offline: bool,
    pub json_output: bool,
    pub verbose: bool,
}

/// On-disk shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub dashboard_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub utc_offset_hours: Option<i32>,
    pub github: GithubSection,
    pub telegram: TelegramSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSection {
    pub repository: Option<String>,
    pub api_base: Option<String>,
    pub remote_dir: Option<String>,
    pub branch: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramSection {
    pub chat_id: Option<String>,
    pub api_base: Option<String>,
    pub timeout: Option<String>,
    pub attempts: Option<u32>,
    pub retry_delay: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `~/.config/menuwatch/config.toml` on Linux.
pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "menuwatch").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn duration(field: &'static str, value: Option<&str>, default: Duration) -> Result<Duration, ConfigError> {
    match value {
        Some(text) => humantime::parse_duration(text).map_err(|source| ConfigError::Duration { field, source }),
        None => Ok(default),
    }
}

fn offset_hours(hours: i32) -> Result<FixedOffset, ConfigError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(ConfigError::Offset(hours))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn load(args: &RunArgs) -> Result<Self, ConfigError> {
        let root = match &args.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().map_err(ConfigError::WorkingDir)?,
        };

        let file = match &args.config {
            Some(path) => FileConfig::read(path)?,
            None => match default_config_file().filter(|p| p.is_file()) {
                Some(path) => FileConfig::read(&path)?,
                None => FileConfig::default(),
            },
        };

        let mut config = Config::resolve(root, file, |key| std::env::var(key).ok())?;

        if let Some(data) = &args.data {
            config.data_path = config.root.join(data);
        }
        config.offline = args.offline;
        config.json_output = args.json;
        config.verbose = args.verbose;
        Ok(config)
    }

    /// Merges file values and environment lookups over the defaults.
    pub fn resolve<F>(root: PathBuf, file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let at_root = |value: Option<PathBuf>, default: &str| root.join(value.unwrap_or_else(|| PathBuf::from(default)));

        let github = GithubConfig {
            token: non_empty(env("GITHUB_TOKEN")).map(Secret::new),
            repository: non_empty(env("GITHUB_REPOSITORY")).or(non_empty(file.github.repository)),
            actor: non_empty(env("GITHUB_ACTOR")),
            api_base: file.github.api_base.unwrap_or_else(|| GITHUB_API.to_string()),
            remote_dir: non_empty(file.github.remote_dir),
            branch: non_empty(file.github.branch),
            timeout: duration("github.timeout", file.github.timeout.as_deref(), Duration::from_secs(30))?,
        };

        let telegram = TelegramConfig {
            token: non_empty(env("TELEGRAM_TOKEN")).map(Secret::new),
            chat_id: non_empty(env("TELEGRAM_CHAT_ID")).or(non_empty(file.telegram.chat_id)),
            api_base: file.telegram.api_base.unwrap_or_else(|| TELEGRAM_API.to_string()),
            timeout: duration("telegram.timeout", file.telegram.timeout.as_deref(), Duration::from_secs(20))?,
            attempts: file.telegram.attempts.unwrap_or(3).max(1),
            retry_delay: duration(
                "telegram.retry_delay",
                file.telegram.retry_delay.as_deref(),
                Duration::from_secs(5),
            )?,
        };

        Ok(Config {
            data_path: at_root(file.data_path, DEFAULT_DATA_PATH),
            state_path: at_root(file.state_path, DEFAULT_STATE_PATH),
            history_path: at_root(file.history_path, DEFAULT_HISTORY_PATH),
            dashboard_path: at_root(file.dashboard_path, DEFAULT_DASHBOARD_PATH),
            report_path: at_root(file.report_path, DEFAULT_REPORT_PATH),
            log_path: at_root(file.log_path, DEFAULT_LOG_PATH),
            utc_offset: offset_hours(file.utc_offset_hours.unwrap_or(DEFAULT_UTC_OFFSET_HOURS))?,
            github,
            telegram,
            offline: false,
            json_output: false,
            verbose: false,
            root,
        })
    }
}
