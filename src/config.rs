//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `TOPICDEX_WORK_DIR`, `TOPICDEX_LOG_LEVEL` and
//! `TOPICDEX_CONTENT_DIR` env overrides. Chat credentials come from
//! `CHAT_API_URL` / `CHAT_API_KEY` only, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::error::AppError;
use crate::logger;

/// Chat assistant configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the chat proxy. Required for any chat operation.
    pub api_url: Option<String>,
    /// Shared secret sent in the `X-API-Key` header. Required with `api_url`.
    pub api_key: Option<String>,
    /// System prompt sent with every request.
    pub system_prompt: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum stored messages per topic history (FIFO).
    pub history_cap: usize,
}

/// Cross-origin rules of the chat proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Origins accepted verbatim, in addition to any localhost origin.
    pub allowed_origins: Vec<String>,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    /// Directory for the durable store (already expanded, no `~`).
    pub work_dir: PathBuf,
    /// Validated at load time.
    pub log_level: LevelFilter,
    /// Directory holding `catalog.toml` and the topic module files.
    pub content_dir: PathBuf,
    pub chat: ChatConfig,
    pub proxy: ProxyConfig,
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    app: RawApp,
    #[serde(default)]
    chat: RawChat,
    #[serde(default)]
    proxy: RawProxy,
}

#[derive(Deserialize)]
struct RawApp {
    name: String,
    work_dir: String,
    log_level: String,
    #[serde(default = "default_content_dir")]
    content_dir: String,
}

#[derive(Deserialize)]
struct RawChat {
    #[serde(default = "default_system_prompt")]
    system_prompt: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_history_cap")]
    history_cap: usize,
}

impl Default for RawChat {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            timeout_seconds: default_timeout_seconds(),
            history_cap: default_history_cap(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawProxy {
    #[serde(default)]
    allowed_origins: Vec<String>,
}

fn default_content_dir() -> String { "content".to_string() }
fn default_system_prompt() -> String {
    "You are a patient tutor for JavaScript, TypeScript and web platform concepts. \
     Answer questions about the article provided as context."
        .to_string()
}
fn default_timeout_seconds() -> u64 { 60 }
fn default_history_cap() -> usize { 100 }

/// Explicit overrides for [`load_from`]. Tests pass these directly instead of
/// mutating env vars.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub work_dir: Option<&'a str>,
    pub log_level: Option<&'a str>,
    pub content_dir: Option<&'a str>,
}

/// Load config from `path` (default `config/default.toml`), then apply env-var overrides.
pub fn load(path: Option<&Path>) -> Result<Config, AppError> {
    let work_dir = env::var("TOPICDEX_WORK_DIR").ok();
    let log_level = env::var("TOPICDEX_LOG_LEVEL").ok();
    let content_dir = env::var("TOPICDEX_CONTENT_DIR").ok();
    load_from(
        path.unwrap_or(Path::new("config/default.toml")),
        Overrides {
            work_dir: work_dir.as_deref(),
            log_level: log_level.as_deref(),
            content_dir: content_dir.as_deref(),
        },
    )
}

/// Internal loader: accepts an explicit path and optional overrides.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let app = parsed.app;
    let work_dir = expand_home(overrides.work_dir.unwrap_or(&app.work_dir));
    let content_dir = expand_home(overrides.content_dir.unwrap_or(&app.content_dir));
    let log_level = overrides.log_level.unwrap_or(&app.log_level);
    let log_level = logger::parse_level(log_level)
        .map_err(|e| AppError::Config(format!("log_level in {}: {e}", path.display())))?;

    Ok(Config {
        app_name: app.name,
        work_dir,
        log_level,
        content_dir,
        chat: ChatConfig {
            api_url: non_empty_env("CHAT_API_URL"),
            api_key: non_empty_env("CHAT_API_KEY"),
            system_prompt: parsed.chat.system_prompt,
            timeout_seconds: parsed.chat.timeout_seconds,
            history_cap: parsed.chat.history_cap,
        },
        proxy: ProxyConfig {
            allowed_origins: parsed.proxy.allowed_origins,
        },
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl ChatConfig {
    /// Chat config pointing at `api_url` with a fixed test secret.
    pub fn test_default(api_url: Option<&str>) -> Self {
        Self {
            api_url: api_url.map(str::to_string),
            api_key: api_url.map(|_| "test-secret".to_string()),
            system_prompt: default_system_prompt(),
            timeout_seconds: 2,
            history_cap: 10,
        }
    }
}
