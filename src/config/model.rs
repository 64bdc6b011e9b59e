//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so a missing or partial file still works.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::nickname::fallback_nickname;
use crate::irc::client::{ClientBuilder, ReconnectPolicy, DEFAULT_VERSION};
use crate::logging::TrafficLog;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The server to connect to and the identity to use there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// User-facing label, also used to name traffic log files.
    #[serde(default = "default_name")]
    pub name: String,
    /// `host:port` of a plain-text IRC listener.
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "fallback_nickname")]
    pub nickname: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    /// CTCP VERSION reply.
    #[serde(default = "default_version")]
    pub version: String,
    /// Channels joined after the server's welcome reply.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
    /// Log every raw line at debug level.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            addr: default_addr(),
            nickname: fallback_nickname(),
            username: None,
            realname: None,
            version: default_version(),
            channels: Vec::new(),
            quit_message: default_quit_message(),
            debug: false,
        }
    }
}

/// Backoff settings used when the server closes the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            initial_delay_secs: default_initial_delay(),
        }
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(cfg: &ReconnectConfig) -> Self {
        ReconnectPolicy {
            attempts: cfg.attempts,
            initial_delay: Duration::from_secs(cfg.initial_delay_secs),
        }
    }
}

/// Diagnostic and traffic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum `tracing` level: `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Write raw protocol lines to daily files in `log_dir`.
    #[serde(default)]
    pub traffic_log: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            traffic_log: false,
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// A [`ClientBuilder`] carrying everything in this config except the
    /// transport, which is dialled from `server.addr`.
    pub fn client_builder(&self) -> ClientBuilder {
        let server = &self.server;
        let mut builder = ClientBuilder::default()
            .addr(server.addr.clone())
            .nick(server.nickname.clone())
            .version(server.version.clone())
            .debug(server.debug)
            .reconnect(ReconnectPolicy::from(&self.reconnect));
        if let Some(user) = &server.username {
            builder = builder.user(user.clone());
        }
        if let Some(realname) = &server.realname {
            builder = builder.real_name(realname.clone());
        }
        if self.logging.traffic_log {
            builder = builder.traffic_log(TrafficLog::new(&self.logging.log_dir, &server.name));
        }
        builder
    }
}

fn default_name() -> String {
    "libera".to_string()
}
fn default_addr() -> String {
    "irc.libera.chat:6667".to_string()
}
fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}
fn default_quit_message() -> String {
    "ferric-irc".to_string()
}
fn default_attempts() -> u32 {
    10
}
fn default_initial_delay() -> u64 {
    5
}
fn default_level() -> String {
    "info".to_string()
}
fn default_log_dir() -> String {
    "~/.local/share/ferric-irc/logs".to_string()
}
