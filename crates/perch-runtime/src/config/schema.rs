//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use perch_framework::ReplySettings;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerchConfig {
    /// Bot display name, used by the help plugin.
    #[serde(default = "default_name")]
    pub name: String,

    /// Number of source messages whose replies are tracked for edits and
    /// deletions. 0 disables tracking.
    #[serde(default = "default_response_cache_size")]
    pub response_cache_size: i64,

    /// Number of users whose info is cached. 0 disables caching.
    #[serde(default)]
    pub user_info_cache_size: i64,

    /// Reply in the source message's thread.
    #[serde(default)]
    pub threaded_replies: bool,

    /// Also post threaded replies to the channel.
    #[serde(default)]
    pub broadcast_threaded_replies: bool,

    /// Register the built-in help plugin.
    #[serde(default = "default_true")]
    pub help_enabled: bool,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PerchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            response_cache_size: default_response_cache_size(),
            user_info_cache_size: 0,
            threaded_replies: false,
            broadcast_threaded_replies: false,
            help_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl PerchConfig {
    /// Returns the threading settings handed to the dispatcher.
    pub fn reply_settings(&self) -> ReplySettings {
        ReplySettings {
            threaded_replies: self.threaded_replies,
            broadcast_threaded_replies: self.broadcast_threaded_replies,
        }
    }
}

fn default_name() -> String {
    "perch".to_string()
}

fn default_response_cache_size() -> i64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive fragment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires `file_path`.
    File,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used when `output` is `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `perch_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PerchConfig::default();
        assert_eq!(config.name, "perch");
        assert_eq!(config.response_cache_size, 5000);
        assert_eq!(config.user_info_cache_size, 0);
        assert!(config.help_enabled);
        assert_eq!(config.reply_settings(), ReplySettings::default());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_reply_settings() {
        let config = PerchConfig {
            threaded_replies: true,
            broadcast_threaded_replies: true,
            ..Default::default()
        };
        let settings = config.reply_settings();
        assert!(settings.threaded_replies);
        assert!(settings.broadcast_threaded_replies);
    }
}
