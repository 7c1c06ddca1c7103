use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    twitch::transport::{DEFAULT_HOST, DEFAULT_PORT},
    usecases::{
        color_assigner::ColorStrategy,
        connection::{ReconnectPolicy, SessionSettings},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub twitch: TwitchConfig,
    pub identity: IdentityConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            reconnect: self.twitch.reconnect_policy(),
            color_strategy: self.chat.color_strategy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Daily-rolled log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TwitchConfig {
    pub host: String,
    pub port: u16,
    pub reconnect: bool,
    pub reconnect_interval_ms: u64,
    pub reconnect_decay: f64,
    pub max_reconnect_interval_ms: u64,
    pub max_reconnect_attempts: Option<u32>,
}

impl TwitchConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.reconnect,
            interval: Duration::from_millis(self.reconnect_interval_ms),
            decay: self.reconnect_decay,
            max_interval: Duration::from_millis(self.max_reconnect_interval_ms),
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            reconnect: true,
            reconnect_interval_ms: 1_000,
            reconnect_decay: 1.5,
            max_reconnect_interval_ms: 30_000,
            max_reconnect_attempts: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IdentityConfig {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChatConfig {
    pub channel: String,
    pub color_strategy: ColorStrategy,
}
