use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    infra::config::{AppConfig, ChatConfig, IdentityConfig, LogConfig, TwitchConfig},
    usecases::color_assigner::ColorStrategy,
};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub twitch: Option<FileTwitchConfig>,
    pub identity: Option<FileIdentityConfig>,
    pub chat: Option<FileChatConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(twitch) = self.twitch {
            twitch.merge_into(&mut config.twitch);
        }

        if let Some(identity) = self.identity {
            identity.merge_into(&mut config.identity);
        }

        if let Some(chat) = self.chat {
            chat.merge_into(&mut config.chat);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTwitchConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub reconnect: Option<bool>,
    pub reconnect_interval_ms: Option<u64>,
    pub reconnect_decay: Option<f64>,
    pub max_reconnect_interval_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
}

impl FileTwitchConfig {
    fn merge_into(self, config: &mut TwitchConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }

        if let Some(port) = self.port {
            config.port = port;
        }

        if let Some(reconnect) = self.reconnect {
            config.reconnect = reconnect;
        }

        if let Some(interval_ms) = self.reconnect_interval_ms {
            config.reconnect_interval_ms = interval_ms;
        }

        if let Some(decay) = self.reconnect_decay {
            config.reconnect_decay = decay;
        }

        if let Some(max_interval_ms) = self.max_reconnect_interval_ms {
            config.max_reconnect_interval_ms = max_interval_ms;
        }

        if let Some(max_attempts) = self.max_reconnect_attempts {
            config.max_reconnect_attempts = Some(max_attempts);
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FileIdentityConfig {
    pub username: Option<String>,
    pub token: Option<String>,
}

impl FileIdentityConfig {
    fn merge_into(self, config: &mut IdentityConfig) {
        if let Some(username) = self.username {
            config.username = username;
        }

        if let Some(token) = self.token {
            config.token = token;
        }
    }
}

impl std::fmt::Debug for FileIdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIdentityConfig")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileChatConfig {
    pub channel: Option<String>,
    pub color_strategy: Option<ColorStrategy>,
}

impl FileChatConfig {
    fn merge_into(self, config: &mut ChatConfig) {
        if let Some(channel) = self.channel {
            config.channel = channel;
        }

        if let Some(strategy) = self.color_strategy {
            config.color_strategy = strategy;
        }
    }
}
