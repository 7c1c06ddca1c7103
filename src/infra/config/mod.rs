mod adapter;
mod app_config;
mod file_config;
mod loader;

pub use adapter::{ConfigOverrides, FileConfigAdapter};
pub use app_config::{AppConfig, ChatConfig, IdentityConfig, LogConfig, TwitchConfig};
pub use loader::{load, TOKEN_ENV_VAR};
