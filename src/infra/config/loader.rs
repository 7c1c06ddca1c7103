use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Overrides `identity.token` so the token can stay out of the file.
pub const TOKEN_ENV_VAR: &str = "RTCHAT_TOKEN";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if config_path.exists() {
        let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
            path: config_path.clone(),
            source,
        })?;

        let file_config: FileConfig =
            toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
                path: config_path,
                source,
            })?;

        file_config.merge_into(&mut config);
    }

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), AppError> {
    let decay = config.twitch.reconnect_decay;
    if !decay.is_finite() || decay < 1.0 {
        return Err(AppError::ConfigInvalid {
            field: "twitch.reconnect_decay",
            reason: format!("must be a finite number >= 1, got {decay}"),
        });
    }

    if config.twitch.reconnect_interval_ms > config.twitch.max_reconnect_interval_ms {
        return Err(AppError::ConfigInvalid {
            field: "twitch.reconnect_interval_ms",
            reason: "must not exceed twitch.max_reconnect_interval_ms".to_owned(),
        });
    }

    Ok(())
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(token) = env::var(TOKEN_ENV_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
    {
        config.identity.token = token;
    }
}
