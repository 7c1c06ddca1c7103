use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infra::{
    config::{load, AppConfig},
    contracts::ConfigAdapter,
};

/// Command-line values that win over the file and the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub channel: Option<String>,
    pub username: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(channel) = &self.channel {
            config.chat.channel = channel.clone();
        }

        if let Some(username) = &self.username {
            config.identity.username = username.clone();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileConfigAdapter {
    path: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl FileConfigAdapter {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            overrides: ConfigOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        let mut config = load(self.path.as_deref())?;
        self.overrides.apply(&mut config);
        Ok(config)
    }
}
