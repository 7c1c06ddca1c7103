use std::fmt;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{domain::identity::Identity, infra::config::AppConfig};

pub struct AppContext {
    pub config: AppConfig,
    log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            log_guard: None,
        }
    }

    pub fn with_log_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self.log_guard = guard;
        self
    }

    pub fn identity(&self) -> Identity {
        Identity::new(
            self.config.identity.username.clone(),
            self.config.identity.token.clone(),
        )
    }

    pub fn channel(&self) -> &str {
        &self.config.chat.channel
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("file_logging", &self.log_guard.is_some())
            .finish()
    }
}
