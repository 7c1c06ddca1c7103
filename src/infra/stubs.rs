use anyhow::Result;

use crate::infra::{
    config::{AppConfig, ChatConfig, IdentityConfig},
    contracts::ConfigAdapter,
};

/// Config source with a usable identity and channel, for wiring tests.
#[derive(Debug, Clone, Default)]
pub struct StubConfigAdapter;

impl ConfigAdapter for StubConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        Ok(AppConfig {
            identity: IdentityConfig {
                username: "stub_user".to_owned(),
                token: "stub-token".to_owned(),
            },
            chat: ChatConfig {
                channel: "stub_channel".to_owned(),
                ..ChatConfig::default()
            },
            ..AppConfig::default()
        })
    }
}
