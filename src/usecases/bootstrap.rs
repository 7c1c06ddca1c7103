use std::{path::Path, sync::Arc};

use crate::{
    infra::{
        self,
        config::{ConfigOverrides, FileConfigAdapter},
        contracts::ConfigAdapter,
        error::AppError,
    },
    twitch::transport::TcpTransport,
    usecases::{connection::ConnectionManager, context::AppContext, contracts::ChatSink},
};

pub fn bootstrap(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<AppContext, AppError> {
    let adapter = FileConfigAdapter::new(config_path).with_overrides(overrides);
    let context = build_context(&adapter)?;
    let guard = infra::logging::init(&context.config.logging)?;

    Ok(context.with_log_guard(guard))
}

fn build_context(adapter: &dyn ConfigAdapter) -> Result<AppContext, AppError> {
    let config = adapter.load().map_err(AppError::Other)?;

    Ok(AppContext::new(config))
}

/// Wires the TCP transport and `sink` into a connection manager.
pub fn compose_session(context: &AppContext, sink: Arc<dyn ChatSink>) -> ConnectionManager {
    let twitch = &context.config.twitch;
    let transport = Arc::new(TcpTransport::new(twitch.host.clone(), twitch.port));

    ConnectionManager::new(transport, sink, context.config.session_settings())
}
