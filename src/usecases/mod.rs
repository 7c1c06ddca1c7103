//! Use case layer: chat session workflows and orchestration.

pub mod bootstrap;
pub mod color_assigner;
pub mod connection;
pub mod context;
pub mod contracts;
pub mod dispatcher;
pub mod message_parser;
pub mod notice_factory;
pub mod session;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
