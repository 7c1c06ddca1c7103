//! Domain layer: chat entities, session state and protocol frames.

pub mod color;
pub mod frame;
pub mod identity;
pub mod message;
pub mod notice;
pub mod room_state;
pub mod status;
pub mod user;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
