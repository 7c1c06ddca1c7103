//! UI layer: console rendering of chat events.

pub mod console;
mod styles;

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
