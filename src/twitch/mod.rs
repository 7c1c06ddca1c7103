//! Twitch IRC adapter: line codec, frame mapping, and the TCP transport.

pub mod frames;
pub mod irc;
pub mod transport;

/// Returns the twitch module name for smoke checks.
pub fn module_name() -> &'static str {
    "twitch"
}
