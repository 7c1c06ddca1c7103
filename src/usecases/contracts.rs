use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{
    domain::{
        frame::RawFrame, identity::Identity, message::LogEntry, room_state::RoomState,
        status::Status, user::User,
    },
    twitch::irc::OutboundCommand,
};

/// Receiver of normalized chat events (log view, chatter list, status bar).
pub trait ChatSink: Send + Sync {
    fn add_log(&self, entry: LogEntry) -> Result<(), DownstreamError>;
    fn update_room_state(&self, snapshot: RoomState) -> Result<(), DownstreamError>;
    fn update_status(&self, status: Status) -> Result<(), DownstreamError>;
    fn add_chatter_with_message(
        &self,
        user: Arc<User>,
        message_id: &str,
    ) -> Result<(), DownstreamError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sink rejected {event}: {reason}")]
pub struct DownstreamError {
    pub event: &'static str,
    pub reason: String,
}

impl DownstreamError {
    pub fn new(event: &'static str, reason: impl Into<String>) -> Self {
        Self {
            event,
            reason: reason.into(),
        }
    }
}

pub type FrameSender = mpsc::UnboundedSender<RawFrame>;

/// Everything one transport attempt needs. Channels outlive the attempt so
/// queued outbound commands survive a reconnect.
pub struct TransportLink<'a> {
    pub identity: &'a Identity,
    pub channel: &'a str,
    pub frames: &'a FrameSender,
    pub outbound: &'a mut mpsc::UnboundedReceiver<OutboundCommand>,
    pub shutdown: &'a mut watch::Receiver<bool>,
}

/// How a transport attempt ended without a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClosed {
    /// Teardown was requested through the shutdown signal.
    Shutdown,
    /// The remote side ended the link.
    Remote(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("authentication rejected: {0}")]
    AuthenticationFailed(String),
}

impl TransportError {
    /// Fatal errors end the session instead of triggering a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}

/// A full-duplex link to the chat service.
///
/// `run` performs one connection attempt: it emits `Connected` once the
/// link is up, forwards every inbound frame in order, writes queued
/// outbound commands, and returns when the link drops or shutdown fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn run(&self, link: TransportLink<'_>) -> Result<LinkClosed, TransportError>;
}
