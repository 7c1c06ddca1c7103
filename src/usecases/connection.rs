use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    domain::{
        frame::{FrameTag, RawFrame},
        identity::Identity,
        status::SessionStatus,
    },
    twitch::irc::OutboundCommand,
    usecases::{
        color_assigner::{ColorAssigner, ColorStrategy},
        contracts::{ChatSink, FrameSender, LinkClosed, Transport, TransportLink},
        dispatcher::{self, EventDispatcher},
        message_parser::MessageParser,
        session::Session,
    },
};

const SESSION_CONNECT_REQUESTED: &str = "CHAT_SESSION_CONNECT_REQUESTED";
const SESSION_TEARDOWN: &str = "CHAT_SESSION_TEARDOWN";
const SESSION_TEARDOWN_NOOP: &str = "CHAT_SESSION_TEARDOWN_NOOP";
const SESSION_TASK_FAILED: &str = "CHAT_SESSION_TASK_FAILED";
const TRANSPORT_LINK_CLOSED: &str = "CHAT_TRANSPORT_LINK_CLOSED";
const TRANSPORT_LINK_FAILED: &str = "CHAT_TRANSPORT_LINK_FAILED";
const TRANSPORT_FATAL: &str = "CHAT_TRANSPORT_FATAL";
const RECONNECT_SCHEDULED: &str = "CHAT_RECONNECT_SCHEDULED";
const RECONNECT_EXHAUSTED: &str = "CHAT_RECONNECT_EXHAUSTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing username")]
    MissingUsername,
    #[error("missing oauth token")]
    MissingToken,
    #[error("missing channel")]
    MissingChannel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub interval: Duration,
    pub decay: f64,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_millis(1_000),
            decay: 1.5,
            max_interval: Duration::from_millis(30_000),
            max_attempts: None,
        }
    }
}

/// Delay schedule for consecutive failed attempts.
#[derive(Debug)]
struct Backoff<'a> {
    policy: &'a ReconnectPolicy,
    attempts: u32,
    next: Duration,
}

impl<'a> Backoff<'a> {
    fn new(policy: &'a ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            next: policy.interval,
        }
    }

    fn reset(&mut self) {
        self.attempts = 0;
        self.next = self.policy.interval;
    }

    fn next_delay(&mut self) -> Option<Duration> {
        if self
            .policy
            .max_attempts
            .is_some_and(|max| self.attempts >= max)
        {
            return None;
        }

        self.attempts += 1;
        let delay = self.next.min(self.policy.max_interval);
        let grown = self.next.as_secs_f64() * self.policy.decay.max(1.0);
        self.next = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.policy.max_interval)
            .min(self.policy.max_interval);
        Some(delay)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub reconnect: ReconnectPolicy,
    pub color_strategy: ColorStrategy,
}

struct ActiveSession {
    id: Uuid,
    channel: String,
    shutdown_tx: watch::Sender<bool>,
    outbound_tx: mpsc::UnboundedSender<OutboundCommand>,
    status_rx: watch::Receiver<SessionStatus>,
    supervisor: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

/// Owns the live session and the tasks that serve it.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn ChatSink>,
    settings: SessionSettings,
    active: Option<ActiveSession>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn ChatSink>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            transport,
            sink,
            settings,
            active: None,
        }
    }

    /// Starts a session for `channel`, replacing any live one.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect(
        &mut self,
        identity: Identity,
        channel: &str,
    ) -> Result<Uuid, ConfigurationError> {
        let channel = normalize_channel(channel);
        validate(&identity, &channel)?;

        if self.active.is_some() {
            self.disconnect().await;
        }

        let session = Session::new(identity.clone(), channel.clone());
        let session_id = session.id();
        tracing::info!(
            code = SESSION_CONNECT_REQUESTED,
            session_id = %session_id,
            channel = %channel,
            identity = ?identity,
            "connecting chat session"
        );

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(SessionStatus::Connecting);

        let parser = MessageParser::new(ColorAssigner::new(self.settings.color_strategy));
        let dispatcher = EventDispatcher::new(session, parser, Arc::clone(&self.sink))
            .with_status_publisher(status_tx);

        // Connecting is queued before the transport starts, so it is always
        // the first frame of a session.
        let _ = frames_tx.send(RawFrame::lifecycle(FrameTag::Connecting));

        let dispatcher = tokio::spawn(dispatcher::run(dispatcher, frames_rx));
        let supervisor = tokio::spawn(supervise(
            Arc::clone(&self.transport),
            self.settings.reconnect.clone(),
            SupervisedLink {
                identity,
                channel: channel.clone(),
                frames: frames_tx,
                outbound: outbound_rx,
                shutdown: shutdown_rx,
            },
        ));

        self.active = Some(ActiveSession {
            id: session_id,
            channel,
            shutdown_tx,
            outbound_tx,
            status_rx,
            supervisor,
            dispatcher,
        });

        Ok(session_id)
    }

    /// Tears the live session down. Safe to call in any state; calls after
    /// the first have no effect.
    pub async fn disconnect(&mut self) {
        let Some(active) = self.active.take() else {
            tracing::debug!(code = SESSION_TEARDOWN_NOOP, "no live session to tear down");
            return;
        };

        tracing::info!(
            code = SESSION_TEARDOWN,
            session_id = %active.id,
            channel = %active.channel,
            "tearing down chat session"
        );

        let _ = active.shutdown_tx.send(true);
        drop(active.outbound_tx);

        if let Err(error) = active.supervisor.await {
            tracing::warn!(
                code = SESSION_TASK_FAILED,
                task = "supervisor",
                error = %error,
                "session task ended abnormally"
            );
        }
        if let Err(error) = active.dispatcher.await {
            tracing::warn!(
                code = SESSION_TASK_FAILED,
                task = "dispatcher",
                error = %error,
                "session task ended abnormally"
            );
        }
    }

    /// Queues a chat line for the session channel without waiting for it.
    pub fn say(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let Some(active) = &self.active else {
            tracing::debug!("say ignored: no live session");
            return;
        };

        let _ = active.outbound_tx.send(OutboundCommand::Privmsg {
            channel: active.channel.clone(),
            text: text.to_owned(),
        });
    }

    pub fn status(&self) -> SessionStatus {
        self.active
            .as_ref()
            .map(|active| *active.status_rx.borrow())
            .unwrap_or_default()
    }

    /// Waits until the live session reports `status`. Returns `false` if the
    /// session ends first or there is none.
    pub async fn wait_for_status(&self, status: SessionStatus) -> bool {
        let Some(active) = &self.active else {
            return false;
        };

        let mut status_rx = active.status_rx.clone();
        let reached = status_rx.wait_for(|current| *current == status).await.is_ok();
        reached
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn channel(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.channel.as_str())
    }
}

fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_ascii_lowercase()
}

fn validate(identity: &Identity, channel: &str) -> Result<(), ConfigurationError> {
    if identity.login().is_empty() {
        return Err(ConfigurationError::MissingUsername);
    }
    if identity.token.trim().is_empty() {
        return Err(ConfigurationError::MissingToken);
    }
    if channel.is_empty() {
        return Err(ConfigurationError::MissingChannel);
    }
    Ok(())
}

struct SupervisedLink {
    identity: Identity,
    channel: String,
    frames: FrameSender,
    outbound: mpsc::UnboundedReceiver<OutboundCommand>,
    shutdown: watch::Receiver<bool>,
}

/// Runs transport attempts until teardown, a fatal error, or the reconnect
/// policy gives up. Always ends the frame stream with `Disconnected`.
async fn supervise(transport: Arc<dyn Transport>, policy: ReconnectPolicy, mut link: SupervisedLink) {
    let mut backoff = Backoff::new(&policy);

    let reason = loop {
        let outcome = transport
            .run(TransportLink {
                identity: &link.identity,
                channel: &link.channel,
                frames: &link.frames,
                outbound: &mut link.outbound,
                shutdown: &mut link.shutdown,
            })
            .await;

        if *link.shutdown.borrow() {
            break "disconnect requested".to_owned();
        }

        let reason = match outcome {
            Ok(LinkClosed::Shutdown) => break "transport shut down".to_owned(),
            Ok(LinkClosed::Remote(reason)) => {
                tracing::info!(
                    code = TRANSPORT_LINK_CLOSED,
                    reason = %reason,
                    "chat link closed by remote"
                );
                backoff.reset();
                reason
            }
            Err(error) if error.is_fatal() => {
                tracing::error!(
                    code = TRANSPORT_FATAL,
                    error = %error,
                    "chat link failed permanently; not reconnecting"
                );
                break error.to_string();
            }
            Err(error) => {
                tracing::warn!(
                    code = TRANSPORT_LINK_FAILED,
                    error = %error,
                    "chat link failed"
                );
                error.to_string()
            }
        };

        if !policy.enabled {
            break reason;
        }
        let Some(delay) = backoff.next_delay() else {
            tracing::warn!(
                code = RECONNECT_EXHAUSTED,
                attempts = backoff.attempts,
                "reconnect attempts exhausted"
            );
            break reason;
        };

        tracing::info!(
            code = RECONNECT_SCHEDULED,
            delay_ms = delay.as_millis() as u64,
            attempt = backoff.attempts,
            "reconnecting chat link"
        );
        let _ = link
            .frames
            .send(RawFrame::with_reason(FrameTag::Reconnecting, reason));

        tokio::select! {
            _ = link.shutdown.changed() => break "disconnect requested".to_owned(),
            _ = tokio::time::sleep(delay) => {}
        }

        let _ = link
            .frames
            .send(RawFrame::lifecycle(FrameTag::Connecting));
    };

    let _ = link
        .frames
        .send(RawFrame::with_reason(FrameTag::Disconnected, reason));
}
