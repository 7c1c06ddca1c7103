use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{
    domain::{
        frame::{FrameTag, ParseError, RawFrame},
        message::LogEntry,
        status::SessionStatus,
    },
    twitch::frames,
    usecases::{
        contracts::{ChatSink, DownstreamError},
        message_parser::MessageParser,
        notice_factory::{NoticeFactory, NoticePayload},
        session::{InvalidTransition, Session},
    },
};

const FRAME_HANDLER_FAILED: &str = "CHAT_FRAME_HANDLER_FAILED";
const FRAME_DROPPED: &str = "CHAT_FRAME_DROPPED";
const SESSION_STATUS_CHANGED: &str = "CHAT_SESSION_STATUS_CHANGED";
const SESSION_DESTROYED: &str = "CHAT_SESSION_DESTROYED";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Routes frames to their handler, one at a time, in arrival order.
///
/// The dispatcher owns the session, so room state and the color cache are
/// only ever touched from here.
pub struct EventDispatcher {
    session: Session,
    parser: MessageParser,
    notices: NoticeFactory,
    sink: Arc<dyn ChatSink>,
    status_tx: Option<watch::Sender<SessionStatus>>,
}

impl EventDispatcher {
    pub fn new(session: Session, parser: MessageParser, sink: Arc<dyn ChatSink>) -> Self {
        Self {
            session,
            parser,
            notices: NoticeFactory,
            sink,
            status_tx: None,
        }
    }

    /// Mirrors every accepted status change into `status_tx`.
    pub fn with_status_publisher(mut self, status_tx: watch::Sender<SessionStatus>) -> Self {
        self.status_tx = Some(status_tx);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handles one frame. Failures are logged and never propagate.
    pub fn dispatch(&mut self, frame: RawFrame) {
        if let Err(error) = self.handle(&frame) {
            tracing::warn!(
                code = FRAME_HANDLER_FAILED,
                session_id = %self.session.id(),
                tag = %frame.tag,
                error = %error,
                "frame handler failed; continuing with next frame"
            );
        }
    }

    fn handle(&mut self, frame: &RawFrame) -> Result<(), DispatchError> {
        match &frame.tag {
            FrameTag::Connecting => self.on_status(SessionStatus::Connecting, frame),
            FrameTag::Connected => self.on_status(SessionStatus::Connected, frame),
            FrameTag::Logon => self.on_status(SessionStatus::Logon, frame),
            FrameTag::Join => self.on_status(SessionStatus::Joined, frame),
            FrameTag::Disconnected => self.on_status(SessionStatus::Disconnected, frame),
            FrameTag::Reconnecting => self.on_status(SessionStatus::Reconnecting, frame),
            FrameTag::RoomState => self.on_room_state(frame),
            FrameTag::Message => self.on_message(frame),
            FrameTag::FollowersOnly => self.on_followers_only(frame),
            FrameTag::Notice => self.on_notice(frame),
            FrameTag::Other(command) => {
                tracing::debug!(
                    code = FRAME_DROPPED,
                    command = %command,
                    "no handler for frame; dropped"
                );
                Ok(())
            }
        }
    }

    fn on_status(&mut self, next: SessionStatus, frame: &RawFrame) -> Result<(), DispatchError> {
        let previous = self.session.status();
        if !self.session.transition(next)? {
            return Ok(());
        }

        tracing::info!(
            code = SESSION_STATUS_CHANGED,
            session_id = %self.session.id(),
            channel = self.session.channel(),
            from = previous.as_label(),
            to = next.as_label(),
            reason = frame.reason().unwrap_or_default(),
            "session status changed"
        );

        if let Some(status_tx) = &self.status_tx {
            status_tx.send_replace(next);
        }
        if let Some(status) = next.reported() {
            self.sink.update_status(status)?;
        }
        Ok(())
    }

    fn on_room_state(&mut self, frame: &RawFrame) -> Result<(), DispatchError> {
        let line = frame.irc()?;
        let channel = frames::channel(line)?;
        let update = frames::room_state_update(line)?;

        let snapshot = self.session.rooms_mut().update(&channel, update);
        self.sink.update_room_state(snapshot)?;
        Ok(())
    }

    fn on_message(&mut self, frame: &RawFrame) -> Result<(), DispatchError> {
        let line = frame.irc()?;
        let own_login = self.session.identity().login();
        let (sender, is_self) = frames::sender(line, &own_login)?;

        let Some(message) =
            self.parser
                .parse(frame, sender, is_self, self.session.colors_mut())?
        else {
            return Ok(());
        };

        let user = Arc::clone(&message.user);
        let message_id = message.id.clone();
        self.append_log(LogEntry::Message(message))?;
        self.sink.add_chatter_with_message(user, &message_id)?;
        Ok(())
    }

    fn on_followers_only(&mut self, frame: &RawFrame) -> Result<(), DispatchError> {
        let mode = frames::followers_only(frame.irc()?)?;
        let notice = self
            .notices
            .wrap(frame.tag.clone(), NoticePayload::FollowersOnly(mode));

        self.append_log(LogEntry::Notice(notice))?;
        Ok(())
    }

    fn on_notice(&mut self, frame: &RawFrame) -> Result<(), DispatchError> {
        let (text, msg_id) = frames::notice(frame.irc()?)?;
        let notice = self
            .notices
            .wrap(frame.tag.clone(), NoticePayload::Server { text, msg_id });

        self.append_log(LogEntry::Notice(notice))?;
        Ok(())
    }

    fn append_log(&self, entry: LogEntry) -> Result<(), DownstreamError> {
        tracing::trace!(
            session_id = %self.session.id(),
            kind = entry.kind_label(),
            id = entry.id(),
            "appending log entry"
        );
        self.sink.add_log(entry)
    }

    /// Ends the session: reports `Disconnected` if nobody did yet and drops
    /// all session caches.
    pub fn finish(mut self) {
        if self.session.status() != SessionStatus::Disconnected {
            self.dispatch(RawFrame::with_reason(
                FrameTag::Disconnected,
                "frame stream closed",
            ));
        }

        self.session.destroy();
        tracing::info!(
            code = SESSION_DESTROYED,
            session_id = %self.session.id(),
            channel = self.session.channel(),
            "session destroyed"
        );
    }
}

/// Drains `frames` until every sender is gone, then finishes the session.
pub async fn run(mut dispatcher: EventDispatcher, mut frames: mpsc::UnboundedReceiver<RawFrame>) {
    while let Some(frame) = frames.recv().await {
        dispatcher.dispatch(frame);
    }
    dispatcher.finish();
}
