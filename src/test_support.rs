use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    domain::{message::LogEntry, room_state::RoomState, status::Status, user::User},
    usecases::contracts::{ChatSink, DownstreamError},
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Log(LogEntry),
    RoomState(RoomState),
    Status(Status),
    Chatter { user_id: String, message_id: String },
}

/// Sink that records every call; can be told to reject logs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    reject_logs: Mutex<bool>,
}

impl RecordingSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_logs(&self, reject: bool) {
        *self.reject_logs.lock().expect("sink lock") = reject;
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Log(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    pub fn rooms(&self) -> Vec<RoomState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::RoomState(room) => Some(room),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

impl ChatSink for RecordingSink {
    fn add_log(&self, entry: LogEntry) -> Result<(), DownstreamError> {
        if *self.reject_logs.lock().expect("sink lock") {
            return Err(DownstreamError::new("log", "rejected by test sink"));
        }
        self.push(SinkEvent::Log(entry));
        Ok(())
    }

    fn update_room_state(&self, snapshot: RoomState) -> Result<(), DownstreamError> {
        self.push(SinkEvent::RoomState(snapshot));
        Ok(())
    }

    fn update_status(&self, status: Status) -> Result<(), DownstreamError> {
        self.push(SinkEvent::Status(status));
        Ok(())
    }

    fn add_chatter_with_message(
        &self,
        user: Arc<User>,
        message_id: &str,
    ) -> Result<(), DownstreamError> {
        self.push(SinkEvent::Chatter {
            user_id: user.id.clone(),
            message_id: message_id.to_owned(),
        });
        Ok(())
    }
}
