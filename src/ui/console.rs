//! Line-oriented console sink.
//!
//! Every sink call renders at most one line. Output goes through a shared
//! writer so tests can capture it.

use std::{
    collections::HashMap,
    fmt::Display,
    io::{self, Write},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, Utc};
use crossterm::style::ContentStyle;

use crate::{
    domain::{
        message::{LogEntry, Message, MessageKind},
        notice::Notice,
        room_state::{FollowersOnly, RoomState},
        status::Status,
        user::User,
    },
    usecases::contracts::{ChatSink, DownstreamError},
};

use super::styles;

type SharedWriter = Box<dyn Write + Send>;

pub struct ConsoleSink {
    out: Mutex<SharedWriter>,
    styled: bool,
    chatters: Mutex<HashMap<String, Arc<User>>>,
}

impl ConsoleSink {
    pub fn new(out: impl Write + Send + 'static, styled: bool) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            styled,
            chatters: Mutex::new(HashMap::new()),
        }
    }

    pub fn stdout(styled: bool) -> Self {
        Self::new(io::stdout(), styled)
    }

    /// Distinct users seen speaking in this process.
    pub fn chatter_count(&self) -> usize {
        self.chatters.lock().map(|chatters| chatters.len()).unwrap_or(0)
    }

    fn paint<D: Display>(&self, style: ContentStyle, value: D) -> String {
        if self.styled {
            style.apply(value).to_string()
        } else {
            value.to_string()
        }
    }

    fn render_entry(&self, entry: &LogEntry) -> String {
        match entry {
            LogEntry::Message(message) => self.render_message(message),
            LogEntry::Notice(notice) => self.render_notice(notice),
        }
    }

    fn render_message(&self, message: &Message) -> String {
        let time = self.paint(styles::timestamp_style(), clock(message.time));
        let name = if message.user.can_moderate() {
            format!("@{}", message.user.name())
        } else {
            message.user.name().to_owned()
        };
        match message.kind {
            MessageKind::Action => format!(
                "{time} {}",
                self.paint(
                    styles::action_style(&message.color),
                    format!("* {name} {}", message.text)
                )
            ),
            MessageKind::Chat | MessageKind::Whisper => format!(
                "{time} {}: {}",
                self.paint(styles::sender_style(&message.color), name),
                message.text
            ),
        }
    }

    fn render_notice(&self, notice: &Notice) -> String {
        let body = match &notice.detail {
            Some(detail) => format!("-- {} {detail}", notice.title),
            None => format!("-- {}", notice.title),
        };
        format!(
            "{} {}",
            self.paint(styles::timestamp_style(), clock(notice.time)),
            self.paint(styles::notice_style(), body)
        )
    }

    fn write_line(&self, event: &'static str, line: &str) -> Result<(), DownstreamError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| DownstreamError::new(event, "console writer lock poisoned"))?;
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|error| DownstreamError::new(event, error.to_string()))
    }
}

impl ChatSink for ConsoleSink {
    fn add_log(&self, entry: LogEntry) -> Result<(), DownstreamError> {
        let line = self.render_entry(&entry);
        self.write_line("log", &line)
    }

    fn update_room_state(&self, snapshot: RoomState) -> Result<(), DownstreamError> {
        let line = self.paint(
            styles::notice_style(),
            format!("== #{}: {} ==", snapshot.channel, describe_room(&snapshot)),
        );
        self.write_line("room_state", &line)
    }

    fn update_status(&self, status: Status) -> Result<(), DownstreamError> {
        let line = self.paint(
            styles::notice_style(),
            format!("== status: {} ==", status.as_label()),
        );
        self.write_line("status", &line)
    }

    fn add_chatter_with_message(
        &self,
        user: Arc<User>,
        _message_id: &str,
    ) -> Result<(), DownstreamError> {
        let mut chatters = self
            .chatters
            .lock()
            .map_err(|_| DownstreamError::new("chatter", "chatter list lock poisoned"))?;
        chatters.insert(user.id.clone(), user);
        Ok(())
    }
}

fn clock(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M").to_string()
}

fn describe_room(room: &RoomState) -> String {
    let mut modes = Vec::new();
    if let Some(secs) = room.slow_mode_secs.filter(|secs| *secs > 0) {
        modes.push(format!("slow {secs}s"));
    }
    if let Some(FollowersOnly::Enabled { minutes }) = room.followers_only {
        modes.push(format!("followers-only {minutes}m"));
    }
    if room.emote_only == Some(true) {
        modes.push("emote-only".to_owned());
    }
    if room.r9k == Some(true) {
        modes.push("r9k".to_owned());
    }
    if room.subscribers_only == Some(true) {
        modes.push("subscribers-only".to_owned());
    }

    if modes.is_empty() {
        "no restrictions".to_owned()
    } else {
        modes.join(", ")
    }
}
