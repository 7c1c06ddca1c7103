use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{color::Color, notice::Notice, user::User};

/// Kind of a chat line, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    Action,
    Whisper,
}

impl MessageKind {
    /// Only channel chat and `/me` actions become log messages.
    pub fn is_loggable(self) -> bool {
        matches!(self, Self::Chat | Self::Action)
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Action => "action",
            Self::Whisper => "whisper",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub time: DateTime<Utc>,
    pub kind: MessageKind,
    pub user: Arc<User>,
    pub text: String,
    pub badges: Option<String>,
    pub color: Color,
}

/// One entry of the append-only chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Message(Message),
    Notice(Notice),
}

impl LogEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Message(message) => &message.id,
            Self::Notice(notice) => &notice.id,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Message(message) => message.kind.as_label(),
            Self::Notice(_) => "notice",
        }
    }
}
