use std::{collections::HashMap, fmt};

use thiserror::Error;

/// Routing tag of a frame produced by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameTag {
    Connecting,
    Connected,
    Logon,
    Join,
    Disconnected,
    Reconnecting,
    RoomState,
    Message,
    FollowersOnly,
    Notice,
    Other(String),
}

impl FrameTag {
    pub fn as_label(&self) -> &str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Logon => "logon",
            Self::Join => "join",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::RoomState => "roomstate",
            Self::Message => "message",
            Self::FollowersOnly => "followersonly",
            Self::Notice => "notice",
            Self::Other(command) => command,
        }
    }
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One tagged protocol event. The payload is only interpreted by the
/// handler registered for the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub tag: FrameTag,
    pub payload: FramePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Empty,
    Reason(String),
    Line(IrcLine),
}

impl RawFrame {
    pub fn lifecycle(tag: FrameTag) -> Self {
        Self {
            tag,
            payload: FramePayload::Empty,
        }
    }

    pub fn with_reason(tag: FrameTag, reason: impl Into<String>) -> Self {
        Self {
            tag,
            payload: FramePayload::Reason(reason.into()),
        }
    }

    pub fn line(tag: FrameTag, line: IrcLine) -> Self {
        Self {
            tag,
            payload: FramePayload::Line(line),
        }
    }

    /// The protocol line carried by this frame.
    pub fn irc(&self) -> Result<&IrcLine, ParseError> {
        match &self.payload {
            FramePayload::Line(line) => Ok(line),
            _ => Err(ParseError::UnexpectedPayload {
                tag: self.tag.clone(),
            }),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.payload {
            FramePayload::Reason(reason) => Some(reason),
            _ => None,
        }
    }
}

/// A parsed IRCv3 line: `@tags :prefix COMMAND params :trailing`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IrcLine {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcLine {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Nick part of `nick!user@host`.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split('!').next().unwrap_or(prefix);
        (!nick.is_empty()).then_some(nick)
    }

    /// The `#channel` param, without the leading `#`.
    pub fn channel(&self) -> Option<&str> {
        self.params
            .first()
            .and_then(|param| param.strip_prefix('#'))
    }

    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed protocol line: {0}")]
    MalformedLine(String),
    #[error("frame `{tag}` carries no protocol line")]
    UnexpectedPayload { tag: FrameTag },
    #[error("missing `{0}`")]
    Missing(&'static str),
    #[error("tag `{name}` has invalid value `{value}`")]
    InvalidTag { name: &'static str, value: String },
}
