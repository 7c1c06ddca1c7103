/// Connection state of one session, as driven by transport events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Logon,
    Joined,
    Reconnecting,
}

impl SessionStatus {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Disconnected => "SESSION_DISCONNECTED",
            Self::Connecting => "SESSION_CONNECTING",
            Self::Connected => "SESSION_CONNECTED",
            Self::Logon => "SESSION_LOGON",
            Self::Joined => "SESSION_JOINED",
            Self::Reconnecting => "SESSION_RECONNECTING",
        }
    }

    /// Whether `next` is a legal step from `self`.
    ///
    /// Teardown to `Disconnected` is always allowed. Transport loss may
    /// interrupt the handshake at any point, so every live state can move
    /// to `Reconnecting`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;

        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Reconnecting, Connecting)
                | (Connecting, Connected)
                | (Connected, Logon)
                | (Logon, Joined)
                | (Connecting | Connected | Logon | Joined, Reconnecting)
        )
    }

    /// The status reported to collaborators, if this state has one.
    pub fn reported(self) -> Option<Status> {
        match self {
            Self::Disconnected => Some(Status::Disconnected),
            Self::Connecting => Some(Status::Connecting),
            Self::Connected => Some(Status::Connected),
            Self::Logon => Some(Status::Logon),
            Self::Reconnecting => Some(Status::Reconnecting),
            Self::Joined => None,
        }
    }
}

/// Status published to collaborators through the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Default,
    Connecting,
    Connected,
    Logon,
    Disconnected,
    Reconnecting,
}

impl Status {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Logon => "logon",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
        }
    }
}
