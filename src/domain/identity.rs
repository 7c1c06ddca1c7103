use std::fmt;

/// Login credentials for the chat service.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub token: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn login(&self) -> String {
        self.username.trim().to_ascii_lowercase()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
