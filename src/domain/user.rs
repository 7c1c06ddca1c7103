use super::color::Color;

/// A chat participant as described by the sender tags of one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub color: Option<Color>,
    pub is_self: bool,
    pub is_moderator: bool,
    pub is_broadcaster: bool,
    pub is_subscriber: bool,
    pub is_vip: bool,
}

impl User {
    /// Display name if the server sent one, otherwise the login.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.login
        } else {
            &self.display_name
        }
    }

    /// Whether this user can moderate the channel.
    pub fn can_moderate(&self) -> bool {
        self.is_moderator || self.is_broadcaster
    }
}
