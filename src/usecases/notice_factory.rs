use chrono::Utc;
use uuid::Uuid;

use crate::domain::{frame::FrameTag, notice::Notice, room_state::FollowersOnly};

/// What a notice is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticePayload {
    FollowersOnly(FollowersOnly),
    /// A server NOTICE, kept verbatim.
    Server {
        text: String,
        msg_id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoticeFactory;

impl NoticeFactory {
    /// Builds a fresh notice. Identical inputs still yield distinct notices.
    pub fn wrap(&self, tag: FrameTag, payload: NoticePayload) -> Notice {
        let (title, detail) = describe(payload);

        Notice {
            id: Uuid::new_v4().to_string(),
            time: Utc::now(),
            title,
            detail,
            source: tag,
        }
    }
}

fn describe(payload: NoticePayload) -> (String, Option<String>) {
    match payload {
        NoticePayload::FollowersOnly(FollowersOnly::Disabled) => (
            "This room is no longer in followers-only mode.".to_owned(),
            None,
        ),
        NoticePayload::FollowersOnly(FollowersOnly::Enabled { minutes }) => {
            let detail = (minutes > 0).then(|| {
                format!(
                    "Followers must have followed for at least {} to chat.",
                    plural(minutes, "minute")
                )
            });
            ("This room is in followers-only mode.".to_owned(), detail)
        }
        NoticePayload::Server { text, msg_id } => (text, msg_id),
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
