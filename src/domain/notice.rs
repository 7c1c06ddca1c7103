use chrono::{DateTime, Utc};

use super::frame::FrameTag;

/// A system-generated log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: String,
    pub time: DateTime<Utc>,
    pub title: String,
    pub detail: Option<String>,
    pub source: FrameTag,
}
