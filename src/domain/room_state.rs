use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FollowersOnly {
    Disabled,
    Enabled { minutes: u32 },
}

/// Moderation flags of one channel. `None` means the server never told us.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RoomState {
    pub channel: String,
    pub room_id: Option<String>,
    pub slow_mode_secs: Option<u64>,
    pub followers_only: Option<FollowersOnly>,
    pub emote_only: Option<bool>,
    pub r9k: Option<bool>,
    pub subscribers_only: Option<bool>,
}

/// A partial room state; only `Some` fields are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomStateUpdate {
    pub room_id: Option<String>,
    pub slow_mode_secs: Option<u64>,
    pub followers_only: Option<FollowersOnly>,
    pub emote_only: Option<bool>,
    pub r9k: Option<bool>,
    pub subscribers_only: Option<bool>,
}

impl RoomStateUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RoomState {
    fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_owned(),
            ..Self::default()
        }
    }

    fn merge(&mut self, update: RoomStateUpdate) {
        if let Some(room_id) = update.room_id {
            self.room_id = Some(room_id);
        }
        if let Some(slow) = update.slow_mode_secs {
            self.slow_mode_secs = Some(slow);
        }
        if let Some(followers_only) = update.followers_only {
            self.followers_only = Some(followers_only);
        }
        if let Some(emote_only) = update.emote_only {
            self.emote_only = Some(emote_only);
        }
        if let Some(r9k) = update.r9k {
            self.r9k = Some(r9k);
        }
        if let Some(subscribers_only) = update.subscribers_only {
            self.subscribers_only = Some(subscribers_only);
        }
    }
}

/// Authoritative room state per channel, built from partial updates.
#[derive(Debug, Clone, Default)]
pub struct RoomStateTracker {
    rooms: HashMap<String, RoomState>,
}

impl RoomStateTracker {
    /// Merges `update` into `channel` and returns the resulting snapshot.
    pub fn update(&mut self, channel: &str, update: RoomStateUpdate) -> RoomState {
        let room = self
            .rooms
            .entry(channel.to_owned())
            .or_insert_with(|| RoomState::new(channel));
        room.merge(update);
        room.clone()
    }

    pub fn serialize(&self, channel: &str) -> Option<RoomState> {
        self.rooms.get(channel).cloned()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
