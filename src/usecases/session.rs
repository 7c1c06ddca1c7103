use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    color::ColorCache, identity::Identity, room_state::RoomStateTracker, status::SessionStatus,
};

/// One logical connection to one channel, and the caches scoped to it.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    identity: Identity,
    channel: String,
    status: SessionStatus,
    colors: ColorCache,
    rooms: RoomStateTracker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal status transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

impl Session {
    pub fn new(identity: Identity, channel: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            channel: channel.into(),
            status: SessionStatus::Disconnected,
            colors: ColorCache::default(),
            rooms: RoomStateTracker::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Applies `next`. Returns `Ok(false)` when already in that state.
    pub fn transition(&mut self, next: SessionStatus) -> Result<bool, InvalidTransition> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        Ok(true)
    }

    pub fn colors(&self) -> &ColorCache {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut ColorCache {
        &mut self.colors
    }

    pub fn rooms(&self) -> &RoomStateTracker {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut RoomStateTracker {
        &mut self.rooms
    }

    /// Drops every per-session cache and marks the session disconnected.
    pub fn destroy(&mut self) {
        self.colors.clear();
        self.rooms.clear();
        self.status = SessionStatus::Disconnected;
    }
}
