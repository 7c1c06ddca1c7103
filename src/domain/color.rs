use std::{collections::HashMap, fmt};

/// A display color as sent on the wire, normally `#RRGGBB`.
///
/// Values are kept verbatim; the server is trusted to send something a
/// renderer can use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a `#RRGGBB` value into channels.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Twitch's default name colors, used for users that never picked one.
pub const DEFAULT_PALETTE: [&str; 15] = [
    "#FF0000", // Red
    "#0000FF", // Blue
    "#008000", // Green
    "#B22222", // FireBrick
    "#FF7F50", // Coral
    "#9ACD32", // YellowGreen
    "#FF4500", // OrangeRed
    "#2E8B57", // SeaGreen
    "#DAA520", // GoldenRod
    "#D2691E", // Chocolate
    "#5F9EA0", // CadetBlue
    "#1E90FF", // DodgerBlue
    "#FF69B4", // HotPink
    "#8A2BE2", // BlueViolet
    "#00FF7F", // SpringGreen
];

pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.iter().copied().map(Color::new).collect()
}

/// Colors handed out during one session, keyed by user id.
///
/// Entries are never overwritten: the first color stored for an id wins
/// until the cache is cleared with its session.
#[derive(Debug, Clone, Default)]
pub struct ColorCache {
    by_user_id: HashMap<String, Color>,
}

impl ColorCache {
    pub fn get(&self, user_id: &str) -> Option<&Color> {
        self.by_user_id.get(user_id)
    }

    /// Stores `color` unless the id already has one; returns the stored color.
    pub fn insert_if_absent(&mut self, user_id: &str, color: Color) -> Color {
        self.by_user_id
            .entry(user_id.to_owned())
            .or_insert(color)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.by_user_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_user_id.clear();
    }
}
