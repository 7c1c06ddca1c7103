//! Style definitions for console output.

use crossterm::style::{Attribute, Color as TermColor, ContentStyle, Stylize};

use crate::domain::color::Color;

/// Style for the sender name, in the user's resolved color.
pub fn sender_style(color: &Color) -> ContentStyle {
    let style = ContentStyle::new().bold();
    match color.rgb() {
        Some((r, g, b)) => style.with(TermColor::Rgb { r, g, b }),
        None => style,
    }
}

/// Style for `/me` action text.
pub fn action_style(color: &Color) -> ContentStyle {
    let mut style = sender_style(color);
    style.attributes.unset(Attribute::Bold);
    style.italic()
}

/// Style for timestamps.
pub fn timestamp_style() -> ContentStyle {
    ContentStyle::new().dark_grey()
}

/// Style for notices and status markers (dimmed).
pub fn notice_style() -> ContentStyle {
    ContentStyle::new().dim()
}
