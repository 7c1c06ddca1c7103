use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::color::{default_palette, Color, ColorCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStrategy {
    #[default]
    Random,
    RoundRobin,
}

/// Picks display colors for users that have none.
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<Color>,
    strategy: ColorStrategy,
    cursor: usize,
}

impl ColorAssigner {
    pub fn new(strategy: ColorStrategy) -> Self {
        Self::with_palette(default_palette(), strategy)
    }

    /// An empty palette falls back to the default one.
    pub fn with_palette(palette: Vec<Color>, strategy: ColorStrategy) -> Self {
        let palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };

        Self {
            palette,
            strategy,
            cursor: 0,
        }
    }

    /// Returns the color cached for `user_id`, assigning one on first sight.
    pub fn assign(&mut self, cache: &mut ColorCache, user_id: &str) -> Color {
        if let Some(color) = cache.get(user_id) {
            return color.clone();
        }

        let color = self.next_color();
        tracing::trace!(user_id, color = %color, "assigned display color");
        cache.insert_if_absent(user_id, color)
    }

    fn next_color(&mut self) -> Color {
        match self.strategy {
            ColorStrategy::RoundRobin => {
                let color = self.palette[self.cursor % self.palette.len()].clone();
                self.cursor = (self.cursor + 1) % self.palette.len();
                color
            }
            ColorStrategy::Random => self
                .palette
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_else(|| self.palette[0].clone()),
        }
    }
}
