//! Chart presentation settings.
//!
//! # Invariants
//! - `title` holds at most [`MAX_TITLE_CHARS`] chars, `subtitle` at most
//!   [`MAX_SUBTITLE_CHARS`]; longer input is truncated, not rejected.

use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 30;
pub const MAX_SUBTITLE_CHARS: usize = 50;

const DEFAULT_TITLE: &str = "チャート式マンダラグリッドAI";
const DEFAULT_SUBTITLE: &str = "Target Achievement Map";

/// Color palette applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTheme {
    #[default]
    Blue,
    Cyan,
    Green,
    Yellow,
    Gold,
    Red,
    Pink,
    Purple,
    Gray,
    White,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 10] = [
        Self::Blue,
        Self::Cyan,
        Self::Green,
        Self::Yellow,
        Self::Gold,
        Self::Red,
        Self::Pink,
        Self::Purple,
        Self::Gray,
        Self::White,
    ];

    /// Stable id used in storage and by UI callers.
    pub fn id(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Cyan => "cyan",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Gold => "gold",
            Self::Red => "red",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Gray => "gray",
            Self::White => "white",
        }
    }

    /// Human-facing palette name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Cyan => "Cyan",
            Self::Green => "Green",
            Self::Yellow => "Orange Yellow",
            Self::Gold => "Gold",
            Self::Red => "Red",
            Self::Pink => "Pink",
            Self::Purple => "Purple",
            Self::Gray => "Silver",
            Self::White => "Simple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|theme| theme.id() == normalized)
    }
}

/// Title block and palette of one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSettings {
    pub title: String,
    pub subtitle: String,
    pub color_theme: ColorTheme,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            color_theme: ColorTheme::default(),
        }
    }
}

impl ChartSettings {
    /// Replaces title and subtitle, truncating each to its limit.
    pub fn set_titles(&mut self, title: &str, subtitle: &str) {
        self.title = truncate_chars(title, MAX_TITLE_CHARS);
        self.subtitle = truncate_chars(subtitle, MAX_SUBTITLE_CHARS);
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{ChartSettings, ColorTheme, MAX_TITLE_CHARS};

    #[test]
    fn theme_ids_roundtrip_through_parse() {
        for theme in ColorTheme::ALL {
            assert_eq!(ColorTheme::parse(theme.id()), Some(theme));
        }
        assert_eq!(ColorTheme::parse(" GOLD "), Some(ColorTheme::Gold));
        assert_eq!(ColorTheme::parse("teal"), None);
    }

    #[test]
    fn set_titles_truncates() {
        let mut settings = ChartSettings::default();
        settings.set_titles(&"目".repeat(40), "sub");
        assert_eq!(settings.title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(settings.subtitle, "sub");
    }

    #[test]
    fn theme_serializes_as_snake_case_id() {
        let json = serde_json::to_value(ChartSettings::default()).unwrap();
        assert_eq!(json["color_theme"], "blue");
    }
}
