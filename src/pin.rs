use eframe::egui;
use serde::{Deserialize, Serialize};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PinColor {
    pub const BLACK: PinColor = PinColor::rgb(0, 0, 0);
    /// Fill used for pins that do not match the active search.
    pub const DIMMED: PinColor = PinColor::rgba(200, 200, 200, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_egui(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ── Tags ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Important,
    Warning,
    Info,
    // Unknown names from older sessions land here.
    #[default]
    #[serde(other)]
    Default,
}

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::Default, Tag::Important, Tag::Warning, Tag::Info];

    pub fn color(self) -> PinColor {
        match self {
            Tag::Important => PinColor::rgb(0xf9, 0x73, 0x16),
            Tag::Warning => PinColor::rgb(0xea, 0xb3, 0x08),
            Tag::Info => PinColor::rgb(0x3b, 0x82, 0xf6),
            Tag::Default => PinColor::rgb(0xef, 0x44, 0x44),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tag::Default => "Default",
            Tag::Important => "Important",
            Tag::Warning => "Warning",
            Tag::Info => "Info",
        }
    }
}

// ── Pins ────────────────────────────────────────────────────────────────────

/// Store-assigned pin identity. Not persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Pin {
    pub id: PinId,
    pub x: f32,
    pub y: f32,
    pub title: String,
    pub description: String,
    pub tag: Tag,
}

impl Pin {
    pub fn pos(&self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    /// `query` must already be lowercase; an empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty()
            || self.title.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
    }

    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.description.is_empty()
    }
}

/// Lowercased, trimmed search text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
