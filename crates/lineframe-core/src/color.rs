//! Display colors for elements and catalog entries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An opaque RGB color, written as `#rrggbb` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const MEMBER: Color = Color::rgb(0x66, 0x66, 0x66);
    pub const FLOOR: Color = Color::rgb(0x67, 0xa9, 0xcf);
    pub const WALL: Color = Color::rgb(0xb5, 0x7a, 0x6b);
    pub const AREA_LOAD: Color = Color::rgb(0xe5, 0x73, 0x73);
    pub const LINE_LOAD: Color = Color::rgb(0xff, 0xb7, 0x4d);
    pub const POINT_LOAD: Color = Color::rgb(0xba, 0x68, 0xc8);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a strict `#rrggbb` string (surrounding whitespace is ignored).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    /// Parse `text`, falling back to `fallback` when it is missing or malformed.
    pub fn parse_or(text: Option<&str>, fallback: Color) -> Self {
        text.and_then(Self::from_hex).unwrap_or(fallback)
    }

    /// Lower-case `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::MEMBER
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::from_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color: {text:?}")))
    }
}

/// Lenient color field for file records: anything that is not a valid
/// `#rrggbb` string (including `null` or a number) reads as `None`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(Color::from_hex))
}
