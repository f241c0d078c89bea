//! Color values and parsing.
//!
//! Symbolizer colors use CSS-style notation, following
//! [OGC Symbology Encoding §11](https://www.ogc.org/standard/se/) which
//! encodes `CssParameter` fills and strokes as `#RRGGBB` hex strings.

use serde::{Deserialize, Serialize};

/// sRGB color represented as RGBA components.
///
/// Serializes to and from hex string notation so map documents can write
/// `"#ff0000"` instead of a four-field object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorValue {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
    /// Alpha channel (0-255, 255 = fully opaque)
    pub a: u8,
}

impl ColorValue {
    /// Black (#000000)
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    /// White (#ffffff)
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    /// Parse a hex color: 3, 4, 6 or 8 hexadecimal digits, `#` optional.
    ///
    /// The three-digit form is expanded by replicating digits (`#f00` is
    /// `#ff0000`), matching CSS hex notation.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self { r, g, b, a: 255 })
            }
            4 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                let a = u8::from_str_radix(&hex[3..4].repeat(2), 16).ok()?;
                Some(Self { r, g, b, a })
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self { r, g, b, a: 255 })
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self { r, g, b, a })
            }
            _ => None,
        }
    }

    /// Look up one of the basic named colors.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let rgba = match name.to_ascii_lowercase().as_str() {
            "white" => (255, 255, 255, 255),
            "black" => (0, 0, 0, 255),
            "red" => (255, 0, 0, 255),
            "green" => (0, 128, 0, 255),
            "blue" => (0, 0, 255, 255),
            "yellow" => (255, 255, 0, 255),
            "gray" | "grey" => (128, 128, 128, 255),
            "transparent" => (0, 0, 0, 0),
            "aqua" | "cyan" => (0, 255, 255, 255),
            "fuchsia" | "magenta" => (255, 0, 255, 255),
            "lime" => (0, 255, 0, 255),
            "maroon" => (128, 0, 0, 255),
            "navy" => (0, 0, 128, 255),
            "olive" => (128, 128, 0, 255),
            "purple" => (128, 0, 128, 255),
            "silver" => (192, 192, 192, 255),
            "teal" => (0, 128, 128, 255),
            _ => return None,
        };
        let (r, g, b, a) = rgba;
        Some(Self { r, g, b, a })
    }

    /// Parse either notation: hex first, then the named color table.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::from_hex(text).or_else(|| Self::from_named(text))
    }

    /// Convert to hex string notation (#RRGGBB, or #RRGGBBAA if alpha != 255).
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for ColorValue {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<ColorValue> for String {
    fn from(color: ColorValue) -> Self {
        color.to_hex_string()
    }
}
