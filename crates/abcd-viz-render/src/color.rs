use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// sRGB colour with opacity. Serialized as `#rrggbb`; opacity is a
/// rendering-time property and is not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const fn grey(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// SVG paint value; `rgba(...)` when translucent.
    pub fn svg(&self) -> String {
        if self.alpha >= 1.0 {
            self.to_string()
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.alpha)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    /// `#rrggbb`, with or without the `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(|| format!("invalid colour '{s}', expected #rrggbb"))
        };
        if hex.len() != 6 {
            return Err(format!("invalid colour '{s}', expected #rrggbb"));
        }
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Colour cycle for simulated series without an explicit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Petroff six-colour scheme adopted by CMS.
    #[default]
    CmsPetroff6,
    Tableau10,
}

impl Palette {
    pub fn colors(self) -> Vec<Color> {
        let codes: &[u32] = match self {
            Palette::CmsPetroff6 => &[0x5790fc, 0xf89c20, 0xe42536, 0x964a8b, 0x9c9ca1, 0x7a21dd],
            Palette::Tableau10 => &[
                0x4e79a7, 0xf28e2b, 0xe15759, 0x76b7b2, 0x59a14f, 0xedc948, 0xb07aa1, 0xff9da7, 0x9c755f,
                0xbab0ab,
            ],
        };
        codes.iter().map(|&c| Color::rgb((c >> 16) as u8, (c >> 8) as u8, c as u8)).collect()
    }

    /// `i`-th colour, wrapping around.
    pub fn nth(self, i: usize) -> Color {
        let colors = self.colors();
        colors[i % colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        let c: Color = "#1D4ED8".parse().unwrap();
        assert_eq!((c.r, c.g, c.b), (0x1d, 0x4e, 0xd8));
        assert_eq!(c.to_string(), "#1d4ed8");
        assert_eq!("00ff00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["#12", "zzzzzz", "red", "#12345g"] {
            assert!(bad.parse::<Color>().is_err(), "{bad}");
        }
    }

    #[test]
    fn translucent_svg_paint() {
        assert_eq!(Color::rgb(29, 78, 216).with_alpha(0.5).svg(), "rgba(29,78,216,0.500)");
        assert_eq!(Color::WHITE.svg(), "#ffffff");
    }

    #[test]
    fn palettes_wrap() {
        assert_eq!(Palette::CmsPetroff6.colors().len(), 6);
        assert_eq!(Palette::Tableau10.nth(10), Palette::Tableau10.nth(0));
        assert_eq!(Palette::CmsPetroff6.nth(0).to_string(), "#5790fc");
    }
}
