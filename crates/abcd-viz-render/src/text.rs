//! Text extents without font files.
//!
//! Widths come from per-class advance factors close to a humanist sans-serif
//! (the `sans-serif` family the SVG requests), so layout is stable across
//! machines. Extents are approximate by a few percent.

use crate::paint::Font;

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

const ASCENT: f64 = 0.93;
const DESCENT: f64 = 0.24;
const BOLD_WIDEN: f64 = 1.06;

/// Advance of one character in ems.
fn advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.26,
        ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '/' | '-' => 0.33,
        'm' | 'w' | 'M' | 'W' => 0.86,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        '\u{00B2}' | '\u{00B3}' | '\u{00B9}' | '\u{2070}'..='\u{207F}' => 0.36,
        _ => 0.54,
    }
}

/// Extent of `text` set in `font`, in points.
pub fn measure(text: &str, font: &Font) -> TextMetrics {
    let ems: f64 = text.chars().map(advance).sum();
    let widen = if font.bold { BOLD_WIDEN } else { 1.0 };
    TextMetrics {
        width: ems * font.size * widen,
        height: (ASCENT + DESCENT) * font.size,
        ascent: ASCENT * font.size,
    }
}
