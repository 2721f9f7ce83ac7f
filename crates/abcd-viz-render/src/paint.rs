//! How things look on the canvas: strokes, fills, fonts and point markers.

use abcd_core::SampleKind;

use crate::color::Color;

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl Dash {
    /// SVG `stroke-dasharray`, `None` for solid lines.
    pub fn pattern(self) -> Option<&'static str> {
        match self {
            Dash::Solid => None,
            Dash::Dashed => Some("6 3"),
            Dash::Dotted => Some("1.5 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub dash: Dash,
}

impl Stroke {
    pub const fn solid(color: Color, width: f64) -> Self {
        Self { color, width, dash: Dash::Solid }
    }

    pub const fn dashed(color: Color, width: f64) -> Self {
        Self { color, width, dash: Dash::Dashed }
    }
}

/// Area paint: optional fill plus optional outline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    pub outline: Option<Stroke>,
}

impl Paint {
    pub const fn fill(color: Color) -> Self {
        Self { fill: Some(color), outline: None }
    }

    pub const fn outlined(mut self, stroke: Stroke) -> Self {
        self.outline = Some(stroke);
        self
    }
}

/// Horizontal alignment of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Baseline,
    Middle,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size: f64,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    pub valign: VAlign,
}

impl Font {
    /// Black, regular, left-aligned on the baseline.
    pub const fn new(size: f64) -> Self {
        Self {
            size,
            color: Color::BLACK,
            bold: false,
            italic: false,
            align: Align::Left,
            valign: VAlign::Baseline,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub const fn colored(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub const fn aligned(mut self, align: Align, valign: VAlign) -> Self {
        self.align = align;
        self.valign = valign;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Dot,
    Square,
}

/// Point marker. `radius` is the half-size for squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub glyph: Glyph,
    pub radius: f64,
    pub color: Color,
    pub hollow: bool,
}

impl Marker {
    pub const fn dot(color: Color, radius: f64) -> Self {
        Self { glyph: Glyph::Dot, radius, color, hollow: false }
    }

    /// Filled dots for data, open squares for simulation.
    pub const fn for_kind(kind: SampleKind, color: Color, radius: f64) -> Self {
        match kind {
            SampleKind::Data => Self::dot(color, radius),
            SampleKind::Simulated => Self { glyph: Glyph::Square, radius, color, hollow: true },
        }
    }

    /// Paint of the marker body.
    pub fn paint(&self) -> Paint {
        if self.hollow {
            Paint::fill(Color::WHITE).outlined(Stroke::solid(self.color, 1.0))
        } else {
            Paint::fill(self.color).outlined(Stroke::solid(self.color, 0.5))
        }
    }
}
