//! Legend box in the upper right corner of a panel.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::paint::{Align, Font, Marker, Paint, Stroke, VAlign};

/// What is drawn left of a legend label.
#[derive(Debug, Clone, Copy)]
pub enum Swatch {
    /// Filled box, for bands and shaded areas.
    Band(Color),
    Line(Stroke),
    /// Marker with a vertical error bar.
    Point(Marker),
}

#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: Swatch,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, swatch: Swatch) -> Self {
        Self { label: label.into(), swatch }
    }
}

const SWATCH_W: f64 = 16.0;
const PAD: f64 = 6.0;

pub fn draw_legend(canvas: &mut Canvas, area: &PlotArea, entries: &[LegendEntry], font_size: f64) {
    if entries.is_empty() {
        return;
    }
    let font = Font::new(font_size * 0.9).aligned(Align::Left, VAlign::Middle);
    let row = font_size + 4.0;
    let swatch_h = font_size - 2.0;

    let text_w = entries.iter().map(|e| canvas.measure_text(&e.label, &font).width).fold(0.0, f64::max);
    let w = 2.0 * PAD + SWATCH_W + PAD + text_w;
    let h = 2.0 * PAD + entries.len() as f64 * row;
    let (x0, y0) = (area.right() - w - 5.0, area.top + 5.0);
    canvas.rect(x0, y0, w, h, &Paint::fill(Color::WHITE.with_alpha(0.9)));

    for (i, entry) in entries.iter().enumerate() {
        let cy = y0 + PAD + (i as f64 + 0.5) * row;
        let sx = x0 + PAD;
        let mid = sx + SWATCH_W / 2.0;
        match entry.swatch {
            Swatch::Band(color) => canvas.rect(sx, cy - swatch_h / 2.0, SWATCH_W, swatch_h, &Paint::fill(color)),
            Swatch::Line(stroke) => canvas.line(sx, cy, sx + SWATCH_W, cy, &stroke),
            Swatch::Point(marker) => {
                canvas.error_bar(mid, cy - swatch_h / 2.0, cy + swatch_h / 2.0, &Stroke::solid(marker.color, 0.8));
                canvas.marker(mid, cy, &marker);
            }
        }
        canvas.text(sx + SWATCH_W + PAD, cy, &entry.label, &font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_entry() {
        let mut canvas = Canvas::new(300.0, 200.0).unwrap();
        let area = PlotArea::manual(20.0, 20.0, 260.0, 160.0);
        let entries = [
            LegendEntry::new("DATA", Swatch::Point(Marker::dot(Color::BLACK, 2.5))),
            LegendEntry::new("ABCD Pred.", Swatch::Line(Stroke::solid(Color::rgb(0, 0, 200), 1.5))),
            LegendEntry::new("Syst. unc.", Swatch::Band(Color::grey(150))),
        ];
        draw_legend(&mut canvas, &area, &entries, 10.0);
        let svg = canvas.finish();
        for label in ["DATA", "ABCD Pred.", "Syst. unc."] {
            assert!(svg.contains(&format!(">{label}</text>")), "{label}");
        }
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn empty_legend_draws_nothing() {
        let mut canvas = Canvas::new(300.0, 200.0).unwrap();
        draw_legend(&mut canvas, &PlotArea::manual(0.0, 0.0, 300.0, 200.0), &[], 10.0);
        assert!(!canvas.finish().contains("<text"));
    }
}
