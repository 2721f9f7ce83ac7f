use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::{TickDirection, VizConfig};
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::paint::{Align, Font, Paint, Stroke, VAlign};

/// Whether a panel prints its x tick labels and title. The main panel
/// above a ratio panel does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XLabels {
    Shown,
    Hidden,
}

/// Frame, ticks, tick labels and axis titles of one panel.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    x_labels: XLabels,
    config: &VizConfig,
) {
    let frame = Stroke::solid(Color::BLACK, 0.8);
    canvas.rect(area.left, area.top, area.width, area.height, &Paint::default().outlined(frame));

    let axes = &config.axes;
    // Tick offsets point into the frame for inward ticks.
    let out = match axes.ticks {
        TickDirection::In => -1.0,
        TickDirection::Out => 1.0,
    };
    let major_len = out * axes.tick_length;
    let minor_len = out * axes.minor_tick_length;
    let outside = if axes.ticks == TickDirection::Out { axes.tick_length } else { 0.0 };
    let major = Stroke::solid(Color::BLACK, 0.6);
    let minor = Stroke::solid(Color::BLACK, 0.4);

    let on_x = |v: f64| {
        let px = area.x(x_axis, v);
        (px >= area.left - 0.5 && px <= area.right() + 0.5).then_some(px)
    };
    let on_y = |v: f64| {
        let py = area.y(y_axis, v);
        (py >= area.top - 0.5 && py <= area.bottom() + 0.5).then_some(py)
    };

    let x_font = Font::new(config.font.tick_size).aligned(Align::Center, VAlign::Top);
    for tick in &x_axis.major {
        let Some(px) = on_x(tick.value) else { continue };
        canvas.line(px, area.bottom(), px, area.bottom() + major_len, &major);
        if axes.mirror_ticks {
            canvas.line(px, area.top, px, area.top - major_len, &major);
        }
        if x_labels == XLabels::Shown {
            canvas.text(px, area.bottom() + outside + 3.0, &tick.label, &x_font);
        }
    }
    for px in x_axis.minor.iter().filter_map(|&v| on_x(v)) {
        canvas.line(px, area.bottom(), px, area.bottom() + minor_len, &minor);
    }

    let y_font = Font::new(config.font.tick_size).aligned(Align::Right, VAlign::Middle);
    for tick in &y_axis.major {
        let Some(py) = on_y(tick.value) else { continue };
        canvas.line(area.left, py, area.left - major_len, py, &major);
        if axes.mirror_ticks {
            canvas.line(area.right(), py, area.right() + major_len, py, &major);
        }
        canvas.text(area.left - outside - 4.0, py, &tick.label, &y_font);
    }
    for py in y_axis.minor.iter().filter_map(|&v| on_y(v)) {
        canvas.line(area.left, py, area.left - minor_len, py, &minor);
    }

    // Titles sit flush with the top right corner, as in ROOT.
    let title_font = Font::new(config.font.label_size).aligned(Align::Right, VAlign::Baseline);
    if x_labels == XLabels::Shown && !x_axis.title.is_empty() {
        let y = area.bottom() + outside + config.font.tick_size + 16.0;
        canvas.text(area.right(), y, &x_axis.title, &title_font);
    }
    if !y_axis.title.is_empty() {
        let widest = y_axis.major.iter().map(|t| canvas.measure_text(&t.label, &y_font).width).fold(0.0, f64::max);
        let x = area.left - outside - widest - 12.0;
        canvas.text_rotated(x, area.top, &y_axis.title, &title_font, -90.0);
    }
}

/// Horizontal reference line at data value `y`, skipped outside the panel.
pub fn hline(canvas: &mut Canvas, area: &PlotArea, y_axis: &Axis, y: f64, stroke: &Stroke) {
    let py = area.y(y_axis, y);
    if py >= area.top && py <= area.bottom() {
        canvas.line(area.left, py, area.right(), py, stroke);
    }
}

/// Pixel x of every bin edge.
pub fn edges_to_pixels(edges: &[f64], x_axis: &Axis, area: &PlotArea) -> Vec<f64> {
    edges.iter().map(|&e| area.x(x_axis, e)).collect()
}
