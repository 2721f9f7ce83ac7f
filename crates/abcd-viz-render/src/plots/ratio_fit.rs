use abcd_core::SampleKind;
use abcd_viz::ratio_fit::{FitCurveSeries, RatioFitArtifact};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, Swatch};
use crate::layout::margins::PlotArea;
use crate::paint::{Font, Marker, Paint, Stroke};
use crate::plots::axes_draw::{XLabels, draw_axes};
use crate::plots::empty_svg;

/// Render C/D ratio points with the fitted polynomials and their bands.
pub fn render(artifact: &RatioFitArtifact, config: &VizConfig) -> crate::Result<String> {
    if artifact.points.is_empty() && artifact.curves.is_empty() {
        return Ok(empty_svg("No ratio data"));
    }
    for p in &artifact.points {
        if p.bin_edges.len() != p.y.len() + 1 || p.yerr.len() != p.y.len() {
            return Err(crate::RenderError::Layout(format!("ratio series '{}' is malformed", p.label)));
        }
    }

    let mut canvas = Canvas::new(config.figure.width, config.figure.height * 0.75)?;

    let [x_lo, x_hi] = artifact.x_range;
    let [y_lo, y_hi] = config.ratio_fit.y_range.unwrap_or_else(|| auto_y_range(artifact));
    let x_axis = Axis::linear(x_lo, x_hi, 7).titled(&artifact.x_label);
    let y_axis = Axis::linear(y_lo, y_hi, 6).titled(&artifact.y_label);

    let area = PlotArea::auto(&canvas, &y_axis, &x_axis, config);
    draw_experiment_header(&mut canvas, &area, config, None);
    draw_axes(&mut canvas, &area, &x_axis, &y_axis, XLabels::Shown, config);
    let to_px = |x: f64, y: f64| (area.x(&x_axis, x), area.y(&y_axis, y));

    canvas.clip_to(&area);
    let mut entries = Vec::new();

    // Bands first so curves and points stay visible.
    for curve in &artifact.curves {
        let (Some(lo), Some(hi)) = (&curve.band_lo, &curve.band_hi) else { continue };
        let color = curve_color(curve, config);
        let xs: Vec<f64> = curve.x.iter().map(|&x| area.x(&x_axis, x)).collect();
        let lo_px: Vec<f64> = lo.iter().map(|&v| area.y(&y_axis, v)).collect();
        let hi_px: Vec<f64> = hi.iter().map(|&v| area.y(&y_axis, v)).collect();
        canvas.band(&xs, &lo_px, &hi_px, &Paint::fill(color.with_alpha(0.2)));
        for side in [&lo_px, &hi_px] {
            let pts: Vec<(f64, f64)> = xs.iter().copied().zip(side.iter().copied()).collect();
            canvas.polyline(&pts, &Stroke::dashed(color, 0.8));
        }
    }

    for (si, series) in artifact.points.iter().enumerate() {
        let fallback = match series.kind {
            SampleKind::Data => config.colors.observed,
            SampleKind::Simulated => config.palette.nth(si),
        };
        let color = config.color_for(&series.label, fallback);
        let marker = Marker::for_kind(series.kind, color, 2.5);
        let bar = Stroke::solid(color, 0.8);

        for (i, (&y, &e)) in series.y.iter().zip(&series.yerr).enumerate() {
            if y == 0.0 && e == 0.0 {
                continue;
            }
            let (lo, hi) = (series.bin_edges[i], series.bin_edges[i + 1]);
            let (px, py) = to_px(0.5 * (lo + hi), y);
            canvas.line(area.x(&x_axis, lo), py, area.x(&x_axis, hi), py, &bar);
            canvas.error_bar(px, area.y(&y_axis, y - e), area.y(&y_axis, y + e), &bar);
            canvas.marker(px, py, &marker);
        }
        entries.push(LegendEntry::new(series.label.clone(), Swatch::Point(marker)));
    }

    for curve in &artifact.curves {
        let color = curve_color(curve, config);
        let width = if curve.kind == SampleKind::Data { 2.0 } else { 1.5 };
        let pts: Vec<(f64, f64)> = curve.x.iter().zip(&curve.y).map(|(&x, &y)| to_px(x, y)).collect();
        let stroke = Stroke::solid(color, width);
        canvas.polyline(&pts, &stroke);
        entries.push(LegendEntry::new(curve.label.clone(), Swatch::Line(stroke)));
        if curve.band_lo.is_some() {
            entries.push(LegendEntry::new(format!("{} (68% CL)", curve.label), Swatch::Band(color.with_alpha(0.2))));
        }
    }
    canvas.unclip();

    // Fit quality per curve, bottom left.
    let step = config.font.size + 2.0;
    for (i, curve) in artifact.curves.iter().rev().enumerate() {
        let text = format!("{}: \u{03C7}\u{00B2}/ndf = {:.2}/{}", curve.label, curve.chi2, curve.ndf);
        let font = Font::new(config.font.size * 0.9).colored(curve_color(curve, config));
        canvas.text(area.left + 8.0, area.bottom() - 8.0 - i as f64 * step, &text, &font);
    }

    legend::draw_legend(&mut canvas, &area, &entries, config.font.size);

    Ok(canvas.finish())
}

fn curve_color(curve: &FitCurveSeries, config: &VizConfig) -> Color {
    let fallback = match curve.kind {
        SampleKind::Data => config.colors.data_fit,
        SampleKind::Simulated => config.colors.background_fit,
    };
    config.color_for(&curve.label, fallback)
}

/// Range of the points inside the x range, padded by 30 % of the span.
fn auto_y_range(artifact: &RatioFitArtifact) -> [f64; 2] {
    let [x_lo, x_hi] = artifact.x_range;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in &artifact.points {
        for (i, (&y, &e)) in p.y.iter().zip(&p.yerr).enumerate() {
            let c = 0.5 * (p.bin_edges[i] + p.bin_edges[i + 1]);
            if c < x_lo || c > x_hi || (y == 0.0 && e == 0.0) {
                continue;
            }
            lo = lo.min(y - e);
            hi = hi.max(y + e);
        }
    }
    for c in &artifact.curves {
        for &y in &c.y {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return [0.0, 1.0];
    }
    let pad = 0.3 * (hi - lo).max(1e-3);
    [(lo - pad).max(0.0), hi + pad]
}
