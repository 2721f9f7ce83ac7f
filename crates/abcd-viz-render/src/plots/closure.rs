use abcd_core::SampleKind;
use abcd_viz::closure::{ClosureArtifact, HistogramSeries};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::header::{draw_experiment_header, header_height};
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, Swatch};
use crate::layout::margins::{PlotArea, left_margin};
use crate::paint::{Font, Marker, Paint, Stroke};
use crate::plots::axes_draw::{XLabels, draw_axes, edges_to_pixels, hline};
use crate::plots::empty_svg;

/// Render an observed vs predicted comparison with its ratio panel.
pub fn render(artifact: &ClosureArtifact, config: &VizConfig) -> crate::Result<String> {
    let n_bins = artifact.observed.y.len();
    if n_bins == 0 {
        return Ok(empty_svg("No bins"));
    }
    check_lengths(artifact)?;

    let (fig_w, fig_h) = (config.figure.width, config.figure.height);
    let mut canvas = Canvas::new(fig_w, fig_h)?;

    let [x_lo, x_hi] = artifact.x_range;
    let [y_lo, y_hi] = artifact.y_range;
    let [r_lo, r_hi] = config.closure.ratio_y_range;
    let x_axis = Axis::linear(x_lo, x_hi, 7).titled(&artifact.x_label);
    let y_axis = if artifact.log_y { Axis::log(y_lo, y_hi) } else { Axis::linear(y_lo, y_hi, 6) }
        .titled(&artifact.y_label);
    let ratio_axis = Axis::linear(r_lo, r_hi, 3).titled(&artifact.ratio_label);

    let left = left_margin(&canvas, &y_axis, config).max(left_margin(&canvas, &ratio_axis, config));
    let top = header_height(config);
    let bottom = config.font.tick_size + config.font.label_size + 26.0;
    let (main, ratio) =
        PlotArea::manual(left, top, fig_w - left - 20.0, fig_h - top - bottom).split(6.0, 0.28);

    draw_experiment_header(&mut canvas, &main, config, Some(&artifact.status));

    // Main panel: band, prediction, observation.
    draw_axes(&mut canvas, &main, &x_axis, &y_axis, XLabels::Hidden, config);
    canvas.clip_to(&main);

    let px_edges = edges_to_pixels(&artifact.bin_edges, &x_axis, &main);
    let y_px = |v: f64| main.y(&y_axis, v);

    let band_color = config.colors.band.with_alpha(0.45);
    if let Some(band) = &artifact.predicted_band {
        for (i, (&lo, &hi)) in band.lo.iter().zip(&band.hi).enumerate() {
            let (top_px, bottom_px) = (y_px(hi), y_px(lo));
            let width = px_edges[i + 1] - px_edges[i];
            canvas.rect(px_edges[i], top_px, width, bottom_px - top_px, &Paint::fill(band_color));
        }
    }

    let predicted_color = config.color_for(&artifact.predicted.label, config.colors.predicted);
    let observed_color = config.color_for(&artifact.observed.label, config.colors.observed);
    let observed_points = artifact.observed.kind == SampleKind::Data;
    draw_series(&mut canvas, &artifact.predicted, false, &px_edges, &y_px, predicted_color);
    draw_series(&mut canvas, &artifact.observed, observed_points, &px_edges, &y_px, observed_color);
    canvas.unclip();

    let info = Font::new(config.font.size);
    let mut lines = Vec::new();
    if config.closure.show_chi2 {
        lines.push(format!("\u{03C7}\u{00B2}/ndf = {:.2}/{}", artifact.chi2, artifact.ndf));
    }
    lines.push(format!(
        "Events {} = {:.1}/{:.1}",
        artifact.ratio_label, artifact.observed_integral, artifact.predicted_integral
    ));
    for (i, line) in lines.iter().enumerate() {
        let y = main.top + config.font.size + 8.0 + i as f64 * (config.font.size + 4.0);
        canvas.text(main.left + 10.0, y, line, &info);
    }

    let mut entries = vec![
        legend_entry(&artifact.observed, observed_points, observed_color),
        legend_entry(&artifact.predicted, false, predicted_color),
    ];
    if artifact.predicted_band.is_some() {
        entries.push(LegendEntry::new("Syst. unc.", Swatch::Band(band_color)));
    }
    legend::draw_legend(&mut canvas, &main, &entries, config.font.size);

    // Ratio panel.
    draw_axes(&mut canvas, &ratio, &x_axis, &ratio_axis, XLabels::Shown, config);
    canvas.clip_to(&ratio);

    hline(&mut canvas, &ratio, &ratio_axis, 1.0, &Stroke::solid(config.colors.unity_line, 1.0));
    let tol = config.closure.tolerance;
    if tol > 0.0 {
        let dashed = Stroke::dashed(config.colors.tolerance_line, 0.8);
        hline(&mut canvas, &ratio, &ratio_axis, 1.0 - tol, &dashed);
        hline(&mut canvas, &ratio, &ratio_axis, 1.0 + tol, &dashed);
    }

    let marker = Marker::dot(Color::BLACK, 2.0);
    let bar = Stroke::solid(Color::BLACK, 0.8);
    for i in 0..n_bins {
        let (r, lo, hi) = (artifact.ratio_y[i], artifact.ratio_yerr_lo[i], artifact.ratio_yerr_hi[i]);
        if r == 0.0 && hi == 0.0 {
            continue;
        }
        let px = 0.5 * (px_edges[i] + px_edges[i + 1]);
        canvas.error_bar(px, ratio.y(&ratio_axis, r - lo), ratio.y(&ratio_axis, r + hi), &bar);
        canvas.marker(px, ratio.y(&ratio_axis, r), &marker);
    }
    canvas.unclip();

    Ok(canvas.finish())
}

fn check_lengths(artifact: &ClosureArtifact) -> crate::Result<()> {
    let n = artifact.observed.y.len();
    let ok = artifact.bin_edges.len() == n + 1
        && [
            artifact.observed.yerr.len(),
            artifact.predicted.y.len(),
            artifact.predicted.yerr.len(),
            artifact.ratio_y.len(),
            artifact.ratio_yerr_lo.len(),
            artifact.ratio_yerr_hi.len(),
        ]
        .iter()
        .all(|&len| len == n)
        && artifact.predicted_band.as_ref().is_none_or(|b| b.lo.len() == n && b.hi.len() == n);
    if ok {
        Ok(())
    } else {
        Err(crate::RenderError::Layout(format!(
            "closure artifact arrays do not match {} bins",
            n
        )))
    }
}

/// Observed data as points with error bars, everything else as a histogram outline.
fn draw_series(
    canvas: &mut Canvas,
    series: &HistogramSeries,
    as_points: bool,
    px_edges: &[f64],
    y_px: &impl Fn(f64) -> f64,
    color: Color,
) {
    if !as_points {
        let heights: Vec<f64> = series.y.iter().map(|&y| y_px(y)).collect();
        canvas.step(px_edges, &heights, &Stroke::solid(color, 1.5));
        return;
    }
    let marker = Marker::dot(color, 2.5);
    let bar = Stroke::solid(color, 1.0);
    for (i, (&y, &e)) in series.y.iter().zip(&series.yerr).enumerate() {
        if y <= 0.0 {
            continue;
        }
        let px = 0.5 * (px_edges[i] + px_edges[i + 1]);
        canvas.error_bar(px, y_px(y - e), y_px(y + e), &bar);
        canvas.marker(px, y_px(y), &marker);
    }
}

fn legend_entry(series: &HistogramSeries, as_points: bool, color: Color) -> LegendEntry {
    let swatch =
        if as_points { Swatch::Point(Marker::dot(color, 2.5)) } else { Swatch::Line(Stroke::solid(color, 1.5)) };
    LegendEntry::new(series.label.clone(), swatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcd_core::{Histogram, SampleHistogram};
    use abcd_viz::{ClosureOptions, closure_artifact};

    fn artifact(kind_observed: SampleKind) -> ClosureArtifact {
        let edges = Histogram::uniform_edges(6, 50.0, 350.0);
        let obs = Histogram::from_counts("o", edges.clone(), vec![900.0, 400.0, 150.0, 60.0, 20.0, 5.0]).unwrap();
        let pred = Histogram::from_counts("p", edges, vec![880.0, 420.0, 140.0, 65.0, 18.0, 6.0]).unwrap();
        let observed = SampleHistogram { kind: kind_observed, label: "Data".into(), histogram: obs };
        let predicted = SampleHistogram::simulated("ABCD Pred", pred);
        let mut options = ClosureOptions::new("massAve", "Log_altBCD", "DATA/ABCD Pred");
        options.systematic = Some(1.1);
        closure_artifact(&observed, &predicted, &options).unwrap()
    }

    #[test]
    fn renders_points_and_outline() {
        let svg = render(&artifact(SampleKind::Data), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("DATA/ABCD Pred"));
        assert!(svg.contains("Preliminary"));
        assert!(svg.contains("Syst. unc."));
    }

    #[test]
    fn simulated_observation_is_an_outline() {
        let svg = render(&artifact(SampleKind::Simulated), &VizConfig::default()).unwrap();
        assert!(svg.contains("Simulation Preliminary"));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let mut art = artifact(SampleKind::Data);
        art.ratio_y.pop();
        assert!(matches!(render(&art, &VizConfig::default()), Err(crate::RenderError::Layout(_))));
    }
}
