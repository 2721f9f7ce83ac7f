use abcd_viz::pulls::PullsArtifact;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::header::{draw_experiment_header, header_height};
use crate::layout::axes::Axis;
use crate::layout::margins::{PlotArea, left_margin};
use crate::paint::{Align, Font, Paint, Stroke, VAlign};
use crate::plots::axes_draw::{XLabels, draw_axes, edges_to_pixels, hline};
use crate::plots::empty_svg;

/// Points of the Gaussian overlay.
const CURVE_STEPS: usize = 120;

/// Pulls per bin on top, their distribution with the Gaussian summary below.
pub fn render(artifact: &PullsArtifact, config: &VizConfig) -> crate::Result<String> {
    let n = artifact.pulls.len();
    if n == 0 {
        return Ok(empty_svg("No pulls"));
    }
    let n_dist = artifact.distribution_counts.len();
    if artifact.bin_edges.len() != n + 1 || artifact.distribution_edges.len() != n_dist + 1 {
        return Err(crate::RenderError::Layout("pulls artifact arrays are inconsistent".into()));
    }

    let (fig_w, fig_h) = (config.figure.width, config.figure.height);
    let mut canvas = Canvas::new(fig_w, fig_h)?;

    let x_axis = Axis::linear(artifact.bin_edges[0], artifact.bin_edges[n], 7).titled(&artifact.x_label);
    let pull_max = artifact.pulls.iter().fold(3.0_f64, |m, p| m.max(p.abs())).ceil();
    let pull_axis = Axis::linear(-pull_max, pull_max, 5).titled("Pull");

    let (d_lo, d_hi) = (artifact.distribution_edges[0], artifact.distribution_edges[n_dist]);
    let g = artifact.gaussian;
    let count_max = artifact.distribution_counts.iter().copied().fold(g.amplitude, f64::max).max(1.0);
    let dist_x = Axis::linear(d_lo, d_hi, 7).titled("Pull");
    let dist_y = Axis::linear_to_round(0.0, count_max * 1.25, 5).titled("Bins");

    let left = left_margin(&canvas, &pull_axis, config).max(left_margin(&canvas, &dist_y, config));
    let top = header_height(config);
    let bottom = config.font.tick_size + config.font.label_size + 26.0;
    let gap = config.font.tick_size + config.font.label_size + 30.0;
    let (upper, lower) = PlotArea::manual(left, top, fig_w - left - 20.0, fig_h - top - bottom).split(gap, 0.45);

    draw_experiment_header(&mut canvas, &upper, config, None);

    // Pulls per bin as bars from zero.
    draw_axes(&mut canvas, &upper, &x_axis, &pull_axis, XLabels::Shown, config);
    canvas.clip_to(&upper);
    for level in [-2.0, -1.0, 1.0, 2.0] {
        hline(&mut canvas, &upper, &pull_axis, level, &Stroke::dashed(Color::grey(150), 0.6));
    }
    hline(&mut canvas, &upper, &pull_axis, 0.0, &Stroke::solid(Color::BLACK, 0.8));

    let px_edges = edges_to_pixels(&artifact.bin_edges, &x_axis, &upper);
    let zero = upper.y(&pull_axis, 0.0);
    for (i, &p) in artifact.pulls.iter().enumerate().filter(|(_, p)| **p != 0.0) {
        let py = upper.y(&pull_axis, p);
        let color = if p > 0.0 { config.colors.positive_pull } else { config.colors.negative_pull };
        let paint = Paint::fill(color.with_alpha(0.8));
        canvas.rect(px_edges[i], py.min(zero), px_edges[i + 1] - px_edges[i], (py - zero).abs(), &paint);
    }
    canvas.unclip();

    // Distribution.
    draw_axes(&mut canvas, &lower, &dist_x, &dist_y, XLabels::Shown, config);
    canvas.clip_to(&lower);
    let d_edges = edges_to_pixels(&artifact.distribution_edges, &dist_x, &lower);
    let heights: Vec<f64> = artifact.distribution_counts.iter().map(|&c| lower.y(&dist_y, c)).collect();
    let fill = Paint::fill(config.colors.predicted.with_alpha(0.25));
    for (i, &h) in heights.iter().enumerate() {
        canvas.rect(d_edges[i], h, d_edges[i + 1] - d_edges[i], lower.bottom() - h, &fill);
    }
    canvas.step(&d_edges, &heights, &Stroke::solid(config.colors.predicted, 1.2));

    if g.sigma > 0.0 {
        let curve: Vec<(f64, f64)> = (0..=CURVE_STEPS)
            .map(|k| d_lo + (d_hi - d_lo) * k as f64 / CURVE_STEPS as f64)
            .map(|x| (lower.x(&dist_x, x), lower.y(&dist_y, g.eval(x))))
            .collect();
        canvas.polyline(&curve, &Stroke::solid(config.colors.data_fit, 1.5));
    }
    canvas.unclip();

    let font = Font::new(config.font.size).aligned(Align::Right, VAlign::Baseline);
    let summary = format!("\u{03BC} = {:.2}, \u{03C3} = {:.2}", g.mean, g.sigma);
    canvas.text(lower.right() - 8.0, lower.top + config.font.size + 6.0, &summary, &font);

    Ok(canvas.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcd_core::Histogram;
    use abcd_viz::pulls_artifact;

    #[test]
    fn renders_bars_and_gaussian() {
        let edges = Histogram::uniform_edges(6, 50.0, 350.0);
        let obs = Histogram::from_counts("o", edges.clone(), vec![100.0, 81.0, 64.0, 49.0, 36.0, 25.0]).unwrap();
        let pred = Histogram::from_counts("p", edges, vec![90.0, 90.0, 64.0, 42.0, 39.0, 25.0]).unwrap();
        let art = pulls_artifact("massAve", "Pulls_Bkg", &obs, &pred).unwrap();

        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains("\u{03BC} = "));
        assert!(svg.contains("Pull"));
        // step outline plus the Gaussian
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn empty_pulls_render_placeholder() {
        let edges = vec![0.0, 1.0];
        let h = Histogram::from_counts("h", edges, vec![1.0]).unwrap();
        let mut art = pulls_artifact("m", "Pulls", &h, &h).unwrap();
        art.pulls.clear();
        art.bin_edges.clear();
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains("No pulls"));
    }
}
