use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::paint::{Align, Font, VAlign};

/// Draw **CMS** *Preliminary* on the left and `2.6 fb⁻¹ (13 TeV)` on the
/// right, just above `area`. `status` overrides the configured status text.
pub fn draw_experiment_header(canvas: &mut Canvas, area: &PlotArea, config: &VizConfig, status: Option<&str>) {
    let e = &config.experiment;
    let y = area.top - 6.0;

    if !e.name.is_empty() {
        let size = config.font.label_size * 1.3;
        let name_font = Font::new(size).bold();
        canvas.text(area.left, y, &e.name, &name_font);

        let status = status.unwrap_or(&e.status);
        if !status.is_empty() {
            let x = area.left + canvas.measure_text(&e.name, &name_font).width + 5.0;
            canvas.text(x, y, status, &Font::new(size * 0.85).italic());
        }
    }

    let info = run_info(e.lumi_fb_inv, e.sqrt_s_tev);
    if !info.is_empty() {
        let font = Font::new(config.font.size).aligned(Align::Right, VAlign::Baseline);
        canvas.text(area.right(), y, &info, &font);
    }
}

fn run_info(lumi_fb_inv: f64, sqrt_s_tev: f64) -> String {
    let lumi = (lumi_fb_inv > 0.0).then(|| format!("{lumi_fb_inv} fb\u{207B}\u{00B9}"));
    let energy = (sqrt_s_tev > 0.0).then(|| format!("({sqrt_s_tev} TeV)"));
    lumi.into_iter().chain(energy).collect::<Vec<_>>().join(" ")
}

/// Space [`draw_experiment_header`] needs above the plot area.
pub fn header_height(config: &VizConfig) -> f64 {
    let e = &config.experiment;
    if e.name.is_empty() && e.lumi_fb_inv <= 0.0 && e.sqrt_s_tev <= 0.0 {
        12.0
    } else {
        config.font.label_size * 1.3 + 20.0
    }
}
