use abcd_core::{Histogram, Rebin, SampleHistogram};
use abcd_fit::{ControlRegions, RatioFitConfig, estimate_combined};
use abcd_viz::{ClosureOptions, closure_artifact, combined_inputs, pulls_artifact, ratio_fit_artifact};
use abcd_viz_render::config::resolve_config;
use abcd_viz_render::{RenderError, render_svg, render_to_bytes, render_to_file};

fn uniform(name: &str, contents: Vec<f64>) -> Histogram {
    let edges = Histogram::uniform_edges(contents.len(), 50.0, 350.0);
    Histogram::from_counts(name, edges, contents).unwrap()
}

fn closure_json() -> String {
    let obs = SampleHistogram::data("Data", uniform("o", vec![500.0, 200.0, 90.0, 30.0]));
    let pred = SampleHistogram::simulated("ABCD Pred", uniform("p", vec![480.0, 210.0, 85.0, 33.0]));
    let art = closure_artifact(&obs, &pred, &ClosureOptions::new("massAve", "Log_altBCD", "DATA/ABCD Pred"))
        .unwrap();
    serde_json::to_string(&art).unwrap()
}

#[test]
fn every_kind_renders_from_json() {
    let config = resolve_config("cms", None).unwrap();

    let b = uniform("B", (0..30).map(|i| 300.0 - 5.0 * i as f64).collect());
    let c = uniform("C", (0..30).map(|i| 80.0 + i as f64).collect());
    let d = uniform("D", (0..30).map(|i| 100.0 + 0.5 * i as f64).collect());
    let data_c = c.scaled(1.05);
    let est = estimate_combined(
        ControlRegions::new(&b, &data_c, &d),
        ControlRegions::new(&b, &c, &d),
        &RatioFitConfig::default(),
        1,
        &Rebin::Factor(3),
    )
    .unwrap();
    let ratio = ratio_fit_artifact("massAve", "combined", &combined_inputs(&est)).unwrap();
    let pulls = pulls_artifact("massAve", "Pulls_Bkg", &b, &est.hybrid.histogram).unwrap();

    for (kind, json) in [
        ("closure", closure_json()),
        ("ratio_fit", serde_json::to_string(&ratio).unwrap()),
        ("pulls", serde_json::to_string(&pulls).unwrap()),
    ] {
        let svg = render_svg(&json, kind, &config).unwrap();
        assert!(svg.starts_with("<svg"), "{kind}");
        assert!(svg.trim_end().ends_with("</svg>"), "{kind}");
        assert!(svg.contains("CMS"), "{kind}");
    }
}

#[test]
fn unknown_kind_and_format() {
    let config = resolve_config("cms", None).unwrap();
    assert!(matches!(render_svg("{}", "ranking", &config), Err(RenderError::UnknownKind(_))));
    assert!(matches!(
        render_to_bytes(&closure_json(), "closure", "bmp", &config),
        Err(RenderError::UnknownFormat(_))
    ));
    assert!(matches!(render_svg("{}", "closure", &config), Err(RenderError::Deserialize(_))));
}

#[test]
fn minimal_theme_has_no_header() {
    let config = resolve_config("minimal", None).unwrap();
    let svg = render_svg(&closure_json(), "closure", &config).unwrap();
    assert!(!svg.contains(">CMS<"));
}

#[test]
fn render_to_file_writes_svg() {
    let dir = std::env::temp_dir().join(format!("abcd-render-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("closure.svg");
    render_to_file(&closure_json(), "closure", &path, &resolve_config("cms", None).unwrap()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<svg"));
    std::fs::remove_dir_all(&dir).unwrap();
}
