use abcd_core::{Error, Histogram, Rebin, RegionHistograms, Sample};
use abcd_fit::diagnostics::ratio_diagnostics;
use abcd_fit::{
    BinModel, CHI2_BINS, ControlRegions, FALLBACK_ERROR, RatioFitConfig, SampleInput, aggregate,
    estimate, estimate_combined, fit_ratio, polynomial, predict,
};
use approx::assert_relative_eq;
use proptest::prelude::*;

fn uniform(name: &str, contents: Vec<f64>) -> Histogram {
    let edges = Histogram::uniform_edges(contents.len(), 50.0, 350.0);
    Histogram::from_counts(name, edges, contents).unwrap()
}

#[test]
fn three_bin_example_with_constant_ratio() {
    let edges = vec![35.0, 85.0, 135.0, 185.0];
    let b = Histogram::from_counts("B", edges.clone(), vec![10.0, 20.0, 30.0]).unwrap();
    let c = Histogram::from_counts("C", edges.clone(), vec![4.0, 8.0, 8.0]).unwrap();
    let d = Histogram::from_counts("D", edges, vec![5.0, 10.0, 10.0]).unwrap();

    let config = RatioFitConfig::default().with_degree(0);
    let est = estimate(ControlRegions::new(&b, &c, &d), &config, &Rebin::Factor(1)).unwrap();

    assert_eq!(est.fit.ndf, 2);
    assert_relative_eq!(est.fit.eval(60.0), 0.8, max_relative = 1e-9);
    let predicted = est.prediction.histogram.contents();
    for (got, want) in predicted.iter().zip([8.0, 16.0, 24.0]) {
        assert_relative_eq!(*got, want, max_relative = 1e-9);
    }
    assert!(est.prediction.histogram.errors().iter().all(|&e| e > 0.0));
    assert_relative_eq!(est.prediction.yield_total(), 48.0, max_relative = 1e-9);
}

#[test]
fn empty_b_bins_get_fallback_error() {
    let b = uniform("B", vec![0.0, 20.0, 30.0, 0.0]);
    let c = uniform("C", vec![4.0, 8.0, 8.0, 6.0]);
    let d = uniform("D", vec![5.0, 10.0, 10.0, 9.0]);
    let config = RatioFitConfig::default().with_degree(1);
    let est = estimate(ControlRegions::new(&b, &c, &d), &config, &Rebin::Factor(1)).unwrap();

    let errors = est.prediction.histogram.errors();
    assert_eq!(errors[0], FALLBACK_ERROR);
    assert_eq!(errors[3], FALLBACK_ERROR);
    assert!(errors[1] != FALLBACK_ERROR);
}

#[test]
fn coarse_prediction_of_sparse_b_has_poisson_errors() {
    let edges = Histogram::uniform_edges(500, 0.0, 500.0);
    let sparse: Vec<f64> = (0..500).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect();
    let b = Histogram::from_counts("B", edges.clone(), sparse).unwrap();
    let c = Histogram::from_counts("C", edges.clone(), vec![40.0; 500]).unwrap();
    let d = Histogram::from_counts("D", edges, vec![80.0; 500]).unwrap();
    let config = RatioFitConfig::default().with_degree(0);
    let est = estimate(ControlRegions::new(&b, &c, &d), &config, &Rebin::Factor(50)).unwrap();

    let coarse = predict(&b.rebinned(&Rebin::Factor(5)).unwrap(), &est.fit).unwrap().histogram;
    assert_eq!(coarse.n_bins(), 100);
    for i in 0..coarse.n_bins() {
        assert_relative_eq!(coarse.content(i), 0.5, epsilon = 1e-3);
        assert_relative_eq!(coarse.error(i), 0.5, epsilon = 2e-2);
    }

    // Merging the fine prediction instead carries four fallback errors into every bin.
    let merged = est.prediction.histogram.rebinned(&Rebin::Factor(5)).unwrap();
    assert!(merged.errors().iter().all(|&e| e > 2.0 * FALLBACK_ERROR));
}

#[test]
fn exact_cubic_is_recovered_in_integral_mode() {
    let coeffs = [0.5, 2e-3, -1e-5, 2e-8];
    let edges = Histogram::uniform_edges(30, 50.0, 350.0);
    let contents: Vec<f64> = edges
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| {
                    let p = (k + 1) as i32;
                    c * (b.powi(p) - a.powi(p)) / (p as f64 * (b - a))
                })
                .sum()
        })
        .collect();
    let errors = vec![0.01; contents.len()];
    let ratio = Histogram::new("ratio", edges, contents, errors).unwrap();

    let fit = fit_ratio(&ratio, &RatioFitConfig::default(), None).unwrap();
    assert!(fit.converged);
    assert!(fit.chi2 < 1e-10, "chi2 = {}", fit.chi2);
    assert_eq!(fit.ndf, 26);
    for (got, want) in fit.parameters().iter().zip(coeffs) {
        assert_relative_eq!(*got, want, max_relative = 1e-6);
    }
    assert_relative_eq!(fit.eval(200.0), polynomial::eval(&coeffs, 200.0), max_relative = 1e-9);
}

#[test]
fn center_mode_differs_from_integral_mode_on_curved_ratio() {
    let contents: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 - 15.0).powi(2)).collect();
    let c = uniform("C", contents.clone());
    let d = uniform("D", vec![200.0; 30]);
    let ratio = c.divided(&d).unwrap();

    let integral = fit_ratio(&ratio, &RatioFitConfig::default(), None).unwrap();
    let mut center_config = RatioFitConfig::default();
    center_config.bin_model = BinModel::Center;
    let center = fit_ratio(&ratio, &center_config, None).unwrap();

    assert!(integral.converged && center.converged);
    assert!((integral.parameters()[0] - center.parameters()[0]).abs() > 1e-9);
}

#[test]
fn combined_estimate_applies_data_fit_to_background() {
    let b = uniform("B", (0..30).map(|i| 200.0 - 3.0 * i as f64).collect());
    let c = uniform("C", (0..30).map(|i| 80.0 + i as f64).collect());
    let d = uniform("D", (0..30).map(|i| 100.0 + 0.5 * i as f64).collect());
    let data_c = c.scaled(1.1);

    let data = ControlRegions::new(&b, &data_c, &d);
    let background = ControlRegions::new(&b, &c, &d);
    let config = RatioFitConfig::default();
    let est = estimate_combined(data, background, &config, 1, &Rebin::Factor(2)).unwrap();

    assert_eq!(est.data_ratio.n_bins(), 15);
    assert_eq!(est.data.histogram.n_bins(), 30);
    // Same B on both sides: hybrid and data predictions coincide.
    assert_eq!(est.data.histogram.contents(), est.hybrid.histogram.contents());
    assert_relative_eq!(
        est.data_fit.eval(200.0),
        1.1 * est.background_fit.eval(200.0),
        max_relative = 1e-6
    );
}

#[test]
fn combined_estimate_rejects_mismatched_b() {
    let h = uniform("h", vec![10.0; 30]);
    let other = Histogram::from_counts("o", Histogram::uniform_edges(30, 0.0, 300.0), vec![10.0; 30])
        .unwrap();
    let data = ControlRegions::new(&h, &h, &h);
    let background = ControlRegions::new(&other, &h, &h);
    let err = estimate_combined(data, background, &RatioFitConfig::default(), 1, &Rebin::Factor(1))
        .unwrap_err();
    assert!(matches!(err, Error::Binning(_)));
}

#[test]
fn aggregate_feeds_the_estimator() {
    let regions = RegionHistograms::new(
        uniform("B", vec![50.0; 30]),
        uniform("C", vec![40.0; 30]),
        uniform("D", vec![80.0; 30]),
    )
    .unwrap();
    let (tt, wz) = (Sample::simulated("TTJets", 1.0), Sample::simulated("WZ", 1.0));
    let total = aggregate(&[SampleInput::new(&tt, &regions), SampleInput::new(&wz, &regions)]).unwrap();
    assert_eq!(total.b.contents()[0], 100.0);

    let est = estimate(
        ControlRegions::from_regions(&total),
        &RatioFitConfig::default(),
        &Rebin::Factor(5),
    )
    .unwrap();
    for &p in est.prediction.histogram.contents() {
        assert_relative_eq!(p, 50.0, max_relative = 1e-6);
    }
}

fn counts(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(20.0f64..200.0, n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prediction_is_invariant_under_common_scale_of_b_and_d(
        b in counts(30),
        c in counts(30),
        d in counts(30),
        k in 0.1f64..10.0,
    ) {
        let (b, c, d) = (uniform("B", b), uniform("C", c), uniform("D", d));
        let (bk, dk) = (b.scaled(k), d.scaled(k));
        let config = RatioFitConfig::default();
        let rebin = Rebin::Factor(2);

        let base = estimate(ControlRegions::new(&b, &c, &d), &config, &rebin).unwrap();
        let scaled = estimate(ControlRegions::new(&bk, &c, &dk), &config, &rebin).unwrap();
        for (x, y) in base.prediction.histogram.contents().iter().zip(scaled.prediction.histogram.contents()) {
            prop_assert!((x - y).abs() <= 1e-6 * x.abs().max(1.0), "{} vs {}", x, y);
        }
    }

    #[test]
    fn chi2_is_non_negative_and_zero_on_identity(a in counts(40), b in counts(40)) {
        let (h1, h2) = (uniform("h1", a), uniform("h2", b));
        let diag = ratio_diagnostics(&h1, &h2, CHI2_BINS).unwrap();
        prop_assert!(diag.chi2 >= 0.0);
        prop_assert_eq!(diag.ndf, CHI2_BINS - 1);

        let same = ratio_diagnostics(&h1, &h1, CHI2_BINS).unwrap();
        prop_assert_eq!(same.chi2, 0.0);
        prop_assert!(same.full.contents().iter().all(|&r| r == 1.0));
    }
}
