use abcd_core::{Histogram, Rebin};
use abcd_fit::{ControlRegions, RatioFitConfig, estimate, fit_ratio};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn smooth(name: &str, n: usize, f: impl Fn(f64) -> f64) -> Histogram {
    let edges = Histogram::uniform_edges(n, 0.0, 500.0);
    let contents = edges.windows(2).map(|w| f(0.5 * (w[0] + w[1]))).collect();
    Histogram::from_counts(name, edges, contents).unwrap()
}

fn bench_fit_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_ratio");

    for &n_bins in &[20usize, 100, 500] {
        let num = smooth("C", n_bins, |x| 400.0 * (-x / 300.0).exp() + 20.0);
        let den = smooth("D", n_bins, |x| 500.0 * (-x / 250.0).exp() + 25.0);
        let ratio = num.divided(&den).unwrap();
        let config = RatioFitConfig::default();

        group.bench_with_input(BenchmarkId::from_parameter(n_bins), &ratio, |b, ratio| {
            b.iter(|| {
                let fit = fit_ratio(black_box(ratio), &config, None).unwrap();
                black_box(fit.chi2)
            })
        });
    }

    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let b = smooth("B", 1000, |x| 3000.0 * (-x / 200.0).exp() + 10.0);
    let cr = smooth("C", 1000, |x| 400.0 * (-x / 300.0).exp() + 20.0);
    let d = smooth("D", 1000, |x| 500.0 * (-x / 250.0).exp() + 25.0);
    let config = RatioFitConfig::default();
    let rebin = Rebin::Factor(50);

    c.bench_function("estimate_1000_bins", |bench| {
        bench.iter(|| {
            let est = estimate(ControlRegions::new(&b, &cr, &d), &config, black_box(&rebin)).unwrap();
            black_box(est.prediction.yield_total())
        })
    });
}

criterion_group!(benches, bench_fit_ratio, bench_estimate);
criterion_main!(benches);
