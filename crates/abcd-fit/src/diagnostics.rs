//! Bin-by-bin comparison diagnostics: ratios, pulls, chi-square.
//!
//! Nothing here feeds back into the extrapolation. Division by zero never
//! fails: every term whose denominator vanishes contributes 0 to its own
//! quantity only.

use abcd_core::{Histogram, Result};

/// Number of leading bins entering the comparison chi-square.
pub const CHI2_BINS: usize = 35;

/// Pull histogram binning: 14 bins over `[-3, 3]`.
pub const PULL_BINS: usize = 14;
/// Pull histogram range.
pub const PULL_RANGE: (f64, f64) = (-3.0, 3.0);

/// Output of [`ratio_diagnostics`].
#[derive(Debug, Clone)]
pub struct RatioDiagnostics {
    /// `h1 / h2` with both histograms' errors propagated.
    pub full: Histogram,
    /// `h1 / h2` with only the denominator error propagated.
    pub denominator_only: Histogram,
    /// Upper asymmetric error per bin.
    pub asym_up: Vec<f64>,
    /// Lower asymmetric error per bin.
    pub asym_down: Vec<f64>,
    /// `Σ (c2 - c1)² / (e1² + e2²)` over the leading bins with `c2 > 0`.
    pub chi2: f64,
    /// Bins entering `chi2`, minus one.
    pub ndf: usize,
}

fn quotient(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// `num / den - r`, or 0 when `den` is 0.
fn shift(num: f64, den: f64, r: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den - r }
}

/// Compare `h1` against `h2` bin by bin.
///
/// Only the first `chi2_bins` bins are used for the chi-square.
pub fn ratio_diagnostics(h1: &Histogram, h2: &Histogram, chi2_bins: usize) -> Result<RatioDiagnostics> {
    h1.check_binning(h2)?;
    let n = h1.n_bins();

    let mut ratios = Vec::with_capacity(n);
    let mut full_errors = Vec::with_capacity(n);
    let mut den_errors = Vec::with_capacity(n);
    let mut asym_up = Vec::with_capacity(n);
    let mut asym_down = Vec::with_capacity(n);
    let mut chi2 = 0.0;
    let mut considered = 0usize;

    for i in 0..n {
        let (c1, e1) = (h1.content(i), h1.error(i));
        let (c2, e2) = (h2.content(i), h2.error(i));
        let r = quotient(c1, c2);

        let rel1 = quotient(e1, c1);
        let rel2 = quotient(e2, c2);
        ratios.push(r);
        full_errors.push((r * rel1.hypot(rel2)).abs());
        den_errors.push((r * rel2).abs());

        if c2 == 0.0 {
            asym_up.push(0.0);
            asym_down.push(0.0);
        } else {
            asym_up.push(shift(c1, c2 - e2, r).hypot(shift(c1 + e1, c2, r)));
            asym_down.push(shift(c1, c2 + e2, r).hypot(shift(c1 - e1, c2, r)));
        }

        if i < chi2_bins && c2 > 0.0 {
            chi2 += quotient((c2 - c1).powi(2), e1 * e1 + e2 * e2);
            considered += 1;
        }
    }

    let edges = h1.edges().to_vec();
    Ok(RatioDiagnostics {
        full: Histogram::new(h1.name(), edges.clone(), ratios.clone(), full_errors)?,
        denominator_only: Histogram::new(h1.name(), edges, ratios, den_errors)?,
        asym_up,
        asym_down,
        chi2,
        ndf: considered.saturating_sub(1),
    })
}

/// `(c1 - c2) / e1` per bin with unit error; 0 where `e1` is 0.
pub fn pulls(h1: &Histogram, h2: &Histogram) -> Result<Histogram> {
    h1.check_binning(h2)?;
    h1.map_bins(|i, c1, e1| (quotient(c1 - h2.content(i), e1), 1.0))
}

/// Distribution of pull values, [`PULL_BINS`] bins over [`PULL_RANGE`].
///
/// Values outside the range are dropped.
pub fn pull_distribution(pulls: &Histogram) -> Result<Histogram> {
    let edges = Histogram::uniform_edges(PULL_BINS, PULL_RANGE.0, PULL_RANGE.1);
    let mut counts = vec![0.0; PULL_BINS];
    let binning = Histogram::zeros("pulls", edges.clone())?;
    for &p in pulls.contents() {
        if let Some(j) = binning.find_bin(p) {
            counts[j] += 1.0;
        }
    }
    Histogram::from_counts(format!("{}_pullsOnly", pulls.name()), edges, counts)
}

/// Same contents with a relative systematic error: `|content · unc - content|`.
///
/// `unc = 1.1` is a ±10 % band.
pub fn systematic_band(h: &Histogram, unc: f64) -> Result<Histogram> {
    h.map_bins(|_, c, _| (c, (c * unc - c).abs()))
}

/// Assign `error` to every empty bin.
pub fn with_zero_bin_error(h: &Histogram, error: f64) -> Result<Histogram> {
    h.map_bins(|_, c, e| if c == 0.0 { (c, error) } else { (c, e) })
}

/// Product-form ABCD prediction `B · C / D` per bin.
///
/// Relative errors of B, C and D add in quadrature. Bins with empty D are 0.
pub fn classic_abcd(b: &Histogram, c: &Histogram, d: &Histogram) -> Result<Histogram> {
    b.check_binning(c)?;
    b.check_binning(d)?;
    b.map_bins(|i, cb, eb| {
        let (cc, ec) = (c.content(i), c.error(i));
        let (cd, ed) = (d.content(i), d.error(i));
        if cd == 0.0 {
            return (0.0, 0.0);
        }
        let pred = cb * cc / cd;
        let rel = (quotient(eb, cb).powi(2) + quotient(ec, cc).powi(2) + (ed / cd).powi(2)).sqrt();
        (pred, (pred * rel).abs())
    })
}
