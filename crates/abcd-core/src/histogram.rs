//! Immutable 1D histogram value type.
//!
//! A [`Histogram`] is an ordered sequence of bins, each holding a content and an
//! error, plus `n_bins + 1` strictly increasing edges. Histograms that are added
//! or divided together must share the same edges.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Relative tolerance used when comparing bin edges of two histograms.
const EDGE_TOL: f64 = 1e-9;

/// A 1D histogram with per-bin errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistogram")]
pub struct Histogram {
    name: String,
    edges: Vec<f64>,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through [`Histogram::new`].
#[derive(Deserialize)]
struct RawHistogram {
    name: String,
    edges: Vec<f64>,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

impl TryFrom<RawHistogram> for Histogram {
    type Error = Error;

    fn try_from(raw: RawHistogram) -> Result<Self> {
        Histogram::new(raw.name, raw.edges, raw.contents, raw.errors)
    }
}

/// How to merge bins in [`Histogram::rebinned`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rebin {
    /// Merge groups of `n` adjacent bins. Trailing bins that do not fill a
    /// complete group are dropped.
    Factor(usize),
    /// Variable-width target edges. Each source bin goes to the target bin
    /// containing its center; source bins outside the target range are dropped.
    Edges(Vec<f64>),
}

impl Histogram {
    /// Create a histogram, validating the layout.
    pub fn new(
        name: impl Into<String>,
        edges: Vec<f64>,
        contents: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        validate_edges(&edges)?;
        if contents.len() + 1 != edges.len() {
            return Err(Error::Validation(format!(
                "histogram '{}': {} edges for {} bins",
                name,
                edges.len(),
                contents.len()
            )));
        }
        if errors.len() != contents.len() {
            return Err(Error::Validation(format!(
                "histogram '{}': {} errors for {} bins",
                name,
                errors.len(),
                contents.len()
            )));
        }
        if let Some(i) = contents.iter().position(|c| !c.is_finite()) {
            return Err(Error::Validation(format!(
                "histogram '{}': non-finite content in bin {}",
                name, i
            )));
        }
        if let Some(i) = errors.iter().position(|e| !(e.is_finite() && *e >= 0.0)) {
            return Err(Error::Validation(format!(
                "histogram '{}': invalid error {} in bin {}",
                name, errors[i], i
            )));
        }
        Ok(Self { name, edges, contents, errors })
    }

    /// Create a histogram with Poisson-like errors `sqrt(|content|)`.
    pub fn from_counts(name: impl Into<String>, edges: Vec<f64>, contents: Vec<f64>) -> Result<Self> {
        let errors = contents.iter().map(|c| c.abs().sqrt()).collect();
        Self::new(name, edges, contents, errors)
    }

    /// Create an empty histogram (all contents and errors zero) with the given edges.
    pub fn zeros(name: impl Into<String>, edges: Vec<f64>) -> Result<Self> {
        let n = edges.len().saturating_sub(1);
        Self::new(name, edges, vec![0.0; n], vec![0.0; n])
    }

    /// Uniform edges: `n_bins` bins between `x_min` and `x_max`.
    pub fn uniform_edges(n_bins: usize, x_min: f64, x_max: f64) -> Vec<f64> {
        let width = (x_max - x_min) / n_bins as f64;
        (0..=n_bins).map(|i| x_min + i as f64 * width).collect()
    }

    // --- accessors ---

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bin edges (length = `n_bins() + 1`).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin contents.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Bin errors.
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    /// Content of bin `i`.
    pub fn content(&self, i: usize) -> f64 {
        self.contents[i]
    }

    /// Error of bin `i`.
    pub fn error(&self, i: usize) -> f64 {
        self.errors[i]
    }

    /// Center of bin `i`.
    pub fn center(&self, i: usize) -> f64 {
        0.5 * (self.edges[i] + self.edges[i + 1])
    }

    /// Width of bin `i`.
    pub fn width(&self, i: usize) -> f64 {
        self.edges[i + 1] - self.edges[i]
    }

    /// All bin centers.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.center(i)).collect()
    }

    /// All bin widths.
    pub fn widths(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.width(i)).collect()
    }

    /// Lower edge of the first bin.
    pub fn x_min(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin.
    pub fn x_max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Sum of bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Error on the integral (bin errors added in quadrature).
    pub fn integral_error(&self) -> f64 {
        self.errors.iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    /// Bin index containing `x` (lower edge inclusive), or `None` if outside.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        find_bin(&self.edges, x)
    }

    /// Whether `other` has the same edges (within a relative tolerance).
    pub fn same_binning(&self, other: &Histogram) -> bool {
        self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .zip(other.edges.iter())
                .all(|(a, b)| (a - b).abs() <= EDGE_TOL * a.abs().max(b.abs()).max(1.0))
    }

    /// Return `Err(Error::Binning)` unless `other` has the same edges.
    pub fn check_binning(&self, other: &Histogram) -> Result<()> {
        if self.same_binning(other) {
            Ok(())
        } else {
            Err(Error::Binning(format!(
                "'{}' ({} bins, [{}, {}]) vs '{}' ({} bins, [{}, {}])",
                self.name,
                self.n_bins(),
                self.x_min(),
                self.x_max(),
                other.name,
                other.n_bins(),
                other.x_min(),
                other.x_max()
            )))
        }
    }

    // --- transforms ---

    /// Same histogram under a new name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    /// Multiply every bin by `k`; errors scale by `|k|`.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            name: self.name.clone(),
            edges: self.edges.clone(),
            contents: self.contents.iter().map(|c| c * k).collect(),
            errors: self.errors.iter().map(|e| e * k.abs()).collect(),
        }
    }

    /// Bin-wise sum; errors add in quadrature.
    pub fn added(&self, other: &Histogram) -> Result<Self> {
        self.check_binning(other)?;
        Ok(Self {
            name: self.name.clone(),
            edges: self.edges.clone(),
            contents: self.contents.iter().zip(&other.contents).map(|(a, b)| a + b).collect(),
            errors: self.errors.iter().zip(&other.errors).map(|(a, b)| a.hypot(*b)).collect(),
        })
    }

    /// Bin-wise quotient `self / other` with uncorrelated error propagation.
    ///
    /// `err² = (e1²·c2² + e2²·c1²) / c2⁴`. Bins where `other` is zero get content 0
    /// and error 0.
    pub fn divided(&self, other: &Histogram) -> Result<Self> {
        self.check_binning(other)?;
        let n = self.n_bins();
        let mut contents = Vec::with_capacity(n);
        let mut errors = Vec::with_capacity(n);
        for i in 0..n {
            let (c1, e1) = (self.contents[i], self.errors[i]);
            let (c2, e2) = (other.contents[i], other.errors[i]);
            if c2 == 0.0 {
                contents.push(0.0);
                errors.push(0.0);
                continue;
            }
            let c2sq = c2 * c2;
            contents.push(c1 / c2);
            errors.push(((e1 * e1 * c2sq + e2 * e2 * c1 * c1) / (c2sq * c2sq)).sqrt());
        }
        Ok(Self { name: self.name.clone(), edges: self.edges.clone(), contents, errors })
    }

    /// Rewrite every bin through `f(index, content, error) -> (content, error)`.
    ///
    /// Returns an error if `f` produces a non-finite content or an invalid error.
    pub fn map_bins(&self, f: impl Fn(usize, f64, f64) -> (f64, f64)) -> Result<Self> {
        let (contents, errors): (Vec<f64>, Vec<f64>) =
            (0..self.n_bins()).map(|i| f(i, self.contents[i], self.errors[i])).unzip();
        Self::new(self.name.clone(), self.edges.clone(), contents, errors)
    }

    /// Merge bins according to `rebin`.
    pub fn rebinned(&self, rebin: &Rebin) -> Result<Self> {
        match rebin {
            Rebin::Factor(n) => self.rebinned_by_factor(*n),
            Rebin::Edges(edges) => self.rebinned_to_edges(edges),
        }
    }

    fn rebinned_by_factor(&self, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::Validation("rebin factor must be positive".into()));
        }
        if n == 1 {
            return Ok(self.clone());
        }
        let n_new = self.n_bins() / n;
        if n_new == 0 {
            return Err(Error::Validation(format!(
                "rebin factor {} exceeds the {} bins of '{}'",
                n,
                self.n_bins(),
                self.name
            )));
        }
        let edges = (0..=n_new).map(|j| self.edges[j * n]).collect();
        let mut contents = Vec::with_capacity(n_new);
        let mut errors = Vec::with_capacity(n_new);
        for j in 0..n_new {
            let range = j * n..(j + 1) * n;
            contents.push(self.contents[range.clone()].iter().sum());
            errors.push(self.errors[range].iter().map(|e| e * e).sum::<f64>().sqrt());
        }
        Self::new(self.name.clone(), edges, contents, errors)
    }

    fn rebinned_to_edges(&self, edges: &[f64]) -> Result<Self> {
        validate_edges(edges)?;
        let n_new = edges.len() - 1;
        let mut contents = vec![0.0; n_new];
        let mut sumw2 = vec![0.0; n_new];
        for i in 0..self.n_bins() {
            if let Some(j) = find_bin(edges, self.center(i)) {
                contents[j] += self.contents[i];
                sumw2[j] += self.errors[i] * self.errors[i];
            }
        }
        let errors = sumw2.into_iter().map(f64::sqrt).collect();
        Self::new(self.name.clone(), edges.to_vec(), contents, errors)
    }
}

fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::Validation(format!("need at least 2 bin edges, got {}", edges.len())));
    }
    if edges.iter().any(|e| !e.is_finite()) {
        return Err(Error::Validation("bin edges must be finite".into()));
    }
    if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
        return Err(Error::Validation(format!(
            "bin edges must be strictly increasing ({} then {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

fn find_bin(edges: &[f64], x: f64) -> Option<usize> {
    let last = edges.len() - 1;
    if !(x >= edges[0] && x < edges[last]) {
        return None;
    }
    // partition_point: first edge strictly greater than x
    Some(edges.partition_point(|&e| e <= x) - 1)
}
