//! Power-basis polynomials and the standardized variable used while fitting.
//!
//! Fits run in `u = (x - x0) / h`, where `[x0 - h, x0 + h]` is the fit window.
//! Raw power-basis coefficients `b` and standardized coefficients `a` are related
//! by a triangular linear map `b = T a`, so covariances transform as `T C Tᵀ`.

use nalgebra::DMatrix;

/// Evaluate `Σ c_k x^k` (Horner).
pub fn eval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Monomials `(1, x, …, x^(n-1))`.
pub fn basis(x: f64, n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    let mut p = 1.0;
    for _ in 0..n {
        out.push(p);
        p *= x;
    }
    out
}

/// Averages of the monomials over `[a, b]`.
///
/// Falls back to [`basis`] at `a` when the interval is degenerate.
pub fn bin_average_basis(a: f64, b: f64, n: usize) -> Vec<f64> {
    let width = b - a;
    if width.abs() < f64::EPSILON * a.abs().max(b.abs()).max(1.0) {
        return basis(a, n);
    }
    let mut out = Vec::with_capacity(n);
    let (mut pa, mut pb) = (a, b);
    for k in 0..n {
        out.push((pb - pa) / ((k + 1) as f64 * width));
        pa *= a;
        pb *= b;
    }
    out
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Affine map between the raw variable `x` and the standardized `u`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardization {
    /// Window center `x0`.
    pub center: f64,
    /// Window half-width `h`.
    pub half_width: f64,
}

impl Standardization {
    /// Map `[lo, hi]` onto `[-1, 1]`.
    pub fn from_window(lo: f64, hi: f64) -> Self {
        let half_width = 0.5 * (hi - lo);
        Self {
            center: 0.5 * (lo + hi),
            half_width: if half_width > 0.0 { half_width } else { 1.0 },
        }
    }

    /// Standardized coordinate of `x`.
    pub fn u(&self, x: f64) -> f64 {
        (x - self.center) / self.half_width
    }

    /// The `n × n` matrix `T` with `raw = T · standardized`.
    pub fn to_raw_matrix(&self, n: usize) -> DMatrix<f64> {
        let (x0, h) = (self.center, self.half_width);
        DMatrix::from_fn(n, n, |j, k| {
            if j > k {
                0.0
            } else {
                binomial(k, j) * (-x0).powi((k - j) as i32) / h.powi(k as i32)
            }
        })
    }

    /// Raw coefficients from standardized ones.
    pub fn to_raw(&self, standardized: &[f64]) -> Vec<f64> {
        let t = self.to_raw_matrix(standardized.len());
        (&t * nalgebra::DVector::from_column_slice(standardized)).iter().copied().collect()
    }

    /// Standardized coefficients from raw ones.
    pub fn from_raw(&self, raw: &[f64]) -> Vec<f64> {
        let (x0, h) = (self.center, self.half_width);
        let n = raw.len();
        (0..n)
            .map(|k| {
                let hk = h.powi(k as i32);
                (k..n).map(|j| raw[j] * binomial(j, k) * x0.powi((j - k) as i32) * hk).sum()
            })
            .collect()
    }

    /// Covariance of raw coefficients from the standardized covariance.
    pub fn covariance_to_raw(&self, cov: &DMatrix<f64>) -> DMatrix<f64> {
        let t = self.to_raw_matrix(cov.nrows());
        &t * cov * t.transpose()
    }
}
