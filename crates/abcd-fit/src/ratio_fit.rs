//! Polynomial fit of a ratio histogram with a pointwise confidence band.
//!
//! The chi-square `Σ w_i (y_i − m_i(a))²` is minimized with L-BFGS and then
//! finished with one exact Newton step (the objective is quadratic in the
//! coefficients, so the Gauss–Newton Hessian `2 JᵀWJ` is exact). Coefficients
//! and covariance are carried in the standardized variable of the fit window
//! and converted to the raw power basis on output.

use abcd_core::{Error, FitResult, Histogram, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use tracing::{debug, warn};

use crate::optimizer::{LbfgsOptimizer, Objective, OptimizerConfig};
use crate::polynomial::{self, Standardization};

/// How the polynomial is compared to each bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinModel {
    /// Average of the polynomial over the bin.
    #[default]
    Integral,
    /// Value at the bin center.
    Center,
}

/// How the confidence-interval half-width is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMethod {
    /// `sqrt(χ²₁ quantile(cl) · gᵀCg)`.
    #[default]
    ChiSquare,
    /// Student-t quantile with `ndf` degrees of freedom, covariance scaled by `χ²/ndf`.
    StudentT,
}

/// Ratio fit settings.
#[derive(Debug, Clone)]
pub struct RatioFitConfig {
    /// Polynomial degree.
    pub degree: usize,
    /// Fit window `(lo, hi)`; only bins with centers inside enter the fit.
    pub window: (f64, f64),
    /// Number of successive minimizations, each seeded by the previous one.
    pub passes: usize,
    /// Confidence level of the band.
    pub confidence_level: f64,
    /// Per-bin model.
    pub bin_model: BinModel,
    /// Band scaling.
    pub interval: IntervalMethod,
    /// Minimizer settings.
    pub optimizer: OptimizerConfig,
}

impl Default for RatioFitConfig {
    fn default() -> Self {
        Self {
            degree: 3,
            window: (50.0, 350.0),
            passes: 3,
            confidence_level: 0.683,
            bin_model: BinModel::Integral,
            interval: IntervalMethod::ChiSquare,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl RatioFitConfig {
    /// Same settings with a different degree.
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Same settings with a different number of passes.
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    /// Number of polynomial coefficients.
    pub fn n_params(&self) -> usize {
        self.degree + 1
    }

    fn validate(&self) -> Result<()> {
        let (lo, hi) = self.window;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::Validation(format!("invalid fit window [{}, {}]", lo, hi)));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::Validation(format!(
                "confidence level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.passes == 0 {
            return Err(Error::Validation("ratio fit needs at least one pass".into()));
        }
        Ok(())
    }
}

/// Weighted least squares over a fixed design matrix.
struct ChiSquare {
    design: DMatrix<f64>,
    y: DVector<f64>,
    w: DVector<f64>,
}

impl ChiSquare {
    fn residuals(&self, params: &[f64]) -> DVector<f64> {
        &self.y - &self.design * DVector::from_column_slice(params)
    }

    /// `JᵀWJ`
    fn normal_matrix(&self) -> DMatrix<f64> {
        let mut wj = self.design.clone();
        for (mut row, w) in wj.row_iter_mut().zip(self.w.iter()) {
            row *= *w;
        }
        self.design.transpose() * wj
    }
}

impl Objective for ChiSquare {
    fn value(&self, params: &[f64]) -> Result<f64> {
        let r = self.residuals(params);
        Ok(r.iter().zip(self.w.iter()).map(|(r, w)| w * r * r).sum())
    }

    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let wr = self.residuals(params).component_mul(&self.w);
        Ok((self.design.transpose() * wr * -2.0).iter().copied().collect())
    }
}

/// Result of [`fit_ratio`].
#[derive(Debug, Clone)]
pub struct RatioFit {
    standardization: Standardization,
    coefficients: Vec<f64>,
    covariance: DMatrix<f64>,
    interval_scale: f64,
    window: (f64, f64),
    /// Chi-square at the minimum.
    pub chi2: f64,
    /// Fitted bins minus parameters.
    pub ndf: usize,
    /// Bins that entered the fit.
    pub n_points: usize,
    /// Whether the last pass converged.
    pub converged: bool,
    /// Objective evaluations over all passes.
    pub n_evaluations: usize,
}

impl RatioFit {
    /// Fitted function at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        polynomial::eval(&self.coefficients, self.standardization.u(x))
    }

    /// Half-width of the confidence band at `x`.
    pub fn confidence_interval(&self, x: f64) -> f64 {
        let g = DVector::from_vec(polynomial::basis(self.standardization.u(x), self.coefficients.len()));
        let var = (g.transpose() * &self.covariance * &g)[(0, 0)];
        self.interval_scale * var.max(0.0).sqrt()
    }

    /// Raw power-basis coefficients `c_0 … c_n` of `Σ c_k x^k`.
    pub fn parameters(&self) -> Vec<f64> {
        self.standardization.to_raw(&self.coefficients)
    }

    /// Covariance of [`parameters`](Self::parameters).
    pub fn covariance(&self) -> DMatrix<f64> {
        self.standardization.covariance_to_raw(&self.covariance)
    }

    /// Fit window.
    pub fn window(&self) -> (f64, f64) {
        self.window
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// `(x, f(x), ci(x))` at `n` evenly spaced points of `[lo, hi]`.
    pub fn sample(&self, lo: f64, hi: f64, n: usize) -> Vec<(f64, f64, f64)> {
        let n = n.max(2);
        let step = (hi - lo) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = lo + i as f64 * step;
                (x, self.eval(x), self.confidence_interval(x))
            })
            .collect()
    }

    /// Raw-basis summary with a row-major covariance.
    pub fn fit_result(&self) -> FitResult {
        let cov = self.covariance();
        let n = cov.nrows();
        let flat = (0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|ij| cov[ij]).collect();
        FitResult::with_covariance(
            self.parameters(),
            flat,
            self.chi2,
            self.ndf,
            self.converged,
            self.n_evaluations,
        )
    }
}

/// Fit `ratio` with a polynomial over the configured window.
///
/// `init` seeds the first pass with raw power-basis coefficients (for example
/// those of a previous fit); without it the fit starts from the weighted mean.
pub fn fit_ratio(ratio: &Histogram, config: &RatioFitConfig, init: Option<&[f64]>) -> Result<RatioFit> {
    config.validate()?;
    let (lo, hi) = config.window;
    let n_params = config.n_params();
    let standardization = Standardization::from_window(lo, hi);

    let points: Vec<usize> = (0..ratio.n_bins())
        .filter(|&i| {
            let x = ratio.center(i);
            x >= lo && x <= hi && ratio.error(i) > 0.0
        })
        .collect();
    if points.len() < n_params {
        return Err(Error::Computation(format!(
            "ratio fit of '{}': {} usable bins in [{}, {}] for {} parameters",
            ratio.name(),
            points.len(),
            lo,
            hi,
            n_params
        )));
    }

    let mut design = DMatrix::zeros(points.len(), n_params);
    for (row, &i) in points.iter().enumerate() {
        let values = match config.bin_model {
            BinModel::Integral => {
                let edges = ratio.edges();
                polynomial::bin_average_basis(
                    standardization.u(edges[i]),
                    standardization.u(edges[i + 1]),
                    n_params,
                )
            }
            BinModel::Center => polynomial::basis(standardization.u(ratio.center(i)), n_params),
        };
        for (col, v) in values.into_iter().enumerate() {
            design[(row, col)] = v;
        }
    }
    let objective = ChiSquare {
        design,
        y: DVector::from_iterator(points.len(), points.iter().map(|&i| ratio.content(i))),
        w: DVector::from_iterator(points.len(), points.iter().map(|&i| ratio.error(i).powi(-2))),
    };

    let covariance = objective.normal_matrix().try_inverse().ok_or_else(|| {
        Error::Computation(format!("ratio fit of '{}': singular normal matrix", ratio.name()))
    })?;

    let mut params = match init {
        Some(raw) if raw.len() == n_params => standardization.from_raw(raw),
        Some(raw) => {
            return Err(Error::Validation(format!(
                "initial parameters: expected {}, got {}",
                n_params,
                raw.len()
            )));
        }
        None => {
            let mut p = vec![0.0; n_params];
            p[0] = objective.y.dot(&objective.w) / objective.w.sum();
            p
        }
    };

    let optimizer = LbfgsOptimizer::new(config.optimizer.clone());
    let mut n_evaluations = 0;
    let mut converged = false;
    let mut chi2 = f64::NAN;
    for pass in 0..config.passes {
        let (start, opt_converged, message) = match optimizer.minimize(&objective, &params) {
            Ok(min) => {
                n_evaluations += min.evaluations;
                (min.params, min.converged, min.status)
            }
            // Line-search failures near the minimum are recovered by the Newton step.
            Err(e) => (params.clone(), false, e.to_string()),
        };

        // Newton step with H = 2 JᵀWJ: Δ = -H⁻¹ ∇χ².
        let grad = DVector::from_vec(objective.gradient(&start)?);
        let step = &covariance * grad * 0.5;
        params = start.iter().zip(step.iter()).map(|(p, s)| p - s).collect();

        chi2 = objective.value(&params)?;
        n_evaluations += 1;
        let grad_norm = objective.gradient(&params)?.iter().map(|g| g * g).sum::<f64>().sqrt();
        converged = opt_converged || grad_norm <= 1e-6 * (1.0 + chi2);
        debug!(pass, chi2, grad_norm, converged, message = %message, "ratio fit pass");
    }

    if !converged {
        warn!(histogram = ratio.name(), chi2, "ratio fit did not converge");
    }

    let ndf = points.len() - n_params;
    let interval_scale = interval_scale(config, chi2, ndf)?;

    Ok(RatioFit {
        standardization,
        coefficients: params,
        covariance,
        interval_scale,
        window: config.window,
        chi2,
        ndf,
        n_points: points.len(),
        converged,
        n_evaluations,
    })
}

fn interval_scale(config: &RatioFitConfig, chi2: f64, ndf: usize) -> Result<f64> {
    let cl = config.confidence_level;
    match config.interval {
        IntervalMethod::StudentT if ndf > 0 => {
            let t = StudentsT::new(0.0, 1.0, ndf as f64)
                .map_err(|e| Error::Computation(format!("Student-t quantile: {e}")))?
                .inverse_cdf(0.5 + 0.5 * cl);
            Ok(t * (chi2 / ndf as f64).sqrt())
        }
        _ => {
            let q = ChiSquared::new(1.0)
                .map_err(|e| Error::Computation(format!("chi-square quantile: {e}")))?
                .inverse_cdf(cl);
            Ok(q.sqrt())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ratio_hist(edges: Vec<f64>, contents: Vec<f64>, errors: Vec<f64>) -> Histogram {
        Histogram::new("ratio", edges, contents, errors).unwrap()
    }

    #[test]
    fn constant_fit_is_weighted_mean() {
        let h = ratio_hist(vec![35.0, 85.0, 135.0, 185.0], vec![1.0, 2.0, 4.0], vec![1.0, 1.0, 2.0]);
        let fit = fit_ratio(&h, &RatioFitConfig::default().with_degree(0), None).unwrap();
        // weights 1, 1, 0.25
        let mean = (1.0 + 2.0 + 4.0 * 0.25) / 2.25;
        assert_relative_eq!(fit.eval(100.0), mean, epsilon = 1e-9);
        assert_relative_eq!(fit.parameters()[0], mean, epsilon = 1e-9);
        assert_eq!(fit.ndf, 2);
        assert_eq!(fit.n_points, 3);
        assert!(fit.converged);
        // ci of a weighted mean: sqrt(q) / sqrt(Σw)
        let q = ChiSquared::new(1.0).unwrap().inverse_cdf(0.683);
        assert_relative_eq!(fit.confidence_interval(250.0), (q / 2.25).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn bins_outside_window_or_without_error_are_skipped() {
        let edges = Histogram::uniform_edges(10, 0.0, 500.0);
        let mut errors = vec![0.1; 10];
        errors[3] = 0.0;
        let contents = vec![9.0, 1.0, 1.0, 9.0, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0];
        let h = ratio_hist(edges, contents, errors);
        let fit = fit_ratio(&h, &RatioFitConfig::default().with_degree(0), None).unwrap();
        // centers 75..325 in window: bins 1..=6, bin 3 has zero error.
        assert_eq!(fit.n_points, 5);
        assert_relative_eq!(fit.eval(0.0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.chi2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let h = ratio_hist(vec![0.0, 100.0, 200.0], vec![1.0, 2.0], vec![0.1, 0.1]);
        let err = fit_ratio(&h, &RatioFitConfig::default(), None).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn init_length_must_match() {
        let h = ratio_hist(vec![35.0, 85.0, 135.0, 185.0], vec![1.0, 2.0, 4.0], vec![1.0, 1.0, 2.0]);
        let err = fit_ratio(&h, &RatioFitConfig::default().with_degree(0), Some(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let h = ratio_hist(vec![35.0, 85.0], vec![1.0], vec![1.0]);
        let mut config = RatioFitConfig::default().with_degree(0);
        config.window = (300.0, 100.0);
        assert!(matches!(fit_ratio(&h, &config, None), Err(Error::Validation(_))));
        let config = RatioFitConfig { confidence_level: 1.0, ..RatioFitConfig::default() };
        assert!(matches!(fit_ratio(&h, &config, None), Err(Error::Validation(_))));
    }

    #[test]
    fn student_t_band_scales_with_chi2() {
        let h = ratio_hist(
            Histogram::uniform_edges(6, 50.0, 350.0),
            vec![1.0, 1.2, 0.9, 1.1, 0.8, 1.0],
            vec![0.1; 6],
        );
        let chi = fit_ratio(&h, &RatioFitConfig::default().with_degree(1), None).unwrap();
        let config = RatioFitConfig { interval: IntervalMethod::StudentT, ..RatioFitConfig::default() };
        let t = fit_ratio(&h, &config.with_degree(1), None).unwrap();
        assert_relative_eq!(chi.eval(200.0), t.eval(200.0), epsilon = 1e-9);
        let t_q = StudentsT::new(0.0, 1.0, 4.0).unwrap().inverse_cdf(0.5 + 0.5 * 0.683);
        let chi_q = ChiSquared::new(1.0).unwrap().inverse_cdf(0.683).sqrt();
        let expected = chi.confidence_interval(200.0) / chi_q * t_q * (chi.chi2 / 4.0).sqrt();
        assert_relative_eq!(t.confidence_interval(200.0), expected, max_relative = 1e-9);
    }

    #[test]
    fn fit_result_reports_raw_basis() {
        let h = ratio_hist(
            Histogram::uniform_edges(6, 50.0, 350.0),
            vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5],
            vec![0.1; 6],
        );
        let config = RatioFitConfig { bin_model: BinModel::Center, ..RatioFitConfig::default() };
        let fit = fit_ratio(&h, &config.with_degree(1), None).unwrap();
        let result = fit.fit_result();
        // y = 1 + (x - 75) / 100
        assert_relative_eq!(result.parameters[0], 0.25, epsilon = 1e-8);
        assert_relative_eq!(result.parameters[1], 0.01, epsilon = 1e-10);
        assert_eq!(result.ndf, 4);
        assert!(result.covariance_entry(1, 1).unwrap() > 0.0);
        assert!(result.correlation(0, 1).unwrap() < 0.0);
    }
}
