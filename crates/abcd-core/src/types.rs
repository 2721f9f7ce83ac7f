//! Common data types

use serde::{Deserialize, Serialize};

/// Fit result containing parameter estimates and uncertainties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// Best-fit parameter values
    pub parameters: Vec<f64>,

    /// Parameter uncertainties (sqrt of covariance diagonal)
    pub uncertainties: Vec<f64>,

    /// Covariance matrix (row-major, N×N). `None` if the normal matrix was singular.
    pub covariance: Option<Vec<f64>>,

    /// Chi-square at the minimum
    pub chi2: f64,

    /// Degrees of freedom (fitted points minus parameters)
    pub ndf: usize,

    /// Convergence status
    pub converged: bool,

    /// Number of function evaluations
    pub n_evaluations: usize,
}

impl FitResult {
    /// Create a fit result with covariance matrix
    pub fn with_covariance(
        parameters: Vec<f64>,
        covariance: Vec<f64>,
        chi2: f64,
        ndf: usize,
        converged: bool,
        n_evaluations: usize,
    ) -> Self {
        let n = parameters.len();
        let uncertainties = (0..n).map(|i| covariance[i * n + i].max(0.0).sqrt()).collect();
        Self {
            parameters,
            uncertainties,
            covariance: Some(covariance),
            chi2,
            ndf,
            converged,
            n_evaluations,
        }
    }

    /// Chi-square per degree of freedom (`NaN` when `ndf == 0`).
    pub fn chi2_per_ndf(&self) -> f64 {
        if self.ndf == 0 { f64::NAN } else { self.chi2 / self.ndf as f64 }
    }

    /// Covariance element (i, j). Returns `None` if covariance is unavailable.
    pub fn covariance_entry(&self, i: usize, j: usize) -> Option<f64> {
        let cov = self.covariance.as_ref()?;
        let n = self.parameters.len();
        if i >= n || j >= n {
            return None;
        }
        Some(cov[i * n + j])
    }

    /// Get correlation matrix element (i, j). Returns `None` if covariance is unavailable.
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let c = self.covariance_entry(i, j)?;
        let sigma_i = self.uncertainties[i];
        let sigma_j = self.uncertainties[j];
        if sigma_i <= 0.0 || sigma_j <= 0.0 {
            return None;
        }
        Some(c / (sigma_i * sigma_j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_result() {
        let result = FitResult::with_covariance(vec![1.0, 2.0], vec![0.04, 0.01, 0.01, 0.09], 3.0, 2, true, 10);
        assert_relative_eq!(result.uncertainties[0], 0.2);
        assert_relative_eq!(result.uncertainties[1], 0.3);
        assert_relative_eq!(result.correlation(0, 1).unwrap(), 0.01 / 0.06);
        assert_relative_eq!(result.chi2_per_ndf(), 1.5);
        assert!(result.covariance_entry(2, 0).is_none());
    }
}
