//! Per-bin pulls and their distribution (numbers-first).

use abcd_core::{Histogram, Result};
use abcd_fit::diagnostics::{PULL_RANGE, pull_distribution, pulls};
use serde::{Deserialize, Serialize};

use crate::meta::ArtifactMeta;

/// Schema tag of [`PullsArtifact`].
pub const PULLS_SCHEMA: &str = "abcd_pulls_v0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullsArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    pub x_label: String,
    /// Edges of the compared histograms.
    pub bin_edges: Vec<f64>,
    /// `(observed - predicted) / σ_observed` per bin.
    pub pulls: Vec<f64>,
    /// Edges of the pull distribution.
    pub distribution_edges: Vec<f64>,
    /// Entries per pull bin.
    pub distribution_counts: Vec<f64>,
    /// Gaussian matched to the pulls inside the distribution range.
    pub gaussian: GaussianSummary,
}

/// Moment-matched Gaussian over the pull range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianSummary {
    pub mean: f64,
    pub sigma: f64,
    /// Peak height in entries per pull bin.
    pub amplitude: f64,
}

impl GaussianSummary {
    /// Density at `x`, in entries per pull bin.
    pub fn eval(&self, x: f64) -> f64 {
        if self.sigma <= 0.0 {
            return 0.0;
        }
        let z = (x - self.mean) / self.sigma;
        self.amplitude * (-0.5 * z * z).exp()
    }
}

fn gaussian(values: &[f64], bin_width: f64) -> GaussianSummary {
    let inside: Vec<f64> =
        values.iter().copied().filter(|v| *v >= PULL_RANGE.0 && *v < PULL_RANGE.1).collect();
    let n = inside.len() as f64;
    if inside.len() < 2 {
        return GaussianSummary { mean: inside.first().copied().unwrap_or(0.0), sigma: 0.0, amplitude: n };
    }
    let mean = inside.iter().sum::<f64>() / n;
    let var = inside.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let sigma = var.sqrt();
    let amplitude = if sigma > 0.0 {
        n * bin_width / (sigma * (2.0 * std::f64::consts::PI).sqrt())
    } else {
        n
    };
    GaussianSummary { mean, sigma, amplitude }
}

/// Pulls of `observed` against `predicted`.
pub fn pulls_artifact(
    observable: &str,
    plot_type: &str,
    observed: &Histogram,
    predicted: &Histogram,
) -> Result<PullsArtifact> {
    let per_bin = pulls(observed, predicted)?;
    let dist = pull_distribution(&per_bin)?;

    Ok(PullsArtifact {
        schema_version: PULLS_SCHEMA.to_string(),
        meta: ArtifactMeta::new(observable, plot_type)?,
        x_label: "Average pruned mass [GeV]".to_string(),
        bin_edges: per_bin.edges().to_vec(),
        pulls: per_bin.contents().to_vec(),
        gaussian: gaussian(per_bin.contents(), dist.width(0)),
        distribution_edges: dist.edges().to_vec(),
        distribution_counts: dist.contents().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gaussian_moments() {
        let g = gaussian(&[-1.0, 0.0, 1.0, 10.0], 6.0 / 14.0);
        assert_relative_eq!(g.mean, 0.0);
        assert_relative_eq!(g.sigma, 1.0);
        assert_relative_eq!(g.eval(0.0), g.amplitude);
        assert!(g.eval(1.0) < g.amplitude);
    }

    #[test]
    fn degenerate_gaussian() {
        let g = gaussian(&[0.5], 0.5);
        assert_eq!(g.sigma, 0.0);
        assert_eq!(g.eval(0.5), 0.0);
    }
}
