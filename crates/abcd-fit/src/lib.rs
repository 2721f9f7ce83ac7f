//! # abcd-fit
//!
//! Ratio-fit ABCD background estimation.
//!
//! This crate provides:
//! - A weighted polynomial fit of the C/D ratio with a confidence band
//! - Extrapolation of region B into the signal region A
//! - Scaled aggregation of background samples
//! - Comparison diagnostics (ratios, pulls, chi-square, classic ABCD)
//!
//! ## Example
//!
//! ```
//! use abcd_core::{Histogram, Rebin};
//! use abcd_fit::{ControlRegions, RatioFitConfig, estimate};
//!
//! let edges = vec![35.0, 85.0, 135.0, 185.0];
//! let b = Histogram::from_counts("B", edges.clone(), vec![10.0, 20.0, 30.0]).unwrap();
//! let c = Histogram::from_counts("C", edges.clone(), vec![4.0, 8.0, 8.0]).unwrap();
//! let d = Histogram::from_counts("D", edges, vec![5.0, 10.0, 10.0]).unwrap();
//!
//! let config = RatioFitConfig::default().with_degree(0);
//! let est = estimate(ControlRegions::new(&b, &c, &d), &config, &Rebin::Factor(1)).unwrap();
//! assert!((est.fit.eval(110.0) - 0.8).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Sample aggregation.
pub mod aggregate;
/// Named presentation binnings.
pub mod binning;
/// Ratios, pulls, chi-square and the classic product ABCD.
pub mod diagnostics;
/// Prediction of region A from B and the fitted ratio.
pub mod extrapolate;
/// Generic numerical optimizer (L-BFGS backend).
pub mod optimizer;
/// Power-basis polynomials and standardization.
pub mod polynomial;
/// Weighted polynomial fit of a ratio histogram.
pub mod ratio_fit;

pub use aggregate::{SampleInput, aggregate, aggregate_region};
pub use binning::BinningMode;
pub use diagnostics::{CHI2_BINS, RatioDiagnostics, classic_abcd, ratio_diagnostics};
pub use extrapolate::{
    COMBINED_REBIN_FACTOR, CombinedEstimate, ControlRegions, Estimate, FALLBACK_ERROR, Prediction,
    SINGLE_REBIN_FACTOR, estimate, estimate_combined, predict, propagate_error,
};
pub use optimizer::{LbfgsOptimizer, Minimum, Objective, OptimizerConfig};
pub use ratio_fit::{BinModel, IntervalMethod, RatioFit, RatioFitConfig, fit_ratio};
