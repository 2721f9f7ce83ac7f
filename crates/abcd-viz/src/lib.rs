//! # abcd-viz
//!
//! Plot artifacts for ABCD background estimation.
//!
//! Every artifact is a plain serializable struct holding the numbers a plot
//! needs (arrays instead of nested objects). Rendering lives in
//! `abcd-viz-render`; artifacts can be written next to the images and
//! re-rendered later.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Observed vs predicted comparison with a ratio panel.
pub mod closure;
/// Shared artifact metadata.
pub mod meta;
/// Pulls per bin and their distribution.
pub mod pulls;
/// C/D ratio points and fitted curves.
pub mod ratio_fit;

pub use closure::{BandEnvelope, ClosureArtifact, ClosureOptions, HistogramSeries, closure_artifact};
pub use meta::ArtifactMeta;
pub use pulls::{GaussianSummary, PullsArtifact, pulls_artifact};
pub use ratio_fit::{
    FitCurveSeries, RatioFitArtifact, RatioFitInput, RatioPointsSeries, combined_inputs,
    ratio_fit_artifact,
};
