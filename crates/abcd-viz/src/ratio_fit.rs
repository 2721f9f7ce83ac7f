//! C/D ratio points with their polynomial fits (numbers-first).

use abcd_core::{Histogram, Result, SampleKind};
use abcd_fit::{CombinedEstimate, RatioFit};
use serde::{Deserialize, Serialize};

use crate::meta::ArtifactMeta;

/// Schema tag of [`RatioFitArtifact`].
pub const RATIO_FIT_SCHEMA: &str = "abcd_ratio_fit_v0";

/// Points per fitted curve.
pub const CURVE_POINTS: usize = 200;

/// Ratio points and fitted curves on a shared x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioFitArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Displayed x range.
    pub x_range: [f64; 2],
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Ratio histograms as points.
    pub points: Vec<RatioPointsSeries>,
    /// Fitted curves.
    pub curves: Vec<FitCurveSeries>,
}

/// One ratio histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPointsSeries {
    /// Legend label.
    pub label: String,
    /// Data or simulation.
    pub kind: SampleKind,
    /// Bin edges.
    pub bin_edges: Vec<f64>,
    /// Ratio per bin.
    pub y: Vec<f64>,
    /// Ratio error per bin.
    pub yerr: Vec<f64>,
}

/// One fitted curve sampled over its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCurveSeries {
    /// Legend label.
    pub label: String,
    /// Data or simulation fit.
    pub kind: SampleKind,
    /// Fit window.
    pub window: [f64; 2],
    /// Sample positions.
    pub x: Vec<f64>,
    /// Fitted value.
    pub y: Vec<f64>,
    /// Lower confidence band; present when the band is drawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_lo: Option<Vec<f64>>,
    /// Upper confidence band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_hi: Option<Vec<f64>>,
    /// Raw power-basis coefficients.
    pub parameters: Vec<f64>,
    /// Coefficient uncertainties.
    pub uncertainties: Vec<f64>,
    /// Chi-square at the minimum.
    pub chi2: f64,
    /// Degrees of freedom.
    pub ndf: usize,
    /// Whether the fit converged.
    pub converged: bool,
}

/// A ratio histogram with its fit.
#[derive(Debug, Clone, Copy)]
pub struct RatioFitInput<'a> {
    /// Legend label of the points.
    pub label: &'a str,
    /// Legend label of the curve.
    pub fit_label: &'a str,
    /// Data or simulation.
    pub kind: SampleKind,
    /// Fitted ratio histogram.
    pub ratio: &'a Histogram,
    /// The fit.
    pub fit: &'a RatioFit,
    /// Draw the confidence band.
    pub show_band: bool,
}

/// Background and data inputs of a combined estimate, background first.
pub fn combined_inputs(estimate: &CombinedEstimate) -> [RatioFitInput<'_>; 2] {
    [
        RatioFitInput {
            label: "All MC Bkgs",
            fit_label: "Fit to MC",
            kind: SampleKind::Simulated,
            ratio: &estimate.background_ratio,
            fit: &estimate.background_fit,
            show_band: false,
        },
        RatioFitInput {
            label: "Data",
            fit_label: "Fit to data",
            kind: SampleKind::Data,
            ratio: &estimate.data_ratio,
            fit: &estimate.data_fit,
            show_band: true,
        },
    ]
}

fn curve(input: &RatioFitInput<'_>) -> FitCurveSeries {
    let (lo, hi) = input.fit.window();
    let samples = input.fit.sample(lo, hi, CURVE_POINTS);
    let summary = input.fit.fit_result();

    let (band_lo, band_hi) = if input.show_band {
        (
            Some(samples.iter().map(|&(_, f, ci)| f - ci).collect()),
            Some(samples.iter().map(|&(_, f, ci)| f + ci).collect()),
        )
    } else {
        (None, None)
    };

    FitCurveSeries {
        label: input.fit_label.to_string(),
        kind: input.kind,
        window: [lo, hi],
        x: samples.iter().map(|s| s.0).collect(),
        y: samples.iter().map(|s| s.1).collect(),
        band_lo,
        band_hi,
        parameters: summary.parameters,
        uncertainties: summary.uncertainties,
        chi2: summary.chi2,
        ndf: summary.ndf,
        converged: summary.converged,
    }
}

/// Build the ratio-fit artifact. The x range spans all fit windows.
pub fn ratio_fit_artifact(
    observable: &str,
    plot_type: &str,
    inputs: &[RatioFitInput<'_>],
) -> Result<RatioFitArtifact> {
    if inputs.is_empty() {
        return Err(abcd_core::Error::Validation("ratio-fit artifact needs at least one fit".into()));
    }

    let x_range = inputs.iter().fold([f64::INFINITY, f64::NEG_INFINITY], |acc, i| {
        let (lo, hi) = i.fit.window();
        [acc[0].min(lo), acc[1].max(hi)]
    });

    Ok(RatioFitArtifact {
        schema_version: RATIO_FIT_SCHEMA.to_string(),
        meta: ArtifactMeta::new(observable, plot_type)?,
        x_range,
        x_label: "Average pruned mass [GeV]".to_string(),
        y_label: "Ratio C/D".to_string(),
        points: inputs
            .iter()
            .map(|i| RatioPointsSeries {
                label: i.label.to_string(),
                kind: i.kind,
                bin_edges: i.ratio.edges().to_vec(),
                y: i.ratio.contents().to_vec(),
                yerr: i.ratio.errors().to_vec(),
            })
            .collect(),
        curves: inputs.iter().map(curve).collect(),
    })
}
