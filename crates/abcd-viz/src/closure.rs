//! Observed vs predicted comparison artifact (numbers-first).
//!
//! The main panel overlays the two histograms; the ratio panel shows
//! `observed / predicted` with asymmetric errors, plus the chi-square of the
//! comparison.

use abcd_core::{Histogram, Result, SampleHistogram, SampleKind};
use abcd_fit::BinningMode;
use abcd_fit::diagnostics::{CHI2_BINS, ratio_diagnostics, systematic_band};
use serde::{Deserialize, Serialize};

use crate::meta::ArtifactMeta;

/// Schema tag of [`ClosureArtifact`].
pub const CLOSURE_SCHEMA: &str = "abcd_closure_v0";

/// Full artifact for one comparison plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Shared bin edges of both series.
    pub bin_edges: Vec<f64>,
    /// Observed histogram (data or simulated signal region).
    pub observed: HistogramSeries,
    /// ABCD prediction.
    pub predicted: HistogramSeries,
    /// Systematic envelope around the prediction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_band: Option<BandEnvelope>,
    /// Ratio panel title, e.g. `DATA/ABCD Pred`.
    pub ratio_label: String,
    /// `observed / predicted` per bin (0 where predicted is 0).
    pub ratio_y: Vec<f64>,
    /// Lower asymmetric ratio error.
    pub ratio_yerr_lo: Vec<f64>,
    /// Upper asymmetric ratio error.
    pub ratio_yerr_hi: Vec<f64>,
    /// Comparison chi-square.
    pub chi2: f64,
    /// Degrees of freedom of [`chi2`](Self::chi2).
    pub ndf: usize,
    /// Sum of observed contents.
    pub observed_integral: f64,
    /// Sum of predicted contents.
    pub predicted_integral: f64,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// Displayed x range.
    pub x_range: [f64; 2],
    /// Displayed y range of the main panel.
    pub y_range: [f64; 2],
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Status text drawn after the experiment label.
    pub status: String,
}

/// One histogram as arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    /// Legend label.
    pub label: String,
    /// Data points or simulated line.
    pub kind: SampleKind,
    /// Bin contents.
    pub y: Vec<f64>,
    /// Bin errors.
    pub yerr: Vec<f64>,
}

impl HistogramSeries {
    fn from_sample(sample: &SampleHistogram) -> Self {
        Self {
            label: sample.label.clone(),
            kind: sample.kind,
            y: sample.histogram.contents().to_vec(),
            yerr: sample.histogram.errors().to_vec(),
        }
    }
}

/// Lower and upper edges of a band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEnvelope {
    /// Lower edge per bin.
    pub lo: Vec<f64>,
    /// Upper edge per bin.
    pub hi: Vec<f64>,
}

/// Display choices for [`closure_artifact`].
#[derive(Debug, Clone)]
pub struct ClosureOptions {
    /// Observable name.
    pub observable: String,
    /// Plot type (`Log_altBCD`, `Bkg_Log_altBCD`, ...).
    pub plot_type: String,
    /// Ratio panel title.
    pub ratio_label: String,
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// Displayed x range.
    pub x_range: [f64; 2],
    /// Displayed y range.
    pub y_range: [f64; 2],
    /// Leading bins entering the chi-square.
    pub chi2_bins: usize,
    /// Relative systematic on the prediction (`1.1` is ±10 %).
    pub systematic: Option<f64>,
}

impl ClosureOptions {
    /// Defaults for a low-mass log-scale comparison over `[50, 350]`.
    pub fn new(
        observable: impl Into<String>,
        plot_type: impl Into<String>,
        ratio_label: impl Into<String>,
    ) -> Self {
        Self {
            observable: observable.into(),
            plot_type: plot_type.into(),
            ratio_label: ratio_label.into(),
            x_label: "Average pruned mass [GeV]".to_string(),
            y_label: "Events".to_string(),
            log_y: true,
            x_range: [50.0, 350.0],
            y_range: default_y_range(true, true),
            chi2_bins: CHI2_BINS,
            systematic: None,
        }
    }

    /// Switch between log and linear y, resetting the y range.
    pub fn with_log_y(mut self, log_y: bool, low_mass: bool) -> Self {
        self.log_y = log_y;
        self.y_range = default_y_range(log_y, low_mass);
        self
    }

    /// Y-axis title for `binning`; `bin_width` is used for simple binning.
    pub fn with_binning(mut self, binning: BinningMode, bin_width: f64) -> Self {
        self.y_label = events_label(binning, bin_width);
        self
    }
}

/// Main-panel y range: the low-mass selection has more events.
pub fn default_y_range(log_y: bool, low_mass: bool) -> [f64; 2] {
    match (log_y, low_mass) {
        (true, true) => [0.5, 5000.0],
        (true, false) => [0.5, 500.0],
        (false, true) => [0.0, 3000.0],
        (false, false) => [0.0, 400.0],
    }
}

/// `Events / 25 GeV` or `Events / σ(mass)`.
pub fn events_label(binning: BinningMode, bin_width: f64) -> String {
    match binning {
        BinningMode::Simple => format!("Events / {} GeV", bin_width),
        BinningMode::Reso | BinningMode::Ratio => "Events / σ(mass)".to_string(),
    }
}

fn status_for(kinds: [SampleKind; 2]) -> &'static str {
    if kinds.contains(&SampleKind::Data) { "Preliminary" } else { "Simulation Preliminary" }
}

fn band(h: &Histogram, unc: f64) -> Result<BandEnvelope> {
    let sys = systematic_band(h, unc)?;
    Ok(BandEnvelope {
        lo: sys.contents().iter().zip(sys.errors()).map(|(c, e)| c - e).collect(),
        hi: sys.contents().iter().zip(sys.errors()).map(|(c, e)| c + e).collect(),
    })
}

/// Build the comparison of `observed` against `predicted`.
pub fn closure_artifact(
    observed: &SampleHistogram,
    predicted: &SampleHistogram,
    options: &ClosureOptions,
) -> Result<ClosureArtifact> {
    let diag = ratio_diagnostics(&observed.histogram, &predicted.histogram, options.chi2_bins)?;
    let predicted_band = options.systematic.map(|unc| band(&predicted.histogram, unc)).transpose()?;

    Ok(ClosureArtifact {
        schema_version: CLOSURE_SCHEMA.to_string(),
        meta: ArtifactMeta::new(&options.observable, &options.plot_type)?,
        bin_edges: observed.histogram.edges().to_vec(),
        observed: HistogramSeries::from_sample(observed),
        predicted: HistogramSeries::from_sample(predicted),
        predicted_band,
        ratio_label: options.ratio_label.clone(),
        ratio_y: diag.full.contents().to_vec(),
        ratio_yerr_lo: diag.asym_down,
        ratio_yerr_hi: diag.asym_up,
        chi2: diag.chi2,
        ndf: diag.ndf,
        observed_integral: observed.histogram.integral(),
        predicted_integral: predicted.histogram.integral(),
        log_y: options.log_y,
        x_range: options.x_range,
        y_range: options.y_range,
        x_label: options.x_label.clone(),
        y_label: options.y_label.clone(),
        status: status_for([observed.kind, predicted.kind]).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_ranges() {
        assert_eq!(default_y_range(true, false), [0.5, 500.0]);
        assert_eq!(default_y_range(false, true), [0.0, 3000.0]);
    }

    #[test]
    fn labels() {
        assert_eq!(events_label(BinningMode::Simple, 25.0), "Events / 25 GeV");
        assert_eq!(events_label(BinningMode::Reso, 25.0), "Events / σ(mass)");
        assert_eq!(status_for([SampleKind::Simulated, SampleKind::Simulated]), "Simulation Preliminary");
        assert_eq!(status_for([SampleKind::Simulated, SampleKind::Data]), "Preliminary");
    }
}
