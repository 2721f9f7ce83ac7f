//! Analysis config v0 (YAML) parsing + semantic validation.
//!
//! Every field has a default reproducing the boosted dijet analysis, so an
//! empty file (or no file at all) is a valid config.

use std::collections::HashSet;
use std::path::Path;

use abcd_core::Sample;
use abcd_fit::{BinModel, CHI2_BINS, COMBINED_REBIN_FACTOR, IntervalMethod, RatioFitConfig, SINGLE_REBIN_FACTOR};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ANALYSIS_V0: &str = "abcd_analysis_v0";

pub const DEFAULT_OBSERVABLE: &str = "massAve_prunedMassAsymVsdeltaEtaDijet";
pub const DEFAULT_FILE_PREFIX: &str = "RUNMiniBoostedAnalysis";

/// Scale applied to the QCD sample: 0.80 for the Pt-binned samples, 1.05 otherwise.
pub fn qcd_scale_factor(qcd: &str) -> f64 {
    if qcd.contains("Pt") { 0.80 } else { 1.05 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub schema_version: String,
    pub observable: String,
    pub file_prefix: String,
    pub samples: Vec<SampleSpec>,
    pub signal: SignalSpec,
    pub fit: FitSpec,
    pub diagnostics: DiagnosticsSpec,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema_version: ANALYSIS_V0.to_string(),
            observable: DEFAULT_OBSERVABLE.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            samples: default_samples(),
            signal: SignalSpec::default(),
            fit: FitSpec::default(),
            diagnostics: DiagnosticsSpec::default(),
        }
    }
}

/// One background sample.
///
/// `{qcd}` in the name is replaced by the `--qcd` flag. Without a `scale`, QCD
/// samples get [`qcd_scale_factor`] and everything else 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl SampleSpec {
    fn new(name: &str, label: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            scale: None,
            color: Some(color.to_string()),
        }
    }

    pub fn resolve(&self, qcd: &str) -> Sample {
        let name = self.name.replace("{qcd}", qcd);
        let scale = self
            .scale
            .unwrap_or_else(|| if name.starts_with("QCD") { qcd_scale_factor(qcd) } else { 1.0 });
        let mut sample = Sample::simulated(name, scale);
        if let Some(label) = &self.label {
            sample = sample.with_label(label);
        }
        if let Some(color) = &self.color {
            sample = sample.with_color(color);
        }
        sample
    }
}

fn default_samples() -> Vec<SampleSpec> {
    vec![
        SampleSpec::new("TTJets", "t t\u{0304} + Jets", "#00cc00"),
        SampleSpec::new("ZJetsToQQ", "Z + Jets", "#ffcc00"),
        SampleSpec::new("WJetsToQQ", "W + Jets", "#ff00ff"),
        SampleSpec::new("WWTo4Q", "WW (had)", "#990099"),
        SampleSpec::new("ZZTo4Q", "ZZ (had)", "#cc9900"),
        SampleSpec::new("WZ", "WZ", "#00ffff"),
        SampleSpec::new("QCD{qcd}All", "QCD", "#3366ff"),
    ]
}

/// The signal sample, `{decay}` and `{mass}` filled from the flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalSpec {
    pub name: String,
    pub label: String,
}

impl Default for SignalSpec {
    fn default() -> Self {
        Self {
            name: "RPVStopStopToJets_{decay}_M-{mass}".to_string(),
            label: "{decay} RPV stop {mass} GeV".to_string(),
        }
    }
}

impl SignalSpec {
    pub fn resolve(&self, decay: &str, mass: u32) -> Sample {
        let fill = |s: &str| s.replace("{decay}", decay).replace("{mass}", &mass.to_string());
        Sample::simulated(fill(&self.name), 1.0).with_label(fill(&self.label))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitSpec {
    pub degree: usize,
    pub window: [f64; 2],
    /// Minimizations of the background (or single-sample) fit.
    pub passes: usize,
    /// Minimizations of the data fit seeded by the background fit.
    pub data_passes: usize,
    pub single_rebin: usize,
    pub combined_rebin: usize,
    pub confidence_level: f64,
    pub bin_model: BinModel,
    pub interval: IntervalMethod,
}

impl Default for FitSpec {
    fn default() -> Self {
        Self {
            degree: 3,
            window: [50.0, 350.0],
            passes: 3,
            data_passes: 1,
            single_rebin: SINGLE_REBIN_FACTOR,
            combined_rebin: COMBINED_REBIN_FACTOR,
            confidence_level: 0.683,
            bin_model: BinModel::Integral,
            interval: IntervalMethod::ChiSquare,
        }
    }
}

impl FitSpec {
    pub fn ratio_fit_config(&self) -> RatioFitConfig {
        RatioFitConfig {
            degree: self.degree,
            window: (self.window[0], self.window[1]),
            passes: self.passes,
            confidence_level: self.confidence_level,
            bin_model: self.bin_model,
            interval: self.interval,
            ..RatioFitConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsSpec {
    pub chi2_bins: usize,
    /// Merge factor of the presentation histograms in `simple` binning.
    pub simple_factor: usize,
    /// Relative systematic drawn around the predictions (`1.1` is ±10 %).
    pub systematic: Option<f64>,
}

impl Default for DiagnosticsSpec {
    fn default() -> Self {
        Self { chi2_bins: CHI2_BINS, simple_factor: abcd_fit::binning::DEFAULT_SIMPLE_FACTOR, systematic: None }
    }
}

impl AnalysisConfig {
    /// Read a YAML config, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading analysis config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing analysis config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: AnalysisConfig =
            if text.trim().is_empty() { Self::default() } else { serde_yaml_ng::from_str(text)? };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != ANALYSIS_V0 {
            anyhow::bail!(
                "unsupported schema_version '{}' (expected {})",
                self.schema_version,
                ANALYSIS_V0
            );
        }
        if self.observable.trim().is_empty() {
            anyhow::bail!("observable must be non-empty");
        }
        if self.samples.is_empty() {
            anyhow::bail!("samples must be non-empty");
        }
        let mut seen = HashSet::new();
        for s in &self.samples {
            if !seen.insert(s.name.as_str()) {
                anyhow::bail!("duplicate sample name: {}", s.name);
            }
            if let Some(scale) = s.scale
                && !(scale.is_finite() && scale > 0.0)
            {
                anyhow::bail!("sample '{}' scale must be finite and > 0, got {}", s.name, scale);
            }
        }

        let fit = &self.fit;
        let [lo, hi] = fit.window;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            anyhow::bail!("fit.window must be increasing, got [{}, {}]", lo, hi);
        }
        if fit.passes == 0 || fit.data_passes == 0 {
            anyhow::bail!("fit.passes and fit.data_passes must be >= 1");
        }
        if fit.single_rebin == 0 || fit.combined_rebin == 0 || self.diagnostics.simple_factor == 0 {
            anyhow::bail!("rebin factors must be >= 1");
        }
        if !(fit.confidence_level > 0.0 && fit.confidence_level < 1.0) {
            anyhow::bail!("fit.confidence_level must be in (0, 1), got {}", fit.confidence_level);
        }
        if let Some(unc) = self.diagnostics.systematic
            && !(unc.is_finite() && unc > 0.0)
        {
            anyhow::bail!("diagnostics.systematic must be finite and > 0, got {}", unc);
        }
        Ok(())
    }

    /// Background samples with names and scales resolved for `qcd`.
    pub fn background_samples(&self, qcd: &str) -> Vec<Sample> {
        self.samples.iter().map(|s| s.resolve(qcd)).collect()
    }
}
