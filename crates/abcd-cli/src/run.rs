//! `abcd estimate` and `abcd closure`.

use std::path::{Path, PathBuf};

use abcd_core::{Histogram, HistogramFile, Rebin, RegionHistograms, Sample, SampleHistogram, SampleKind};
use abcd_fit::diagnostics::{classic_abcd, with_zero_bin_error};
use abcd_fit::{
    BinningMode, ControlRegions, FALLBACK_ERROR, RatioFit, SampleInput, aggregate, estimate,
    estimate_combined, predict,
};
use abcd_viz::{ClosureOptions, RatioFitInput, closure_artifact, combined_inputs, pulls_artifact, ratio_fit_artifact};
use abcd_viz_render::config::VizConfig;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Value, json};

use crate::config::AnalysisConfig;
use crate::naming::{RunNaming, histogram_name};
use crate::output::{PlotWriter, load_viz_config, write_json};
use crate::sources::{HistogramSource, InputFormat, load_regions};

/// Flags shared by `estimate` and `closure`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Signal decay mode, e.g. UDD312, UDD323
    #[arg(long, default_value = "UDD312")]
    pub decay: String,

    /// Presentation binning: simple, reso or ratio
    #[arg(long, default_value = "simple")]
    pub binning: BinningMode,

    /// Input/output version tag, e.g. v05
    #[arg(long = "version", default_value = "v05")]
    pub analysis_version: String,

    /// Grooming algorithm, e.g. pruned
    #[arg(long, default_value = "pruned")]
    pub grooming: String,

    /// Stop mass [GeV]
    #[arg(long, default_value_t = 100)]
    pub mass: u32,

    /// QCD sample binning, e.g. Pt, HT
    #[arg(long, default_value = "Pt")]
    pub qcd: String,

    /// Integrated luminosity [fb^-1]
    #[arg(long, default_value_t = 2.6)]
    pub lumi: f64,

    /// Trigger range, e.g. low, high
    #[arg(long, default_value = "low")]
    pub range: String,

    /// Image format (svg; png with the `png` feature)
    #[arg(long, default_value = "svg")]
    pub ext: String,

    /// Directory holding the input files
    #[arg(long, default_value = ".")]
    pub input_dir: PathBuf,

    /// Directory receiving plots, artifacts and the prediction file
    #[arg(long, default_value = "Plots")]
    pub output_dir: PathBuf,

    /// Histogram observable (overrides the analysis config)
    #[arg(long)]
    pub observable: Option<String>,

    /// Analysis config (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Plot config (YAML) merged over the theme
    #[arg(long)]
    pub viz_config: Option<PathBuf>,

    /// Plot theme: cms or minimal
    #[arg(long, default_value = "cms")]
    pub theme: String,

    /// Input file format
    #[arg(long, value_enum, default_value = "root")]
    pub input_format: InputFormat,

    /// Write the JSON summary here instead of stdout
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

struct RunContext {
    args: RunArgs,
    config: AnalysisConfig,
    observable: String,
    naming: RunNaming,
    viz: VizConfig,
}

impl RunContext {
    fn new(args: RunArgs) -> Result<Self> {
        let config = AnalysisConfig::load(args.config.as_deref())?;
        let observable = args.observable.clone().unwrap_or_else(|| config.observable.clone());
        let naming = RunNaming {
            prefix: config.file_prefix.clone(),
            grooming: args.grooming.clone(),
            range: args.range.clone(),
            version: args.analysis_version.clone(),
            qcd: args.qcd.clone(),
            binning: args.binning,
        };
        let viz = load_viz_config(&args.theme, args.viz_config.as_deref(), Some(args.lumi))?;
        std::fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("creating {}", args.output_dir.display()))?;
        tracing::info!(observable = %observable, binning = %args.binning, "run configured");
        Ok(Self { args, config, observable, naming, viz })
    }

    fn input_path(&self, sample: &str) -> PathBuf {
        self.args.input_dir.join(self.naming.input_file(sample, self.args.input_format.extension()))
    }

    fn load(&self, sample: &str) -> Result<RegionHistograms> {
        let source = HistogramSource::open(&self.input_path(sample), self.args.input_format)?;
        load_regions(&source, &self.observable, sample)
    }

    fn load_backgrounds(&self) -> Result<Vec<(Sample, RegionHistograms)>> {
        self.config
            .background_samples(&self.args.qcd)
            .into_iter()
            .map(|s| {
                let regions = self.load(&s.name)?;
                Ok((s, regions))
            })
            .collect()
    }

    fn writer(&self) -> PlotWriter<'_> {
        PlotWriter {
            out_dir: &self.args.output_dir,
            ext: &self.args.ext,
            naming: &self.naming,
            observable: &self.observable,
            viz: &self.viz,
        }
    }

    fn present(&self, h: &Histogram) -> Result<Histogram> {
        Ok(h.rebinned(&self.args.binning.rebin(self.config.diagnostics.simple_factor))?)
    }

    /// `b` at the presentation binning extrapolated with `fit`, so the
    /// fallback error lands only on presented bins that are empty.
    fn present_prediction(&self, b: &Histogram, fit: &RatioFit) -> Result<Histogram> {
        Ok(predict(&self.present(b)?, fit)?.histogram)
    }

    fn write_closure(
        &self,
        plot_type: &str,
        observed: SampleHistogram,
        predicted: SampleHistogram,
        ratio_label: &str,
    ) -> Result<Value> {
        let bin_width = observed.histogram.widths().first().copied().unwrap_or_default();
        let mut options = ClosureOptions::new(&self.observable, plot_type, ratio_label)
            .with_log_y(true, self.naming.is_low_mass())
            .with_binning(self.args.binning, bin_width.round());
        options.chi2_bins = self.config.diagnostics.chi2_bins;
        options.systematic = self.config.diagnostics.systematic;

        let artifact = closure_artifact(&observed, &predicted, &options)
            .with_context(|| format!("comparison {}", plot_type))?;
        let path = self.writer().write("closure", plot_type, &artifact)?;
        tracing::info!(plot_type, chi2 = artifact.chi2, ndf = artifact.ndf, "comparison done");

        Ok(json!({
            "plot_type": plot_type,
            "chi2": artifact.chi2,
            "ndf": artifact.ndf,
            "observed_yield": artifact.observed_integral,
            "predicted_yield": artifact.predicted_integral,
            "plot": path,
        }))
    }

    fn write_pulls(&self, plot_type: &str, observed: &Histogram, predicted: &Histogram) -> Result<PathBuf> {
        let artifact = pulls_artifact(&self.observable, plot_type, observed, predicted)?;
        self.writer().write("pulls", plot_type, &artifact)
    }

    fn emit_summary(&self, summary: &Value) -> Result<()> {
        write_json(self.args.summary.as_deref(), summary)
    }
}

fn fit_summary(fit: &RatioFit) -> Value {
    let r = fit.fit_result();
    let (lo, hi) = fit.window();
    json!({
        "degree": fit.degree(),
        "window": [lo, hi],
        "parameters": r.parameters,
        "uncertainties": r.uncertainties,
        "chi2": r.chi2,
        "ndf": r.ndf,
        "converged": r.converged,
    })
}

/// Combined data + background estimate with all comparison plots.
pub fn cmd_estimate(args: RunArgs) -> Result<()> {
    let ctx = RunContext::new(args)?;
    let data = ctx.load("DATA")?;
    let backgrounds = ctx.load_backgrounds()?;
    let inputs: Vec<SampleInput<'_>> = backgrounds.iter().map(|(s, r)| SampleInput::new(s, r)).collect();
    let background = aggregate(&inputs).context("aggregating background samples")?;

    let fit_config = ctx.config.fit.ratio_fit_config();
    let combined = estimate_combined(
        ControlRegions::from_regions(&data),
        ControlRegions::from_regions(&background),
        &fit_config,
        ctx.config.fit.data_passes,
        &Rebin::Factor(ctx.config.fit.combined_rebin),
    )
    .context("combined data + background estimate")?;
    let mc = estimate(
        ControlRegions::from_regions(&background),
        &fit_config,
        &Rebin::Factor(ctx.config.fit.single_rebin),
    )
    .context("background-only estimate")?;

    let mut plots = Vec::new();
    let mut comparisons = Vec::new();

    let data_pred = ctx.present_prediction(&data.b, &combined.data_fit)?;
    let hybrid_pred = ctx.present_prediction(&background.b, &combined.data_fit)?;
    let mc_pred = ctx.present_prediction(&background.b, &mc.fit)?;

    if let Some(a) = &data.a {
        comparisons.push(ctx.write_closure(
            "Log_altBCD",
            SampleHistogram::data("DATA", ctx.present(a)?),
            SampleHistogram::data("DATA ABCD Pred.", data_pred.clone()),
            "DATA/ABCD Pred",
        )?);
    } else {
        tracing::warn!("data has no signal region histogram, skipping the data comparison");
    }

    // Stored projection from the input file, empty bins at the fallback error.
    let data_projection = match &data.projection {
        Some(p) => Some(with_zero_bin_error(&ctx.present(p)?, FALLBACK_ERROR)?),
        None => None,
    };
    if let (Some(a), Some(proj)) = (&data.a, &data_projection) {
        comparisons.push(ctx.write_closure(
            "Log",
            SampleHistogram::data("DATA", ctx.present(a)?),
            SampleHistogram::data("DATA ABCD Proj.", proj.clone()),
            "DATA/ABCD Proj",
        )?);
    }

    comparisons.push(ctx.write_closure(
        "DATA_Bkg_Log_altBCD",
        SampleHistogram::data("DATA ABCD Pred", data_pred.clone()),
        SampleHistogram::simulated("Hybrid MC ABCD Pred.", hybrid_pred.clone()),
        "ABCD Pred (DATA/MC)",
    )?);

    if let Some(a) = &background.a {
        let mc_sr = ctx.present(a)?;
        comparisons.push(ctx.write_closure(
            "BkgSR_DATAAltBCD_Log",
            SampleHistogram::simulated("All MC Bkgs SR", mc_sr.clone()),
            SampleHistogram::data("DATA ABCD Pred", data_pred.clone()),
            "(MC SR)/(DATA Pred)",
        )?);
        comparisons.push(ctx.write_closure(
            "HybridBkg_Log_altBCD",
            SampleHistogram::simulated("MC SR", mc_sr.clone()),
            SampleHistogram::simulated("Hybrid MC ABCD Pred.", hybrid_pred),
            "MC SR/ABCD Pred",
        )?);
        comparisons.push(ctx.write_closure(
            "Bkg_Log_altBCD",
            SampleHistogram::simulated("MC SR", mc_sr.clone()),
            SampleHistogram::simulated("MC ABCD Pred.", mc_pred.clone()),
            "MC SR/ABCD Pred",
        )?);
        plots.push(ctx.write_pulls("Pulls_Bkg", &mc_sr, &mc_pred)?);
    } else {
        tracing::warn!("a background sample lacks the signal region, skipping the MC comparisons");
    }

    let combined_fit = ratio_fit_artifact(&ctx.observable, "combined", &combined_inputs(&combined))?;
    plots.push(ctx.writer().write("ratio_fit", "combined_CD", &combined_fit)?);
    let mc_input = RatioFitInput {
        label: "All MC Bkgs",
        fit_label: "Fit to MC",
        kind: SampleKind::Simulated,
        ratio: &mc.ratio,
        fit: &mc.fit,
        show_band: true,
    };
    let mc_fit = ratio_fit_artifact(&ctx.observable, "Bkg", &[mc_input])?;
    plots.push(ctx.writer().write("ratio_fit", "Bkg_CD", &mc_fit)?);

    let prediction_path = ctx.args.output_dir.join(ctx.naming.prediction_file(&ctx.observable));
    write_prediction_file(&prediction_path, &ctx.observable, &combined.data, &combined.hybrid.histogram, &data.b)?;

    let signal = signal_yield(&ctx)?;
    let classic = classic_abcd(&data.b, &data.c, &data.d).context("product-form data estimate")?;

    ctx.emit_summary(&json!({
        "observable": ctx.observable,
        "binning": ctx.args.binning.to_string(),
        "samples": backgrounds.iter().map(|(s, _)| json!({"name": s.name, "scale": s.scale})).collect::<Vec<_>>(),
        "fits": {
            "background": fit_summary(&combined.background_fit),
            "data": fit_summary(&combined.data_fit),
            "mc": fit_summary(&mc.fit),
        },
        "yields": {
            "data_prediction": combined.data.yield_total(),
            "hybrid_prediction": combined.hybrid.yield_total(),
            "mc_prediction": mc.prediction.yield_total(),
            "data_classic": classic.integral(),
            "data_projection": data_projection.as_ref().map(Histogram::integral),
            "data_observed": data.a.as_ref().map(Histogram::integral),
            "background_observed": background.a.as_ref().map(Histogram::integral),
            "signal": signal,
        },
        "comparisons": comparisons,
        "plots": plots,
        "prediction_file": prediction_path,
    }))
}

fn write_prediction_file(
    path: &Path,
    observable: &str,
    data: &abcd_fit::Prediction,
    hybrid: &Histogram,
    data_b: &Histogram,
) -> Result<()> {
    let mut file = HistogramFile::new();
    file.insert_as(histogram_name(observable, "DATA", "ABCDProj"), &data.histogram);
    file.insert_as(histogram_name(observable, "DATA", "RatioBD"), &data.factors);
    file.insert_as(histogram_name(observable, "DATA", "B"), data_b);
    file.insert_as(histogram_name(observable, "Bkg", "ABCDProj"), hybrid);
    file.write(path).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "prediction written");
    Ok(())
}

/// Signal-region yield of the signal sample, when its file is present.
fn signal_yield(ctx: &RunContext) -> Result<Option<Value>> {
    let signal = ctx.config.signal.resolve(&ctx.args.decay, ctx.args.mass);
    let path = ctx.input_path(&signal.name);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no signal file");
        return Ok(None);
    }
    let source = HistogramSource::open(&path, ctx.args.input_format)?;
    let a = source.try_histogram(&histogram_name(&ctx.observable, &signal.name, "A"))?;
    Ok(a.map(|h| json!({"name": signal.name, "label": signal.label, "yield": h.integral()})))
}

/// Single-sample closure test on every background sample and on their sum.
pub fn cmd_closure(args: RunArgs, only: &[String]) -> Result<()> {
    let ctx = RunContext::new(args)?;
    let backgrounds = ctx.load_backgrounds()?;

    let mut results = Vec::new();
    for (sample, regions) in &backgrounds {
        if !only.is_empty() && !only.iter().any(|n| n == &sample.name) {
            continue;
        }
        results.push(closure_one(&ctx, &sample.name, &sample.label, &regions.scaled(sample.scale))?);
    }

    let inputs: Vec<SampleInput<'_>> = backgrounds.iter().map(|(s, r)| SampleInput::new(s, r)).collect();
    let total = aggregate(&inputs).context("aggregating background samples")?;
    results.push(closure_one(&ctx, "Bkg", "All MC Bkgs", &total)?);

    ctx.emit_summary(&json!({
        "observable": ctx.observable,
        "binning": ctx.args.binning.to_string(),
        "closure": results,
    }))
}

fn closure_one(ctx: &RunContext, tag: &str, label: &str, regions: &RegionHistograms) -> Result<Value> {
    let a = regions
        .a
        .as_ref()
        .with_context(|| format!("sample {}: closure needs the signal region histogram", tag))?;
    let est = estimate(
        ControlRegions::from_regions(regions),
        &ctx.config.fit.ratio_fit_config(),
        &Rebin::Factor(ctx.config.fit.single_rebin),
    )
    .with_context(|| format!("sample {}: estimate", tag))?;

    let observed = ctx.present(a)?;
    let predicted = ctx.present_prediction(&regions.b, &est.fit)?;
    let comparison = ctx.write_closure(
        &format!("{tag}_Log_altBCD"),
        SampleHistogram::simulated(format!("{label} SR"), observed.clone()),
        SampleHistogram::simulated(format!("{label} ABCD Pred."), predicted.clone()),
        "MC SR/ABCD Pred",
    )?;

    let input = RatioFitInput {
        label,
        fit_label: "Fit to MC",
        kind: SampleKind::Simulated,
        ratio: &est.ratio,
        fit: &est.fit,
        show_band: true,
    };
    let fit_artifact = ratio_fit_artifact(&ctx.observable, tag, &[input])?;
    let fit_plot = ctx.writer().write("ratio_fit", &format!("{tag}_CD"), &fit_artifact)?;
    let pulls_plot = ctx.write_pulls(&format!("Pulls_{tag}"), &observed, &predicted)?;

    Ok(json!({
        "sample": tag,
        "fit": fit_summary(&est.fit),
        "observed_yield": a.integral(),
        "predicted_yield": est.prediction.yield_total(),
        "comparison": comparison,
        "plots": [fit_plot, pulls_plot],
    }))
}
