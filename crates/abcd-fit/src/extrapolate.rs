//! Ratio-fit extrapolation from control region B into the signal region A.
//!
//! The C/D ratio is fitted on coarsely rebinned histograms, evaluated at every
//! bin center of B, and multiplied into B:
//!
//! ```text
//! A_i  = B_i · f(x_i)
//! σ_Ai = |A_i| · sqrt( (ci(x_i) / f(x_i))² + (σ_Bi / B_i)² )
//! ```
//!
//! Bins where B, the factor or the prediction is zero get [`FALLBACK_ERROR`].

use abcd_core::{Histogram, Rebin, RegionHistograms, Result};
use tracing::{debug, info};

use crate::ratio_fit::{RatioFit, RatioFitConfig, fit_ratio};

/// Error assigned to predicted bins whose relative error is undefined.
pub const FALLBACK_ERROR: f64 = 1.8;

/// Rebin factor for the C/D ratio in a single-sample estimate.
pub const SINGLE_REBIN_FACTOR: usize = 50;

/// Rebin factor for the C/D ratios in the combined data + background estimate.
pub const COMBINED_REBIN_FACTOR: usize = 25;

/// Error on `prediction = content · factor`.
pub fn propagate_error(
    prediction: f64,
    factor: f64,
    factor_error: f64,
    content: f64,
    content_error: f64,
) -> f64 {
    if content == 0.0 || factor == 0.0 || prediction == 0.0 {
        return FALLBACK_ERROR;
    }
    prediction.abs() * ((factor_error / factor).powi(2) + (content_error / content).powi(2)).sqrt()
}

/// B, C and D of one sample.
///
/// B may use a different binning from C and D: C and D are rebinned for the fit
/// while B is kept at the binning the prediction should have.
#[derive(Debug, Clone, Copy)]
pub struct ControlRegions<'a> {
    /// Region multiplied by the fitted factor.
    pub b: &'a Histogram,
    /// Ratio numerator.
    pub c: &'a Histogram,
    /// Ratio denominator.
    pub d: &'a Histogram,
}

impl<'a> ControlRegions<'a> {
    /// Bundle three histograms.
    pub fn new(b: &'a Histogram, c: &'a Histogram, d: &'a Histogram) -> Self {
        Self { b, c, d }
    }

    /// B, C and D of a [`RegionHistograms`].
    pub fn from_regions(regions: &'a RegionHistograms) -> Self {
        Self { b: &regions.b, c: &regions.c, d: &regions.d }
    }

    /// `C / D` after rebinning both.
    pub fn ratio(&self, rebin: &Rebin) -> Result<Histogram> {
        let c = self.c.rebinned(rebin)?;
        let d = self.d.rebinned(rebin)?;
        Ok(c.divided(&d)?.with_name(format!("{}_RatioCD", self.c.name())))
    }
}

/// Prediction for region A.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Predicted content and error per B bin.
    pub histogram: Histogram,
    /// Fitted factor per B bin, with the band half-width as error.
    pub factors: Histogram,
}

impl Prediction {
    /// Predicted yield summed over bins.
    pub fn yield_total(&self) -> f64 {
        self.histogram.integral()
    }
}

/// Apply `fit` to every bin of `b`.
pub fn predict(b: &Histogram, fit: &RatioFit) -> Result<Prediction> {
    let n = b.n_bins();
    let mut contents = Vec::with_capacity(n);
    let mut errors = Vec::with_capacity(n);
    let mut factors = Vec::with_capacity(n);
    let mut factor_errors = Vec::with_capacity(n);

    for i in 0..n {
        let x = b.center(i);
        let factor = fit.eval(x);
        let ci = fit.confidence_interval(x);
        let prediction = b.content(i) * factor;

        contents.push(prediction);
        errors.push(propagate_error(prediction, factor, ci, b.content(i), b.error(i)));
        factors.push(factor);
        factor_errors.push(ci);
    }

    Ok(Prediction {
        histogram: Histogram::new(b.name(), b.edges().to_vec(), contents, errors)?,
        factors: Histogram::new(
            format!("{}_factor", b.name()),
            b.edges().to_vec(),
            factors,
            factor_errors,
        )?,
    })
}

/// Single-sample estimate.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// Rebinned C/D ratio that was fitted.
    pub ratio: Histogram,
    /// The ratio fit.
    pub fit: RatioFit,
    /// Prediction for region A.
    pub prediction: Prediction,
}

/// Fit `C/D` of one sample and extrapolate B.
pub fn estimate(regions: ControlRegions<'_>, config: &RatioFitConfig, rebin: &Rebin) -> Result<Estimate> {
    let ratio = regions.ratio(rebin)?;
    let fit = fit_ratio(&ratio, config, None)?;
    info!(
        sample = regions.b.name(),
        chi2 = fit.chi2,
        ndf = fit.ndf,
        "ratio fit done"
    );
    let prediction = predict(regions.b, &fit)?;
    debug!(yield_total = prediction.yield_total(), "single-sample prediction");
    Ok(Estimate { ratio, fit, prediction })
}

/// Combined data + background estimate.
#[derive(Debug, Clone)]
pub struct CombinedEstimate {
    /// Rebinned background C/D ratio.
    pub background_ratio: Histogram,
    /// Fit to the background ratio.
    pub background_fit: RatioFit,
    /// Rebinned data C/D ratio.
    pub data_ratio: Histogram,
    /// Fit to the data ratio, seeded from `background_fit`.
    pub data_fit: RatioFit,
    /// Data prediction.
    pub data: Prediction,
    /// Background B extrapolated with the data fit.
    pub hybrid: Prediction,
}

/// Fit the background ratio, then the data ratio starting from the background
/// coefficients, and extrapolate both B histograms with the data fit.
///
/// `config.passes` applies to the background fit; the data fit runs `data_passes`.
pub fn estimate_combined(
    data: ControlRegions<'_>,
    background: ControlRegions<'_>,
    config: &RatioFitConfig,
    data_passes: usize,
    rebin: &Rebin,
) -> Result<CombinedEstimate> {
    data.b.check_binning(background.b)?;

    let background_ratio = background.ratio(rebin)?;
    let background_fit = fit_ratio(&background_ratio, config, None)?;
    info!(chi2 = background_fit.chi2, ndf = background_fit.ndf, "background ratio fit done");

    let data_ratio = data.ratio(rebin)?;
    let seed = background_fit.parameters();
    let data_config = config.clone().with_passes(data_passes);
    let data_fit = fit_ratio(&data_ratio, &data_config, Some(seed.as_slice()))?;
    info!(chi2 = data_fit.chi2, ndf = data_fit.ndf, "data ratio fit done");

    let data_prediction = predict(data.b, &data_fit)?;
    let hybrid = predict(background.b, &data_fit)?;
    debug!(
        data_yield = data_prediction.yield_total(),
        hybrid_yield = hybrid.yield_total(),
        "combined prediction"
    );

    Ok(CombinedEstimate {
        background_ratio,
        background_fit,
        data_ratio,
        data_fit,
        data: data_prediction,
        hybrid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn error_combines_relative_terms() {
        // 3/4/5 triangle on relative errors
        let err = propagate_error(20.0, 2.0, 0.6, 10.0, 4.0);
        assert_relative_eq!(err, 20.0 * 0.5);
    }

    #[test]
    fn zero_inputs_fall_back() {
        assert_eq!(propagate_error(0.0, 2.0, 0.1, 0.0, 0.0), FALLBACK_ERROR);
        assert_eq!(propagate_error(0.0, 0.0, 0.1, 5.0, 1.0), FALLBACK_ERROR);
        assert_eq!(propagate_error(0.0, 1e-3, 0.1, 5.0, 1.0), FALLBACK_ERROR);
    }

    #[test]
    fn exact_inputs_give_zero_error() {
        assert_eq!(propagate_error(6.0, 2.0, 0.0, 3.0, 0.0), 0.0);
    }

    #[test]
    fn negative_factor_gives_positive_error() {
        let err = propagate_error(-20.0, -2.0, 0.2, 10.0, 1.0);
        assert!(err > 0.0);
    }
}
