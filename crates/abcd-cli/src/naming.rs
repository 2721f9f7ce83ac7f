//! Input and output file names of one analysis run.

use abcd_fit::BinningMode;

/// `<observable>_<sample>_<suffix>`, the histogram naming used inside every input file.
pub fn histogram_name(observable: &str, sample: &str, suffix: &str) -> String {
    format!("{observable}_{sample}_{suffix}")
}

#[derive(Debug, Clone)]
pub struct RunNaming {
    pub prefix: String,
    pub grooming: String,
    pub range: String,
    pub version: String,
    pub qcd: String,
    pub binning: BinningMode,
}

impl RunNaming {
    /// `<prefix>_<grooming>_<sample>_<range>_<version>.<ext>`
    pub fn input_file(&self, sample: &str, ext: &str) -> String {
        format!("{}_{}_{}_{}_{}.{}", self.prefix, self.grooming, sample, self.range, self.version, ext)
    }

    /// Plot file name without extension. Non-simple binnings tag the plot type
    /// with `_ResoBasedBin`.
    pub fn plot_stem(&self, observable: &str, plot_type: &str) -> String {
        format!(
            "{}_{}{}_{}_{}_QCD{}_bkgShapeEstimationBoostedPlots{}",
            observable,
            plot_type,
            self.binning.file_suffix(),
            self.grooming,
            self.range,
            self.qcd,
            self.version
        )
    }

    /// Histogram file holding the data prediction.
    pub fn prediction_file(&self, observable: &str) -> String {
        format!(
            "{}_{}_{}_QCD{}_ABCDPrediction{}.json",
            observable, self.grooming, self.range, self.qcd, self.version
        )
    }

    /// The low-mass selection drives the default y ranges.
    pub fn is_low_mass(&self) -> bool {
        self.range.contains("low")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming(binning: BinningMode) -> RunNaming {
        RunNaming {
            prefix: "RUNMiniBoostedAnalysis".into(),
            grooming: "pruned".into(),
            range: "low".into(),
            version: "v05".into(),
            qcd: "Pt".into(),
            binning,
        }
    }

    #[test]
    fn input_and_histogram_names() {
        let n = naming(BinningMode::Simple);
        assert_eq!(n.input_file("DATA", "root"), "RUNMiniBoostedAnalysis_pruned_DATA_low_v05.root");
        assert_eq!(histogram_name("massAve", "TTJets", "ABCDProj"), "massAve_TTJets_ABCDProj");
        assert!(n.is_low_mass());
    }

    #[test]
    fn output_names() {
        let simple = naming(BinningMode::Simple);
        assert_eq!(
            simple.plot_stem("massAve", "Log_altBCD"),
            "massAve_Log_altBCD_pruned_low_QCDPt_bkgShapeEstimationBoostedPlotsv05"
        );
        assert_eq!(
            naming(BinningMode::Reso).plot_stem("massAve", "Pulls_Bkg"),
            "massAve_Pulls_Bkg_ResoBasedBin_pruned_low_QCDPt_bkgShapeEstimationBoostedPlotsv05"
        );
        assert_eq!(simple.prediction_file("massAve"), "massAve_pruned_low_QCDPt_ABCDPredictionv05.json");
    }
}
