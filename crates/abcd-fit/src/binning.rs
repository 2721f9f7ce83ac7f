//! Named presentation binnings.

use std::fmt;
use std::str::FromStr;

use abcd_core::{Error, Rebin};
use serde::{Deserialize, Serialize};

/// Default merge factor for [`BinningMode::Simple`].
pub const DEFAULT_SIMPLE_FACTOR: usize = 5;

/// Resolution-based edges: 5-unit bins up to 290, then 10-unit bins to 350,
/// then one wide bin and a 10-unit tail.
pub fn reso_edges() -> Vec<f64> {
    let mut edges: Vec<f64> = (0..=58).map(|i| 5.0 * i as f64).collect();
    edges.extend([300.0, 310.0, 320.0, 330.0, 340.0, 350.0, 500.0, 510.0]);
    edges
}

/// Coarse edges used for ratio displays.
pub const RATIO_EDGES: [f64; 13] =
    [0.0, 25.0, 50.0, 75.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0];

/// How the presentation histograms are rebinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningMode {
    /// Merge a fixed number of bins.
    #[default]
    Simple,
    /// Resolution-based variable edges.
    Reso,
    /// Coarse ratio edges.
    Ratio,
}

impl BinningMode {
    /// The rebinning this mode stands for.
    pub fn rebin(self, simple_factor: usize) -> Rebin {
        match self {
            BinningMode::Simple => Rebin::Factor(simple_factor),
            BinningMode::Reso => Rebin::Edges(reso_edges()),
            BinningMode::Ratio => Rebin::Edges(RATIO_EDGES.to_vec()),
        }
    }

    /// Suffix appended to output file names (empty for `simple`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            BinningMode::Simple => "",
            BinningMode::Reso | BinningMode::Ratio => "_ResoBasedBin",
        }
    }
}

impl fmt::Display for BinningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinningMode::Simple => "simple",
            BinningMode::Reso => "reso",
            BinningMode::Ratio => "ratio",
        })
    }
}

impl FromStr for BinningMode {
    type Err = Error;

    /// Substring match, so `resolution` and `resoBased` select [`BinningMode::Reso`].
    fn from_str(s: &str) -> Result<Self, Error> {
        let lower = s.trim().to_ascii_lowercase();
        if lower.contains("reso") {
            Ok(BinningMode::Reso)
        } else if lower.contains("ratio") {
            Ok(BinningMode::Ratio)
        } else if lower.contains("simple") {
            Ok(BinningMode::Simple)
        } else {
            Err(Error::Validation(format!(
                "unknown binning '{}' (expected simple, reso or ratio)",
                s
            )))
        }
    }
}
