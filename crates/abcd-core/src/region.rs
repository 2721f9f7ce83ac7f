//! The four ABCD regions and per-sample region histogram bundles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::histogram::{Histogram, Rebin};

/// Histogram-name suffix of the stored ABCD projection (`<observable>_<sample>_ABCDProj`).
pub const PROJECTION_SUFFIX: &str = "ABCDProj";

/// One of the four kinematic regions of the ABCD method.
///
/// A is signal-enriched; B, C and D are control regions. The prediction for A
/// is B scaled by the C/D ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// Signal region (extrapolation target).
    A,
    /// Control region the ratio is applied to.
    B,
    /// Ratio numerator region.
    C,
    /// Ratio denominator region.
    D,
}

impl Region {
    /// All regions in order.
    pub const ALL: [Region; 4] = [Region::A, Region::B, Region::C, Region::D];

    /// Histogram-name suffix (`"A"`, `"B"`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            Region::A => "A",
            Region::B => "B",
            Region::C => "C",
            Region::D => "D",
        }
    }

    /// Whether this is the signal region.
    pub fn is_signal(self) -> bool {
        self == Region::A
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Region::A),
            "B" => Ok(Region::B),
            "C" => Ok(Region::C),
            "D" => Ok(Region::D),
            other => Err(Error::Validation(format!("unknown region '{}'", other))),
        }
    }
}

/// Region histograms of one sample.
///
/// B, C and D are required and share a binning. The signal region A and the
/// stored projection are optional (data may be blinded, older files lack the
/// projection).
#[derive(Debug, Clone, PartialEq)]
pub struct RegionHistograms {
    /// Signal region, if available.
    pub a: Option<Histogram>,
    /// Control region B.
    pub b: Histogram,
    /// Control region C.
    pub c: Histogram,
    /// Control region D.
    pub d: Histogram,
    /// Stored ABCD projection, if available.
    pub projection: Option<Histogram>,
}

impl RegionHistograms {
    /// Bundle B, C and D, checking that they share a binning.
    pub fn new(b: Histogram, c: Histogram, d: Histogram) -> Result<Self> {
        b.check_binning(&c)?;
        b.check_binning(&d)?;
        Ok(Self { a: None, b, c, d, projection: None })
    }

    /// Attach the signal-region histogram.
    pub fn with_signal_region(mut self, a: Histogram) -> Result<Self> {
        self.b.check_binning(&a)?;
        self.a = Some(a);
        Ok(self)
    }

    /// Attach the stored projection histogram.
    pub fn with_projection(mut self, projection: Histogram) -> Result<Self> {
        self.b.check_binning(&projection)?;
        self.projection = Some(projection);
        Ok(self)
    }

    /// Histogram of `region`, if present.
    pub fn region(&self, region: Region) -> Option<&Histogram> {
        match region {
            Region::A => self.a.as_ref(),
            Region::B => Some(&self.b),
            Region::C => Some(&self.c),
            Region::D => Some(&self.d),
        }
    }

    /// Every histogram multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            a: self.a.as_ref().map(|h| h.scaled(k)),
            b: self.b.scaled(k),
            c: self.c.scaled(k),
            d: self.d.scaled(k),
            projection: self.projection.as_ref().map(|h| h.scaled(k)),
        }
    }

    /// Region-wise sum. Optional histograms survive only if present on both sides.
    pub fn added(&self, other: &RegionHistograms) -> Result<Self> {
        Ok(Self {
            a: add_optional(self.a.as_ref(), other.a.as_ref())?,
            b: self.b.added(&other.b)?,
            c: self.c.added(&other.c)?,
            d: self.d.added(&other.d)?,
            projection: add_optional(self.projection.as_ref(), other.projection.as_ref())?,
        })
    }

    /// Every histogram rebinned the same way.
    pub fn rebinned(&self, rebin: &Rebin) -> Result<Self> {
        Ok(Self {
            a: self.a.as_ref().map(|h| h.rebinned(rebin)).transpose()?,
            b: self.b.rebinned(rebin)?,
            c: self.c.rebinned(rebin)?,
            d: self.d.rebinned(rebin)?,
            projection: self.projection.as_ref().map(|h| h.rebinned(rebin)).transpose()?,
        })
    }
}

fn add_optional(a: Option<&Histogram>, b: Option<&Histogram>) -> Result<Option<Histogram>> {
    match (a, b) {
        (Some(a), Some(b)) => Ok(Some(a.added(b)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(name: &str, contents: Vec<f64>) -> Histogram {
        let edges = Histogram::uniform_edges(contents.len(), 0.0, 100.0);
        Histogram::from_counts(name, edges, contents).unwrap()
    }

    #[test]
    fn region_suffix_round_trip() {
        for r in Region::ALL {
            assert_eq!(r.suffix().parse::<Region>().unwrap(), r);
        }
        assert!("E".parse::<Region>().is_err());
        assert!(Region::A.is_signal());
    }

    #[test]
    fn bundle_rejects_mismatched_binning() {
        let b = hist("b", vec![1.0, 2.0]);
        let c = hist("c", vec![1.0, 2.0, 3.0]);
        let d = hist("d", vec![1.0, 2.0]);
        assert!(matches!(RegionHistograms::new(b, c, d), Err(Error::Binning(_))));
    }

    #[test]
    fn added_drops_one_sided_optionals() {
        let x = RegionHistograms::new(hist("b", vec![1.0]), hist("c", vec![2.0]), hist("d", vec![3.0]))
            .unwrap()
            .with_signal_region(hist("a", vec![4.0]))
            .unwrap();
        let y = RegionHistograms::new(hist("b", vec![1.0]), hist("c", vec![2.0]), hist("d", vec![3.0]))
            .unwrap();
        let s = x.added(&y).unwrap();
        assert!(s.a.is_none());
        assert_eq!(s.d.contents(), &[6.0]);
        assert_eq!(x.added(&x).unwrap().region(Region::A).unwrap().contents(), &[8.0]);
    }
}
