//! Scaled sums of region histograms across background samples.

use abcd_core::{Error, Histogram, Region, RegionHistograms, Result, Sample};
use tracing::{debug, info};

/// One sample with its loaded region histograms.
#[derive(Debug, Clone, Copy)]
pub struct SampleInput<'a> {
    /// Sample metadata (name, scale).
    pub sample: &'a Sample,
    /// Unscaled region histograms.
    pub regions: &'a RegionHistograms,
}

impl<'a> SampleInput<'a> {
    /// Pair a sample with its histograms.
    pub fn new(sample: &'a Sample, regions: &'a RegionHistograms) -> Self {
        Self { sample, regions }
    }
}

/// Sum of `scale · regions` over all samples.
///
/// The signal region and the projection survive only when every sample has them.
pub fn aggregate(inputs: &[SampleInput<'_>]) -> Result<RegionHistograms> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| Error::Validation("no samples to aggregate".into()))?;

    info!(sample = %first.sample.name, scale = first.sample.scale, "aggregating sample");
    let mut total = first.regions.scaled(first.sample.scale);
    for input in rest {
        info!(sample = %input.sample.name, scale = input.sample.scale, "aggregating sample");
        total = total.added(&input.regions.scaled(input.sample.scale)).map_err(|e| match e {
            Error::Binning(msg) => Error::Binning(format!("sample '{}': {}", input.sample.name, msg)),
            other => other,
        })?;
    }
    debug!(n_samples = inputs.len(), b_yield = total.b.integral(), "aggregate built");
    Ok(total)
}

/// Scaled sum of one region. Samples lacking the region are an error.
pub fn aggregate_region(inputs: &[SampleInput<'_>], region: Region) -> Result<Histogram> {
    let mut total: Option<Histogram> = None;
    for input in inputs {
        let h = input.regions.region(region).ok_or_else(|| {
            Error::Validation(format!("sample '{}' has no region {}", input.sample.name, region))
        })?;
        let scaled = h.scaled(input.sample.scale);
        total = Some(match total {
            None => scaled,
            Some(acc) => acc.added(&scaled)?,
        });
    }
    total.ok_or_else(|| Error::Validation("no samples to aggregate".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn regions(b: f64, c: f64, d: f64) -> RegionHistograms {
        let edges = vec![0.0, 100.0, 200.0];
        let h = |name: &str, v: f64| {
            Histogram::new(name, edges.clone(), vec![v, 2.0 * v], vec![1.0, 2.0]).unwrap()
        };
        RegionHistograms::new(h("b", b), h("c", c), h("d", d)).unwrap()
    }

    #[test]
    fn scales_then_sums_in_quadrature() {
        let tt = Sample::simulated("TTJets", 2.0);
        let qcd = Sample::simulated("QCDPtAll", 0.5);
        let (r1, r2) = (regions(1.0, 2.0, 3.0), regions(10.0, 20.0, 30.0));
        let total = aggregate(&[SampleInput::new(&tt, &r1), SampleInput::new(&qcd, &r2)]).unwrap();

        assert_eq!(total.b.contents(), &[7.0, 14.0]);
        assert_eq!(total.d.contents(), &[21.0, 42.0]);
        assert_relative_eq!(total.c.error(0), (4.0f64 + 0.25).sqrt());
        assert!(total.a.is_none());
    }

    #[test]
    fn single_region_matches_full_aggregate() {
        let s = Sample::simulated("WZ", 1.5);
        let r = regions(4.0, 5.0, 6.0);
        let inputs = [SampleInput::new(&s, &r), SampleInput::new(&s, &r)];
        let c = aggregate_region(&inputs, Region::C).unwrap();
        assert_eq!(c.contents(), aggregate(&inputs).unwrap().c.contents());
        assert!(matches!(aggregate_region(&inputs, Region::A), Err(Error::Validation(_))));
    }

    #[test]
    fn empty_and_mismatched_inputs() {
        assert!(matches!(aggregate(&[]), Err(Error::Validation(_))));
        assert!(matches!(aggregate_region(&[], Region::B), Err(Error::Validation(_))));

        let wide = Histogram::from_counts("b", vec![0.0, 50.0, 200.0], vec![1.0, 1.0]).unwrap();
        let odd = RegionHistograms::new(wide.clone(), wide.clone(), wide).unwrap();
        let (s, r) = (Sample::simulated("ZZTo4Q", 1.0), regions(1.0, 1.0, 1.0));
        let err = aggregate(&[SampleInput::new(&s, &r), SampleInput::new(&s, &odd)]).unwrap_err();
        assert!(matches!(err, Error::Binning(ref m) if m.contains("ZZTo4Q")));
    }
}
