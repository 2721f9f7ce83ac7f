//! Histogram as decoded from a ROOT TH1 object.

use abcd_core::Histogram;

/// A 1D histogram extracted from a ROOT file, under/overflow stripped.
#[derive(Debug, Clone)]
pub struct RootHistogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin, if stored.
    pub sumw2: Option<Vec<f64>>,
    /// Sum of in-range bin contents.
    pub entries: f64,
}

impl RootHistogram {
    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Per-bin errors: `sqrt(sumw2)` when stored, `sqrt(|content|)` otherwise.
    pub fn errors(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(sw2) if sw2.len() == self.bin_content.len() => {
                sw2.iter().map(|w| w.max(0.0).sqrt()).collect()
            }
            _ => self.bin_content.iter().map(|c| c.abs().sqrt()).collect(),
        }
    }

    /// Convert to the validated [`Histogram`] value type.
    pub fn into_histogram(self) -> abcd_core::Result<Histogram> {
        let errors = self.errors();
        Histogram::new(self.name, self.bin_edges, self.bin_content, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_hist(sumw2: Option<Vec<f64>>) -> RootHistogram {
        RootHistogram {
            name: "h".into(),
            title: String::new(),
            bin_edges: vec![0.0, 1.0, 2.0],
            bin_content: vec![4.0, 9.0],
            sumw2,
            entries: 13.0,
        }
    }

    #[test]
    fn errors_prefer_sumw2() {
        assert_eq!(root_hist(Some(vec![1.0, 0.25])).errors(), vec![1.0, 0.5]);
        assert_eq!(root_hist(None).errors(), vec![2.0, 3.0]);
    }

    #[test]
    fn converts_to_histogram() {
        let h = root_hist(None).into_histogram().unwrap();
        assert_eq!(h.n_bins(), 2);
        assert_eq!(h.errors(), &[2.0, 3.0]);
    }
}
