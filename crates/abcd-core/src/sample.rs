//! Samples (data or simulated processes) and kind-tagged histograms.

use serde::{Deserialize, Serialize};

use crate::histogram::Histogram;

/// Whether a histogram comes from recorded data or a simulated sample.
///
/// Rendering and error conventions branch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Recorded collision data.
    Data,
    /// Monte Carlo simulated sample.
    Simulated,
}

/// A named process contributing one histogram per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Name used in file and histogram names (e.g. `TTJets`).
    pub name: String,
    /// Display label.
    pub label: String,
    /// Data or simulation.
    pub kind: SampleKind,
    /// Multiplicative scale applied to every bin before aggregation.
    pub scale: f64,
    /// Optional display colour (`#rrggbb`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Sample {
    /// The data sample (`DATA`, scale 1).
    pub fn data() -> Self {
        Self {
            name: "DATA".into(),
            label: "Data".into(),
            kind: SampleKind::Data,
            scale: 1.0,
            color: None,
        }
    }

    /// A simulated sample with the given scale factor.
    pub fn simulated(name: impl Into<String>, scale: f64) -> Self {
        let name = name.into();
        Self { label: name.clone(), name, kind: SampleKind::Simulated, scale, color: None }
    }

    /// Replace the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the display colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Whether this is recorded data.
    pub fn is_data(&self) -> bool {
        self.kind == SampleKind::Data
    }
}

/// A histogram carried together with its sample kind and display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleHistogram {
    /// Data or simulation.
    pub kind: SampleKind,
    /// Display label.
    pub label: String,
    /// The histogram itself.
    pub histogram: Histogram,
}

impl SampleHistogram {
    /// Tag a histogram as data.
    pub fn data(label: impl Into<String>, histogram: Histogram) -> Self {
        Self { kind: SampleKind::Data, label: label.into(), histogram }
    }

    /// Tag a histogram as simulation.
    pub fn simulated(label: impl Into<String>, histogram: Histogram) -> Self {
        Self { kind: SampleKind::Simulated, label: label.into(), histogram }
    }
}
