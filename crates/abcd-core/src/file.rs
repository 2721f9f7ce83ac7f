//! Flat JSON container of named histograms.
//!
//! Used both as an input format (one file per sample, histograms named
//! `<observable>_<sample>_<suffix>`) and for the written prediction.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::histogram::Histogram;

/// Schema tag written into every [`HistogramFile`].
pub const HISTOGRAM_FILE_SCHEMA: &str = "abcd_histograms_v0";

/// Named histograms, ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramFile {
    /// Schema tag.
    pub schema_version: String,
    /// Histograms by name.
    pub histograms: BTreeMap<String, Histogram>,
}

impl Default for HistogramFile {
    fn default() -> Self {
        Self { schema_version: HISTOGRAM_FILE_SCHEMA.to_string(), histograms: BTreeMap::new() }
    }
}

impl HistogramFile {
    /// Empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a histogram under its own name, replacing any previous entry.
    pub fn insert(&mut self, histogram: Histogram) {
        self.histograms.insert(histogram.name().to_string(), histogram);
    }

    /// Insert a histogram under `name`, renaming it.
    pub fn insert_as(&mut self, name: impl Into<String>, histogram: &Histogram) {
        let name = name.into();
        self.histograms.insert(name.clone(), histogram.with_name(name));
    }

    /// Look up a histogram.
    pub fn get(&self, name: &str) -> Result<&Histogram> {
        self.histograms
            .get(name)
            .ok_or_else(|| Error::Validation(format!("histogram '{}' not found", name)))
    }

    /// Histogram names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: HistogramFile = serde_json::from_str(json)?;
        if file.schema_version != HISTOGRAM_FILE_SCHEMA {
            return Err(Error::Validation(format!(
                "unsupported histogram file schema '{}' (expected {})",
                file.schema_version, HISTOGRAM_FILE_SCHEMA
            )));
        }
        Ok(file)
    }

    /// Read from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to disk as pretty JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_and_reparse() {
        let h = Histogram::from_counts("x", vec![0.0, 1.0, 2.0], vec![3.0, 4.0]).unwrap();
        let mut file = HistogramFile::new();
        file.insert_as("DATA_B", &h);
        file.insert(h);

        let back = HistogramFile::from_json(&file.to_json().unwrap()).unwrap();
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["DATA_B", "x"]);
        assert_eq!(back.get("DATA_B").unwrap().name(), "DATA_B");
        assert!(matches!(back.get("missing"), Err(Error::Validation(_))));
    }

    #[test]
    fn invalid_histogram_is_rejected() {
        let json = r#"{"schema_version":"abcd_histograms_v0","histograms":{"h":
            {"name":"h","edges":[1.0,0.0],"contents":[1.0],"errors":[1.0]}}}"#;
        assert!(HistogramFile::from_json(json).is_err());
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let json = r#"{"schema_version":"other","histograms":{}}"#;
        assert!(matches!(HistogramFile::from_json(json), Err(Error::Validation(_))));
    }
}
