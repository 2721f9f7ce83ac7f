//! Histogram inputs: ROOT files or JSON histogram files.

use std::path::{Path, PathBuf};

use abcd_core::{Histogram, HistogramFile, PROJECTION_SUFFIX, Region, RegionHistograms};
use abcd_root::{RootError, RootFile};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::naming::histogram_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Root,
    Json,
}

impl InputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Root => "root",
            InputFormat::Json => "json",
        }
    }

    /// `.json` files are histogram files, anything else is read as ROOT.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Root,
        }
    }
}

/// One row of `abcd list-keys`.
#[derive(Debug, Clone, Serialize)]
pub struct KeyRow {
    pub name: String,
    pub class_name: String,
    pub cycle: u16,
}

/// An opened input file.
pub enum HistogramSource {
    Root(RootFile),
    Json { file: HistogramFile, path: PathBuf },
}

impl HistogramSource {
    pub fn open(path: &Path, format: InputFormat) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening input");
        match format {
            InputFormat::Root => {
                let file = RootFile::open(path).with_context(|| format!("opening {}", path.display()))?;
                Ok(HistogramSource::Root(file))
            }
            InputFormat::Json => {
                let file = HistogramFile::read(path).with_context(|| format!("reading {}", path.display()))?;
                Ok(HistogramSource::Json { file, path: path.to_path_buf() })
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            HistogramSource::Root(f) => f.path(),
            HistogramSource::Json { path, .. } => path,
        }
    }

    /// `None` when the file has no histogram of that name.
    pub fn try_histogram(&self, name: &str) -> Result<Option<Histogram>> {
        match self {
            HistogramSource::Root(file) => match file.get_histogram(name) {
                Ok(h) => Ok(Some(h.into_histogram()?)),
                Err(RootError::KeyNotFound(_)) => Ok(None),
                Err(e) => Err(e).with_context(|| format!("reading histogram {}", name)),
            },
            HistogramSource::Json { file, .. } => Ok(file.histograms.get(name).cloned()),
        }
    }

    pub fn histogram(&self, name: &str) -> Result<Histogram> {
        self.try_histogram(name)?.with_context(|| {
            format!("histogram '{}' not found in {}", name, self.path().display())
        })
    }

    pub fn keys(&self) -> Result<Vec<KeyRow>> {
        match self {
            HistogramSource::Root(file) => Ok(file
                .list_keys()?
                .into_iter()
                .map(|k| KeyRow { name: k.name, class_name: k.class_name, cycle: k.cycle })
                .collect()),
            HistogramSource::Json { file, .. } => Ok(file
                .names()
                .map(|n| KeyRow { name: n.to_string(), class_name: "Histogram".to_string(), cycle: 1 })
                .collect()),
        }
    }
}

/// Read `<observable>_<sample>_{B,C,D}` plus the optional signal region and projection.
pub fn load_regions(source: &HistogramSource, observable: &str, sample: &str) -> Result<RegionHistograms> {
    let get = |region: Region| source.histogram(&histogram_name(observable, sample, region.suffix()));
    let mut regions = RegionHistograms::new(get(Region::B)?, get(Region::C)?, get(Region::D)?)
        .with_context(|| format!("sample {}: control regions", sample))?;

    if let Some(a) = source.try_histogram(&histogram_name(observable, sample, Region::A.suffix()))? {
        regions = regions.with_signal_region(a).with_context(|| format!("sample {}: region A", sample))?;
    } else {
        tracing::debug!(sample, "no signal region histogram");
    }
    if let Some(p) = source.try_histogram(&histogram_name(observable, sample, PROJECTION_SUFFIX))? {
        regions = regions.with_projection(p).with_context(|| format!("sample {}: projection", sample))?;
    }
    Ok(regions)
}
