//! TH1D and TH1F deserialization.
//!
//! Streamed layout (all embedded objects carry byte-count headers):
//! ```text
//! TH1D / TH1F
//!   ├─ TH1 (base)
//!   │    ├─ TNamed (name, title)
//!   │    ├─ TAttLine, TAttFill, TAttMarker      skipped
//!   │    ├─ fNcells (i32)
//!   │    ├─ fXaxis (TAxis)                      n_bins, x_min, x_max, fXbins
//!   │    ├─ fYaxis, fZaxis                      skipped
//!   │    ├─ fBarOffset, fBarWidth (i16), fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2 (f64)
//!   │    ├─ fMaximum, fMinimum (v ≥ 2), fNormFactor (v ≥ 3)
//!   │    ├─ fContour, fSumw2 (TArrayD)
//!   │    ├─ fOption (TString), fFunctions (TList, skipped)
//!   │    └─ anything newer                      skipped via byte count
//!   └─ TArrayD / TArrayF                        fNcells bin contents
//! ```

use crate::error::{Result, RootError};
use crate::histogram::RootHistogram;
use crate::rbuffer::RBuffer;

/// Element type of the trailing bin-content array.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Storage {
    F64,
    F32,
}

/// X-axis fields extracted from TAxis.
struct AxisInfo {
    n_bins: usize,
    x_min: f64,
    x_max: f64,
    /// Variable-width edges (empty for uniform binning).
    bin_edges: Vec<f64>,
}

/// Fields of the TH1 base class this reader keeps.
struct Th1Base {
    name: String,
    title: String,
    n_cells: usize,
    axis: AxisInfo,
    sumw2: Vec<f64>,
}

/// Read a TH1D or TH1F from decompressed object bytes.
pub(crate) fn read_th1(data: &[u8], storage: Storage) -> Result<RootHistogram> {
    let mut r = RBuffer::new(data);
    let header = r.read_version()?;
    if header.version < 1 {
        return Err(RootError::Deserialization(format!(
            "unsupported TH1 subclass version: {}",
            header.version
        )));
    }

    let base = read_th1_base(&mut r)?;
    let raw = match storage {
        Storage::F64 => r.read_tarray_d()?,
        Storage::F32 => r.read_tarray_f()?,
    };
    build_histogram(base, raw)
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let header = r.read_version()?;
    let version = header.version;

    let (name, title) = r.read_tnamed()?;

    // TAttLine, TAttFill, TAttMarker
    for _ in 0..3 {
        r.skip_versioned()?;
    }

    let n_cells = r.read_i32()?;
    let n_cells = usize::try_from(n_cells)
        .map_err(|_| RootError::Deserialization(format!("negative fNcells: {}", n_cells)))?;

    let axis = read_taxis(r)?;
    // fYaxis, fZaxis
    r.skip_versioned()?;
    r.skip_versioned()?;

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    // fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2
    r.skip(5 * 8)?;
    if version >= 2 {
        // fMaximum, fMinimum
        r.skip(2 * 8)?;
    }
    if version >= 3 {
        // fNormFactor
        r.skip(8)?;
    }

    let _contour = r.read_tarray_d()?;
    let sumw2 = r.read_tarray_d()?;
    let _option = r.read_string()?;
    // fFunctions
    r.skip_versioned()?;

    if let Some(end) = header.end {
        r.seek_forward(end)?;
    }

    Ok(Th1Base { name, title, n_cells, axis, sumw2 })
}

fn read_taxis(r: &mut RBuffer) -> Result<AxisInfo> {
    let header = r.read_version()?;
    let (_name, _title) = r.read_tnamed()?;
    // TAttAxis
    r.skip_versioned()?;

    let n_bins = r.read_i32()?;
    let n_bins = usize::try_from(n_bins)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| RootError::Deserialization(format!("invalid axis bin count: {}", n_bins)))?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let bin_edges = r.read_tarray_d()?;

    // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs
    match header.end {
        Some(end) => r.seek_forward(end)?,
        None => {
            return Err(RootError::Deserialization(
                "TAxis without byte count is not supported".into(),
            ));
        }
    }

    Ok(AxisInfo { n_bins, x_min, x_max, bin_edges })
}

/// Strip under/overflow from the raw `fNcells` arrays and build edges.
fn build_histogram(base: Th1Base, raw: Vec<f64>) -> Result<RootHistogram> {
    let Th1Base { name, title, n_cells, axis, sumw2 } = base;
    let n_bins = axis.n_bins;

    if raw.len() != n_cells {
        return Err(RootError::Deserialization(format!(
            "'{}': bin array size {} != fNcells {}",
            name,
            raw.len(),
            n_cells
        )));
    }
    if n_cells != n_bins + 2 {
        return Err(RootError::Deserialization(format!(
            "'{}': fNcells {} does not match {} bins plus under/overflow",
            name, n_cells, n_bins
        )));
    }

    // [underflow, bin1, ..., binN, overflow]
    let bin_content = raw[1..=n_bins].to_vec();
    let sumw2 = (sumw2.len() == n_cells).then(|| sumw2[1..=n_bins].to_vec());

    let bin_edges = if axis.bin_edges.len() == n_bins + 1 {
        axis.bin_edges
    } else {
        let width = (axis.x_max - axis.x_min) / n_bins as f64;
        (0..=n_bins).map(|i| axis.x_min + i as f64 * width).collect()
    };

    let entries = bin_content.iter().sum();
    Ok(RootHistogram { name, title, bin_edges, bin_content, sumw2, entries })
}
