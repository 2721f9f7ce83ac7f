//! # abcd-core
//!
//! Core value types for ABCD background estimation.
//!
//! Histograms here are immutable values: every transform (`scaled`, `added`,
//! `divided`, `rebinned`) returns a new [`Histogram`] and leaves its inputs
//! untouched.
//!
//! ## Example
//!
//! ```
//! use abcd_core::{Histogram, Rebin};
//!
//! let h = Histogram::from_counts("mass", vec![0.0, 10.0, 20.0, 30.0, 40.0], vec![4.0, 9.0, 16.0, 1.0])
//!     .unwrap();
//! let coarse = h.rebinned(&Rebin::Factor(2)).unwrap();
//! assert_eq!(coarse.contents(), &[13.0, 17.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod file;
pub mod histogram;
pub mod region;
pub mod sample;
pub mod types;

pub use error::{Error, Result};
pub use file::{HISTOGRAM_FILE_SCHEMA, HistogramFile};
pub use histogram::{Histogram, Rebin};
pub use region::{PROJECTION_SUFFIX, Region, RegionHistograms};
pub use sample::{Sample, SampleHistogram, SampleKind};
pub use types::FitResult;

/// Crate version, recorded in written artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
