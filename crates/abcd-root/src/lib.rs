//! # abcd-root
//!
//! Native ROOT file reader for ABCD background estimation.
//!
//! Reads TH1D/TH1F histograms from `.root` files without requiring Python or
//! external ROOT libraries. Supports zlib, LZ4, ZSTD, and XZ compression.
//!
//! ## Example
//!
//! ```no_run
//! use abcd_root::RootFile;
//!
//! let f = RootFile::open("RUNMiniBoostedAnalysis_pruned_DATA_low_v05.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{} ({})", key.name, key.class_name);
//! }
//! let h = f.get_histogram("massAve_prunedMassAsymVsdeltaEtaDijet_DATA_B").unwrap();
//! println!("bins: {}, entries: {}", h.n_bins(), h.entries);
//! let hist = h.into_histogram().unwrap();
//! println!("integral: {}", hist.integral());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;

pub use error::{Result, RootError};
pub use file::RootFile;
pub use histogram::RootHistogram;
pub use key::KeyInfo;
