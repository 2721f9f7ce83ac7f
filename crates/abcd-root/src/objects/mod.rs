//! ROOT object deserialization dispatch.

mod th1;

use crate::error::{Result, RootError};
use crate::histogram::RootHistogram;

/// Read a histogram from a decompressed object payload, given its class name.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<RootHistogram> {
    match class_name {
        "TH1D" => th1::read_th1(payload, th1::Storage::F64),
        "TH1F" => th1::read_th1(payload, th1::Storage::F32),
        _ => Err(RootError::UnsupportedClass(class_name.to_string())),
    }
}
