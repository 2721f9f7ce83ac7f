use std::time::{SystemTime, UNIX_EPOCH};

use abcd_core::Result;
use serde::{Deserialize, Serialize};

/// Provenance common to every artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
    /// Observable the histograms were filled with.
    pub observable: String,
    /// Plot type, used in output file names.
    pub plot_type: String,
}

impl ArtifactMeta {
    /// Metadata stamped with the current time.
    pub fn new(observable: impl Into<String>, plot_type: impl Into<String>) -> Result<Self> {
        Ok(Self {
            tool: "abcd".to_string(),
            tool_version: abcd_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
            observable: observable.into(),
            plot_type: plot_type.into(),
        })
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| abcd_core::Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}
