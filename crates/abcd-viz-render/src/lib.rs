//! # abcd-viz-render
//!
//! Renders `abcd-viz` artifacts to SVG, or PNG with the `png` feature.
//!
//! Every render call takes an explicit [`VizConfig`]; there is no global
//! style state.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod paint;
pub mod plots;
pub mod text;
pub mod theme;

use std::path::Path;
use std::str::FromStr;

use config::VizConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("unsupported output format: {0}")]
    UnknownFormat(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Plot kinds, named as in the artifact JSON `kind` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Closure,
    RatioFit,
    Pulls,
}

impl FromStr for ArtifactKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "closure" => Ok(Self::Closure),
            "ratio_fit" => Ok(Self::RatioFit),
            "pulls" => Ok(Self::Pulls),
            other => Err(RenderError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            #[cfg(feature = "png")]
            "png" => Ok(Self::Png),
            other => Err(RenderError::UnknownFormat(other.to_string())),
        }
    }
}

/// Deserialize `artifact_json` as `kind` and draw it.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    match kind.parse::<ArtifactKind>()? {
        ArtifactKind::Closure => plots::closure::render(&serde_json::from_str(artifact_json)?, config),
        ArtifactKind::RatioFit => plots::ratio_fit::render(&serde_json::from_str(artifact_json)?, config),
        ArtifactKind::Pulls => plots::pulls::render(&serde_json::from_str(artifact_json)?, config),
    }
}

pub fn render_to_bytes(artifact_json: &str, kind: &str, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    let format: OutputFormat = format.parse()?;
    let svg = render_svg(artifact_json, kind, config)?;
    match format {
        OutputFormat::Svg => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        OutputFormat::Png => output::png::svg_to_png(&svg, config.output.dpi),
    }
}

/// Write the plot to `path`; the extension picks the format, SVG when absent.
pub fn render_to_file(artifact_json: &str, kind: &str, path: &Path, config: &VizConfig) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
    let bytes = render_to_bytes(artifact_json, kind, ext, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
