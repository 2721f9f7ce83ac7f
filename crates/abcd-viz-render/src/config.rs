//! Plot configuration: a built-in [`Theme`] with optional YAML overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{Color, Palette};
use crate::theme::Theme;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: Theme,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub palette: Palette,
    /// Colour per legend label, overriding `colors` and `palette`.
    pub sample_colors: BTreeMap<String, Color>,
    pub output: OutputConfig,
    pub closure: ClosureConfig,
    pub ratio_fit: RatioFitPlotConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Theme::Cms.base_config()
    }
}

impl VizConfig {
    /// `sample_colors[label]`, else `fallback`.
    pub fn color_for(&self, label: &str, fallback: Color) -> Color {
        self.sample_colors.get(label).copied().unwrap_or(fallback)
    }
}

/// Canvas size in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self { width: 576.0, height: 576.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, label_size: 11.0, tick_size: 9.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub ticks: TickDirection,
    /// Repeat the ticks on the top and right frame edges.
    pub mirror_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self { ticks: TickDirection::In, mirror_ticks: true, tick_length: 5.0, minor_tick_length: 3.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    /// Used when the artifact carries no status of its own.
    pub status: String,
    pub sqrt_s_tev: f64,
    pub lumi_fb_inv: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self { name: "CMS".into(), status: "Preliminary".into(), sqrt_s_tev: 13.0, lumi_fb_inv: 2.6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub observed: Color,
    pub predicted: Color,
    pub band: Color,
    pub data_fit: Color,
    pub background_fit: Color,
    pub unity_line: Color,
    pub tolerance_line: Color,
    pub positive_pull: Color,
    pub negative_pull: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        let red = Color::rgb(0xe4, 0x25, 0x36);
        let blue = Color::rgb(0x57, 0x90, 0xfc);
        Self {
            observed: Color::BLACK,
            predicted: Color::rgb(0x33, 0x33, 0xcc),
            band: Color::rgb(0x9c, 0x9c, 0xa1),
            data_fit: red,
            background_fit: blue,
            unity_line: red,
            tolerance_line: Color::rgb(0x2c, 0xa0, 0x2c),
            positive_pull: blue,
            negative_pull: red,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raster resolution for PNG output.
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dpi: 220 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    pub ratio_y_range: [f64; 2],
    /// Dashed lines drawn at `1 ± tolerance` in the ratio panel.
    pub tolerance: f64,
    pub show_chi2: bool,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self { ratio_y_range: [0.0, 2.0], tolerance: 0.1, show_chi2: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioFitPlotConfig {
    /// Fixed y range; derived from the points when absent.
    pub y_range: Option<[f64; 2]>,
}

/// Theme base config with `user_yaml` merged over it key by key.
///
/// A file holding only `experiment: {lumi_fb_inv: 36}` keeps every other
/// theme value. A `theme` key in the YAML takes precedence over `theme`.
pub fn resolve_config(theme: &str, user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let config_error = |e: serde_yaml_ng::Error| crate::RenderError::Config(e.to_string());

    let Some(yaml) = user_yaml else {
        return Ok(theme.parse::<Theme>()?.base_config());
    };
    let user: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).map_err(config_error)?;
    let theme: Theme = user.get("theme").and_then(|t| t.as_str()).unwrap_or(theme).parse()?;

    let mut merged = serde_yaml_ng::to_value(theme.base_config()).map_err(config_error)?;
    overlay(&mut merged, user);
    serde_yaml_ng::from_value(merged).map_err(config_error)
}

/// Recursive mapping merge; a null in `user` keeps the base value.
fn overlay(base: &mut serde_yaml_ng::Value, user: serde_yaml_ng::Value) {
    use serde_yaml_ng::Value;
    match (base, user) {
        (Value::Mapping(base), Value::Mapping(user)) => {
            for (key, value) in user {
                if let Some(slot) = base.get_mut(&key) {
                    overlay(slot, value);
                } else {
                    base.insert(key, value);
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}
