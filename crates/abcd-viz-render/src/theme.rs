use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Palette;
use crate::config::{AxesConfig, ExperimentConfig, FigureConfig, FontConfig, TickDirection, VizConfig};

/// Built-in starting points for [`VizConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// CMS publication style: inward ticks on all sides, experiment header.
    #[default]
    Cms,
    /// Outward ticks on two sides, no header.
    Minimal,
}

impl Theme {
    pub fn base_config(self) -> VizConfig {
        let cms = VizConfig {
            theme: Theme::Cms,
            figure: FigureConfig::default(),
            font: FontConfig::default(),
            axes: AxesConfig::default(),
            experiment: ExperimentConfig::default(),
            colors: Default::default(),
            palette: Palette::CmsPetroff6,
            sample_colors: Default::default(),
            output: Default::default(),
            closure: Default::default(),
            ratio_fit: Default::default(),
        };
        match self {
            Theme::Cms => cms,
            Theme::Minimal => VizConfig {
                theme: Theme::Minimal,
                figure: FigureConfig { width: 432.0, height: 432.0 },
                font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0 },
                axes: AxesConfig {
                    ticks: TickDirection::Out,
                    mirror_ticks: false,
                    tick_length: 4.0,
                    minor_tick_length: 2.0,
                },
                experiment: ExperimentConfig {
                    name: String::new(),
                    status: String::new(),
                    sqrt_s_tev: 0.0,
                    lumi_fb_inv: 0.0,
                },
                palette: Palette::Tableau10,
                ..cms
            },
        }
    }
}

impl FromStr for Theme {
    type Err = crate::RenderError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cms" | "" => Ok(Theme::Cms),
            "minimal" => Ok(Theme::Minimal),
            other => Err(crate::RenderError::Config(format!(
                "unknown theme '{other}' (expected cms or minimal)"
            ))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Cms => "cms",
            Theme::Minimal => "minimal",
        })
    }
}
