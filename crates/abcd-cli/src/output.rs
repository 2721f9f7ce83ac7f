//! Writes plot artifacts (JSON) and their rendered images side by side.

use std::path::{Path, PathBuf};

use abcd_viz_render::config::VizConfig;
use anyhow::{Context, Result};
use serde::Serialize;

use crate::naming::RunNaming;

pub struct PlotWriter<'a> {
    pub out_dir: &'a Path,
    pub ext: &'a str,
    pub naming: &'a RunNaming,
    pub observable: &'a str,
    pub viz: &'a VizConfig,
}

impl PlotWriter<'_> {
    /// Write `<stem>.json` and `<stem>.<ext>`; returns the image path.
    pub fn write<T: Serialize>(&self, kind: &str, plot_type: &str, artifact: &T) -> Result<PathBuf> {
        let stem = self.naming.plot_stem(self.observable, plot_type);
        let json = serde_json::to_string_pretty(artifact)?;

        let json_path = self.out_dir.join(format!("{stem}.json"));
        std::fs::write(&json_path, &json).with_context(|| format!("writing {}", json_path.display()))?;

        let image_path = self.out_dir.join(format!("{stem}.{}", self.ext));
        abcd_viz_render::render_to_file(&json, kind, &image_path, self.viz)
            .with_context(|| format!("rendering {}", image_path.display()))?;
        tracing::info!(path = %image_path.display(), kind, "plot written");
        Ok(image_path)
    }
}

/// Pretty JSON to `path`, or stdout.
pub fn write_json(output: Option<&Path>, value: &serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Theme plus optional user YAML, with the luminosity from the command line.
pub fn load_viz_config(theme: &str, viz_config: Option<&Path>, lumi: Option<f64>) -> Result<VizConfig> {
    let yaml = viz_config
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()?;
    let mut config = abcd_viz_render::config::resolve_config(theme, yaml.as_deref())?;
    if let Some(lumi) = lumi {
        config.experiment.lumi_fb_inv = lumi;
    }
    Ok(config)
}
