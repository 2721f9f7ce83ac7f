//! ABCD background-estimation CLI

mod config;
mod naming;
mod output;
mod run;
mod sources;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::output::{load_viz_config, write_json};
use crate::run::RunArgs;
use crate::sources::{HistogramSource, InputFormat};

#[derive(Parser)]
#[command(name = "abcd")]
#[command(about = "ABCD ratio-fit background estimation")]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combined data + background estimate: plots, ratio fits and the prediction file
    Estimate {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Single-sample MC closure test on each background sample and on their sum
    Closure {
        #[command(flatten)]
        run: RunArgs,

        /// Restrict the per-sample tests to these samples (repeatable)
        #[arg(long = "sample")]
        samples: Vec<String>,
    },

    /// List the histograms stored in a ROOT or JSON histogram file
    ListKeys {
        /// Input file
        file: PathBuf,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-render a plot artifact
    Render {
        /// Artifact kind: closure, ratio_fit or pulls
        #[arg(long)]
        kind: String,

        /// Artifact JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Image path; defaults to the input with the image extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image format when no output path is given
        #[arg(long, default_value = "svg")]
        ext: String,

        /// Plot config (YAML) merged over the theme
        #[arg(long)]
        viz_config: Option<PathBuf>,

        /// Plot theme: cms or minimal
        #[arg(long, default_value = "cms")]
        theme: String,

        /// Integrated luminosity [fb^-1] shown in the header
        #[arg(long)]
        lumi: Option<f64>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    // Bad arguments print the usage and end the run without an error status.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(0);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Estimate { run } => run::cmd_estimate(run),
        Commands::Closure { run, samples } => run::cmd_closure(run, &samples),
        Commands::ListKeys { file, output } => cmd_list_keys(&file, output.as_deref()),
        Commands::Render { kind, input, output, ext, viz_config, theme, lumi } => {
            cmd_render(&kind, &input, output.as_deref(), &ext, viz_config.as_deref(), &theme, lumi)
        }
        Commands::Version => {
            println!("abcd {}", abcd_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_list_keys(file: &Path, output: Option<&Path>) -> Result<()> {
    let source = HistogramSource::open(file, InputFormat::from_path(file))?;
    let keys = source.keys().with_context(|| format!("listing keys of {}", file.display()))?;
    tracing::info!(n_keys = keys.len(), "keys listed");
    write_json(output, &serde_json::to_value(keys)?)
}

fn cmd_render(
    kind: &str,
    input: &Path,
    output: Option<&Path>,
    ext: &str,
    viz_config: Option<&Path>,
    theme: &str,
    lumi: Option<f64>,
) -> Result<()> {
    let json = std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let config = load_viz_config(theme, viz_config, lumi)?;
    let path = output.map(Path::to_path_buf).unwrap_or_else(|| input.with_extension(ext));
    abcd_viz_render::render_to_file(&json, kind, &path, &config)
        .with_context(|| format!("rendering {} artifact {}", kind, input.display()))?;
    tracing::info!(path = %path.display(), "rendered");
    println!("{}", path.display());
    Ok(())
}
