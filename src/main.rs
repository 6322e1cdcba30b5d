use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use fingerprint_compare::fingerprint::{
    ComparisonConfig, ComparisonPipeline, MatchInput, PatternAnalyzer, Raster, RequestContext,
    TiffArtifactStore,
};
use fingerprint_compare::logger;

const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

#[derive(Parser)]
#[command(name = "fingerprint-compare", version, about = "1:1 fingerprint comparison")]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two fingerprint images
    Compare {
        #[arg(long)]
        first: PathBuf,
        #[arg(long)]
        second: PathBuf,
        /// Directory receiving the visualization TIFFs
        #[arg(long, default_value = "artifacts")]
        out_dir: PathBuf,
        /// JSON file with configuration overrides
        #[arg(long)]
        config: Option<PathBuf>,
        /// Match the images as given instead of their enhanced versions
        #[arg(long)]
        raw_match: bool,
        /// Write the report here instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,
        /// Request id naming the artifacts; random when omitted
        #[arg(long)]
        request_id: Option<Uuid>,
    },
    /// Print the pattern and quality analysis of one image
    Analyze {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(&cli.log_level);

    match cli.command {
        Command::Compare { first, second, out_dir, config, raw_match, json, request_id } => {
            let mut config = load_config(config.as_deref())?;
            if raw_match {
                config.match_input = MatchInput::Raw;
            }
            let store = TiffArtifactStore::new(&out_dir)
                .with_context(|| format!("cannot use artifact directory {}", out_dir.display()))?;
            info!("Visualizations go to {}", store.root().display());
            let pipeline = ComparisonPipeline::new(config, store)?;

            let a = load_raster(&first)?;
            let b = load_raster(&second)?;
            let ctx = request_id.map(RequestContext::with_id).unwrap_or_default();
            let report = pipeline.compare_with_context(&a, &b, &ctx)?;

            info!(
                "{} | primary {:.1} | secondary {:.1} | quality {:.1}/{:.1}",
                report.recommendation,
                report.match_result.primary_score(),
                report.match_result.secondary_score(),
                report.first.analysis.quality().value(),
                report.second.analysis.quality().value()
            );

            let body = serde_json::to_string_pretty(&report)?;
            match json {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("cannot write report to {}", path.display()))?;
                    info!("Report written to {}", path.display());
                }
                None => println!("{}", body),
            }
        }
        Command::Analyze { image, config } => {
            let config = load_config(config.as_deref())?;
            let analyzer = PatternAnalyzer::new(config.analysis)?;
            let result = analyzer.analyze(&load_raster(&image)?)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ComparisonConfig> {
    let Some(path) = path else {
        return Ok(ComparisonConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config: ComparisonConfig =
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn load_raster(path: &Path) -> anyhow::Result<Raster> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        bail!("unsupported image type {:?} for {}", extension, path.display());
    }

    let image = image::open(path)
        .with_context(|| format!("cannot decode {}", path.display()))?
        .to_luma8();
    info!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(Raster::from_gray_image(image)?)
}
