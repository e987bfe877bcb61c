use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ai_image_forensics::{
    ForensicsAnalyzer,
    config::{DetectorConfig, SightengineCredentials},
    detection::{AiDetector, sightengine::SightengineClient},
    report::{
        JsonReport,
        visualization::{AnalysisVisualization, Visualizer},
    },
};

#[derive(Parser)]
#[command(
    name = "ai-image-detect",
    about = "Estimate how likely an image is AI-generated from forensic signals",
    version,
    after_help = "Set API_USER and API_SECRET to blend in the Sightengine genai verdict."
)]
struct Cli {
    /// Image file to analyze
    input: PathBuf,

    /// Skip the external detector even when credentials are set
    #[arg(long)]
    local_only: bool,

    /// External detector timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Write breakdown chart and heatmaps into this directory
    #[arg(long)]
    charts: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_detector(cli: &Cli) -> Option<SightengineClient> {
    if cli.local_only {
        return None;
    }

    let credentials = SightengineCredentials::from_env()?;
    let config = DetectorConfig {
        timeout: Duration::from_secs(cli.timeout),
        ..DetectorConfig::default()
    };

    match SightengineClient::new(credentials, config) {
        Ok(client) => Some(client),
        Err(e) => {
            log::warn!("external detector unavailable: {e}");
            None
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let analyzer = match ForensicsAnalyzer::new(&cli.input) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: cannot analyze {}: {e}", cli.input.display());
            process::exit(1);
        }
    };

    let detector = build_detector(&cli);
    let analysis = match analyzer.hybrid_analysis(detector.as_ref().map(|d| d as &dyn AiDetector)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: analysis failed: {e}");
            process::exit(1);
        }
    };

    if let Some(dir) = &cli.charts {
        let rendered = AnalysisVisualization::render(&analysis, &Visualizer::new());
        if let Err(e) = rendered.save_all(dir) {
            eprintln!("Error: cannot write charts to {}: {e}", dir.display());
            process::exit(1);
        }
    }

    let report = JsonReport::from(&analysis);
    let json = if cli.compact {
        report.to_json_compact()
    } else {
        report.to_json()
    };

    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: cannot serialize report: {e}");
            process::exit(1);
        }
    }
}
