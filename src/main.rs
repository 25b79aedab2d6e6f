#![forbid(unsafe_code)]

mod catalog;
mod config;
mod constants;
mod engine;
mod errors;
mod gui;
mod report;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use catalog::Catalog;
use config::Config;
use engine::ConfigurationSnapshot;
use report::{ExportGate, ReportFont, ReportInput};
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "server-configurator", version, about = "Configure a server and export a PDF summary")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog JSON replacing the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the configurator window (default)
    Gui,
    /// Serve the web front end and the PDF export API
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Write the PDF for a configuration snapshot file
    Export {
        /// Snapshot JSON: {"selectedServerId": 1, "addedParts": {...}}
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn init_logging(config: &Config) -> Result<()> {
    // LOG_LEVEL wins over the config file
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.global.log_level.clone());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")
}

fn load_catalog(cli: &Cli, config: &Config) -> Result<Arc<Catalog>> {
    let path = cli.catalog.as_deref().or(config.catalog_path.as_deref());
    let catalog = Catalog::load_or_embedded(path).context("Failed to load part catalog")?;
    info!(
        server = %catalog.server.name,
        cpus = catalog.compatible_parts.cpu.len(),
        gpus = catalog.compatible_parts.gpu.len(),
        memory = catalog.compatible_parts.memory.len(),
        "Catalog ready"
    );
    Ok(Arc::new(catalog))
}

fn export_snapshot(config: &Config, catalog: Arc<Catalog>, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read snapshot {}", input.display()))?;
    let snapshot: ConfigurationSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", input.display()))?;

    let font = ReportFont::from_config(config.export.font_path.as_deref())?;
    let output = output.unwrap_or_else(|| config.export.output_path());
    let input = ReportInput {
        snapshot,
        catalog,
        policy: config.engine.power_policy,
    };

    let written = report::export_to_file(&input, &font, &output)?;
    println!("PDF written to {}", written.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_logging(&config)?;
    info!(policy = ?config.engine.power_policy, "Configuration loaded");

    let catalog = load_catalog(&cli, &config)?;

    match cli.command {
        None | Some(Command::Gui) => gui::run_gui(&config, catalog),
        Some(Command::Serve { bind, static_dir }) => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = ServerState {
                catalog,
                policy: config.engine.power_policy,
                gate: ExportGate::new(),
                font: ReportFont::from_config(config.export.font_path.as_deref())?,
                static_dir: static_dir.unwrap_or_else(|| config.server.static_dir.clone()),
                file_name: config.export.file_name.clone(),
            };
            server::run(state, &bind)
        }
        Some(Command::Export { input, output }) => export_snapshot(&config, catalog, &input, output),
    }
}
