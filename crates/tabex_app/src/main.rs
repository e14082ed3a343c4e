mod products;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tabex_core::{ExportConfig, logging};
use tabex_docs::{ExportCommand, ExportInvoker, ExportSummary};
use tracing::{error, info};

use crate::products::generate_products;

/// Export a product catalogue as XLSX and PDF, packed into one ZIP archive.
#[derive(Parser, Debug)]
#[command(name = "tabex", version)]
struct Cli {
    /// Destination archive (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file; defaults apply when it does not exist
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of synthetic products to export
    #[arg(long, default_value_t = 30)]
    count: u32,

    /// Maximum number of columns shown in the PDF table
    #[arg(long)]
    max_columns: Option<usize>,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file, if any, and applies command-line overrides.
    fn resolve_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load_from_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExportConfig::default(),
        };

        if let Some(output) = &self.output {
            config.destination = output.clone();
        }
        if let Some(max_columns) = self.max_columns {
            config.document.max_columns = max_columns;
        }
        config.validate()?;
        Ok(config)
    }

    /// Where the configuration came from, for logging once a subscriber exists.
    fn config_source(&self) -> String {
        match &self.config {
            Some(path) if path.exists() => format!("Loaded config from {}", path.display()),
            Some(path) => format!("No config at {}, using defaults", path.display()),
            None => "No config file given, using defaults".to_string(),
        }
    }
}

/// Registers one spreadsheet and one document command over the same records
/// and writes the archive.
fn export(config: &ExportConfig, count: u32) -> tabex_core::Result<ExportSummary> {
    let products = Arc::new(generate_products(count));
    info!(records = products.len(), "Exporting products");

    let mut invoker = ExportInvoker::from_config(config);
    invoker.add_command(ExportCommand::spreadsheet(
        products.clone(),
        config.spreadsheet.clone(),
    ))?;
    invoker.add_command(ExportCommand::document(products, config.document.clone()))?;
    invoker.create_files()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let _guard = match &cli.log_dir {
        Some(dir) => Some(logging::init_logging_to_dir(dir, &config.log_level)?),
        None => {
            logging::init_logging(&config.log_level)?;
            None
        }
    };
    info!("{}", cli.config_source());

    let summary = export(&config, cli.count).map_err(|e| {
        error!("Export failed: {e}");
        anyhow::anyhow!(e.user_message())
    })?;

    info!(
        destination = %summary.destination.display(),
        entries = %summary.entries.join(", "),
        "Done"
    );
    println!("Files created successfully.");
    Ok(())
}
