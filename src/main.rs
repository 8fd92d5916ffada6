use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tooldata_rs::config::validation::validate_config;
use tooldata_rs::config::{load_config, AppConfig};
use tooldata_rs::corpus::{self, Corpus};
use tooldata_rs::observability::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "tooldata")]
#[command(version)]
#[command(about = "Normalize API-Bank and ToolAlpaca into tool-use conversations.", long_about = None)]
struct Cli {
    /// YAML config file; without it every setting uses its default.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Root of the downloaded corpora.
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Root for converted conversations.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Root for tool catalogs.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// DEBUG, INFO, WARNING, ERROR, CRITICAL or DISABLED.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// text or json.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Convert the API-Bank train and test levels.
    ApiBank,
    /// Convert ToolAlpaca's train data.
    ToolAlpaca,
    /// Convert both corpora.
    All,
}

impl From<Command> for Corpus {
    fn from(command: Command) -> Self {
        match command {
            Command::ApiBank => Corpus::ApiBank,
            Command::ToolAlpaca => Corpus::ToolAlpaca,
            Command::All => Corpus::All,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {e}");
            eprintln!("Please copy 'config.example.yaml' to 'config.yaml' and modify as needed.");
            std::process::exit(1);
        }),
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    if let Err(e) = validate_config(&config) {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    init_tracing(&config.features.log_level, &config.features.log_format);

    if let Err(e) = corpus::run(&config, cli.command.into()) {
        tracing::error!("conversion aborted: {e}");
        eprintln!("Conversion failed: {e}");
        std::process::exit(1);
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(source) = &cli.source {
        config.paths.source_root.clone_from(source);
    }
    if let Some(output) = &cli.output {
        config.paths.output_root.clone_from(output);
    }
    if let Some(catalog) = &cli.catalog {
        config.paths.catalog_root.clone_from(catalog);
    }
    if let Some(level) = &cli.log_level {
        config.features.log_level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.features.log_format.clone_from(format);
    }
}
