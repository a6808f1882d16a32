//! facility-finder - runs the rehab facility property pipeline

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facility_core::config::{FacilityConfig, LlmProviderKind};
use facility_core::finder::FacilityFinder;
use facility_core::report::ReportWriter;

#[derive(Parser)]
#[command(name = "facility-finder")]
#[command(about = "Find and vet properties for rehabilitation facilities", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Area to search
    #[arg(long, env = "FACILITY_LOCATION")]
    location: Option<String>,

    /// Maximum purchase price in USD
    #[arg(long, env = "FACILITY_BUDGET")]
    budget: Option<f64>,

    /// Minimum number of bedrooms
    #[arg(long)]
    min_bedrooms: Option<u32>,

    /// Where to write the recommendation
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file, replacing facility.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the offline provider instead of a remote LLM
    #[arg(long)]
    offline: bool,

    /// Skip the concurrent per-stage fan-out
    #[arg(long)]
    skip_fanout: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the stage tools
    Tools,
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tools) => {
            let registry =
                facility_core::tools::stage_registry().context("building tool registry")?;
            for tool in registry.list() {
                println!("{:<22} {}", tool.name, tool.description);
            }
            return Ok(());
        }
        Some(Commands::Version) => {
            println!("facility-finder {}", env!("CARGO_PKG_VERSION"));
            println!("facility-core {}", facility_core::VERSION);
            return Ok(());
        }
        None => {}
    }

    let mut config = match &cli.config {
        Some(path) => FacilityConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => FacilityConfig::load().context("loading configuration")?,
    };
    apply_overrides(&mut config, &cli);

    facility_core::logging::init(&config.logging).context("initializing logging")?;

    let criteria = config.search.clone();
    let report_path = config.report.output_path.clone();
    let run_fanout = config.workflow.run_fanout;

    let finder = FacilityFinder::from_config(config)
        .await
        .context("building stage agents")?;

    if run_fanout {
        let results = finder.run_fanout().await.context("running fan-out")?;
        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(tasks = results.len(), failed, "fan-out complete");
    }

    let recommendation = finder
        .find_rehab_facility_property(&criteria)
        .await
        .context("running the facility pipeline")?;

    println!("Final Property Recommendation:");
    println!("{}", recommendation.text);

    ReportWriter::new(&report_path)
        .write(&recommendation)
        .await
        .with_context(|| format!("writing report to {}", report_path.display()))?;

    Ok(())
}

fn apply_overrides(config: &mut FacilityConfig, cli: &Cli) {
    if let Some(location) = &cli.location {
        config.search.location = location.clone();
    }
    if let Some(budget) = cli.budget {
        config.search.budget = budget;
    }
    if let Some(min_bedrooms) = cli.min_bedrooms {
        config.search.min_bedrooms = min_bedrooms;
    }
    if let Some(output) = &cli.output {
        config.report.output_path = output.clone();
    }
    if cli.offline {
        config.llm.provider = LlmProviderKind::Offline;
    }
    if cli.skip_fanout {
        config.workflow.run_fanout = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["facility-finder"]);
        let mut config = FacilityConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.search.location, "South Florida");
        assert_eq!(config.search.min_bedrooms, 10);
        assert!(config.workflow.run_fanout);
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAI);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "facility-finder",
            "--location",
            "Tampa",
            "--budget",
            "900000",
            "--min-bedrooms",
            "12",
            "--output",
            "out/report.txt",
            "--offline",
            "--skip-fanout",
        ]);
        let mut config = FacilityConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.search.location, "Tampa");
        assert_eq!(config.search.budget, 900_000.0);
        assert_eq!(config.search.min_bedrooms, 12);
        assert_eq!(config.report.output_path, PathBuf::from("out/report.txt"));
        assert_eq!(config.llm.provider, LlmProviderKind::Offline);
        assert!(!config.workflow.run_fanout);
    }

    #[test]
    fn test_tools_subcommand_parses() {
        let cli = Cli::parse_from(["facility-finder", "tools"]);
        assert!(matches!(cli.command, Some(Commands::Tools)));
    }
}
