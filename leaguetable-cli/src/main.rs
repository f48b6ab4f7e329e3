//! LeagueTable CLI — football standings pipeline commands.
//!
//! Commands:
//! - `run` — execute the full extract/transform/load pipeline once
//! - `check-config` — validate environment configuration and print the
//!   resolved settings without touching the network

use anyhow::Result;
use clap::{Parser, Subcommand};
use leaguetable_core::RunStatus;
use leaguetable_runner::{run_pipeline, PipelineConfig};

mod logging;

#[derive(Parser)]
#[command(
    name = "leaguetable",
    about = "LeagueTable CLI — football standings ETL pipeline"
)]
struct Cli {
    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once: extract both sources, transform, load, alert.
    Run,
    /// Validate configuration and print the resolved settings.
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run => {
            let config = PipelineConfig::from_env()?;
            let report = run_pipeline(&config)?;

            println!();
            println!("=== Pipeline Run ===");
            println!("Status:             {}", report.status);
            println!("API-Sports teams:   {}", report.api_sports_teams);
            println!("API-Football teams: {}", report.api_football_teams);
            println!(
                "Duration:           {:.2}s",
                report.metrics.pipeline_duration_seconds
            );
            println!();
            println!("{}", report.error_report);

            if report.status == RunStatus::Failed {
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            let config = PipelineConfig::from_env()?;

            println!("Configuration OK");
            println!("API-Sports key:     {}", mask(&config.api_sports_key));
            println!("API-Football key:   {}", mask(&config.api_football_key));
            println!("Season:             {}", config.season);
            println!("API-Sports league:  {}", config.api_sports_league);
            println!("API-Football league: {}", config.api_football_league);
            println!("Warehouse dir:      {}", config.warehouse_dir.display());
            match &config.artifacts_dir {
                Some(dir) => println!("Artifacts dir:      {}", dir.display()),
                None => println!("Artifacts dir:      (disabled)"),
            }
            match &config.alert {
                Some(alert) => println!(
                    "Alerts:             {} via {}:{}",
                    alert.to_address, alert.smtp_host, alert.smtp_port
                ),
                None => println!("Alerts:             (disabled)"),
            }
        }
    }
    Ok(())
}

/// Show only the tail of a secret, enough to tell keys apart.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
