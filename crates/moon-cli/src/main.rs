mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use moon_core::MonitorConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moon")]
#[command(about = "Sleep detection from device orientation and heart rate", long_about = None)]
struct Cli {
    /// Config file (defaults to the moon data directory's config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll motion and heart rate until the wearer is likely sleeping
    Run {
        /// Scripted sensor scenario (TOML); uses a built-in one if omitted
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Print each status as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Classify a single set of readings
    Classify {
        /// Roll in radians
        #[arg(long, allow_hyphen_values = true)]
        roll: f64,
        /// Pitch in radians
        #[arg(long, allow_hyphen_values = true)]
        pitch: f64,
        /// Mean heart rate in beats/min; omit for "no data"
        #[arg(long)]
        heart_rate: Option<f64>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = MonitorConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { scenario, json } => {
            commands::run::run_command(config, scenario.as_deref(), json).await
        }
        Commands::Classify {
            roll,
            pitch,
            heart_rate,
        } => {
            let decision = commands::classify::classify_command(&config, roll, pitch, heart_rate);
            println!("{decision}");
            Ok(())
        }
        Commands::Config => commands::config::config_command(&config, cli.config.as_deref()),
    }
}
