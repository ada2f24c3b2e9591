use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use crate::config::{AppConfig, FeedConfig};
use commands::{
    OutputFormat, init_database, migrate_and_serve, print_report, run_scenario, serve,
};

#[derive(Parser)]
#[command(name = "impactboard")]
#[command(about = "Humanitarian impact dashboard: API server, donation report and scenario calculator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        #[command(flatten)]
        config: AppConfig,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
        bind_address: String,
    },
    /// Initialize the database using migrations
    InitDb {
        /// Database URL
        ///
        /// For SQLite databases, use:
        ///   - sqlite:///absolute/path/to/database.sqlite?mode=rwc (absolute path)
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Apply pending migrations, then start the web server
    MigrateAndServe {
        #[command(flatten)]
        config: AppConfig,

        /// Bind address for the web server
        #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
        bind_address: String,
    },
    /// Print the monthly donation series and summary
    Report {
        #[command(flatten)]
        feed: FeedConfig,
    },
    /// Calculate a what-if scenario against the reference baseline
    ///
    /// Example:
    ///   impactboard scenario --factor food-prices=15 --factor donor-sentiment=-5
    Scenario {
        /// Factor deviation in percent, as NAME=VALUE; repeatable
        #[arg(short, long = "factor", value_name = "NAME=VALUE")]
        factors: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Keep reading NAME=VALUE lines from stdin and print settled results
        #[arg(short, long)]
        interactive: bool,

        /// Quiet period before an interactive change is recalculated
        #[arg(long, env = "SCENARIO_DEBOUNCE_MS", default_value_t = 50)]
        debounce_ms: u64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve {
                config,
                bind_address,
            } => {
                serve(&config, &bind_address).await?;
            }
            Commands::InitDb { database_url } => {
                init_database(&database_url).await?;
            }
            Commands::MigrateAndServe {
                config,
                bind_address,
            } => {
                migrate_and_serve(&config, &bind_address).await?;
            }
            Commands::Report { feed } => {
                print_report(&feed).await?;
            }
            Commands::Scenario {
                factors,
                format,
                interactive,
                debounce_ms,
            } => {
                run_scenario(&factors, format, interactive, debounce_ms).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scenario_arguments_parse() {
        let cli = Cli::parse_from([
            "impactboard",
            "scenario",
            "--factor",
            "food-prices=15",
            "-f",
            "inflation=3.5",
            "--format",
            "json",
        ]);

        match cli.command {
            Commands::Scenario {
                factors, format, ..
            } => {
                assert_eq!(factors, vec!["food-prices=15", "inflation=3.5"]);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected scenario command"),
        }
    }
}
