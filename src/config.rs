use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use common::BaselineMetrics;
use moka::future::Cache;
use sea_orm::Database;
use tracing::{debug, info};

use crate::feeds::{
    DonationFeedProvider, FallbackSource, MetabaseSource, MockSource, RetryingSource,
};
use crate::schemas::AppState;

/// Where donation records are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FeedMode {
    /// Metabase, falling back to generated data when it is unreachable
    #[default]
    Live,
    /// Generated data only
    Mock,
}

/// Donation feed settings shared by the server and the report command.
#[derive(Debug, Clone, Args)]
pub struct FeedConfig {
    /// Donation feed to use
    #[arg(long = "feed", env = "DONATION_FEED", value_enum, default_value_t = FeedMode::Live)]
    pub mode: FeedMode,

    /// Base URL of the Metabase instance
    #[arg(long, env = "METABASE_URL", default_value = "https://metabase.efb.eg")]
    pub metabase_url: String,

    /// Metabase API key; without it the live feed always falls back
    #[arg(long, env = "METABASE_API_KEY", hide_env_values = true)]
    pub metabase_api_key: Option<String>,
}

/// Everything needed to build the application state.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Database URL
    ///
    /// For SQLite databases, use:
    ///   - sqlite:///absolute/path/to/database.sqlite (absolute path)
    ///   - sqlite://impactboard.db?mode=rwc (relative, created when missing)
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite://impactboard.db?mode=rwc")]
    pub database_url: String,

    #[command(flatten)]
    pub feed: FeedConfig,
}

/// Builds the donation feed selected by the configuration.
pub fn build_feed(config: &FeedConfig) -> Result<Arc<dyn DonationFeedProvider>> {
    match config.mode {
        FeedMode::Live => {
            debug!("Using Metabase feed at {}", config.metabase_url);
            let metabase =
                MetabaseSource::new(config.metabase_url.clone(), config.metabase_api_key.clone())?;
            Ok(Arc::new(FallbackSource::new(
                RetryingSource::new(metabase),
                MockSource::default(),
            )))
        }
        FeedMode::Mock => {
            debug!("Using generated donation feed");
            Ok(Arc::new(MockSource::default()))
        }
    }
}

/// Cache for donation feed results, five minute freshness.
pub fn build_cache<V: Clone + Send + Sync + 'static>() -> Cache<String, V> {
    Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300))
        .build()
}

/// Initialize application state from the given configuration
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    Ok(AppState {
        db,
        cache: build_cache(),
        feed: build_feed(&config.feed)?,
        baseline: BaselineMetrics::fy2024_25(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AppConfig,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "impactboard",
            "--database-url",
            "sqlite::memory:",
            "--feed",
            "mock",
            "--metabase-url",
            "http://localhost:3001",
        ]);

        assert_eq!(cli.config.database_url, "sqlite::memory:");
        assert_eq!(cli.config.feed.mode, FeedMode::Mock);
        assert_eq!(cli.config.feed.metabase_url, "http://localhost:3001");
    }

    #[tokio::test]
    async fn test_build_feed_for_each_mode() {
        for mode in [FeedMode::Live, FeedMode::Mock] {
            let config = FeedConfig {
                mode,
                metabase_url: "http://127.0.0.1:9".to_string(),
                metabase_api_key: None,
            };
            assert!(build_feed(&config).is_ok());
        }
    }
}
