//! climate-concierge CLI entry point.
//!
//! Loads configuration, initializes logging and delegates to the CLI module
//! for command handling.

use climate_concierge::config::ConciergeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = climate_concierge::cli::parse_cli();
    let config = ConciergeConfig::from_env()?;

    // Held until exit so buffered log lines reach the file.
    let _log_guard =
        climate_concierge::telemetry::init_telemetry(cli.log_level.as_deref(), &config.observability)?;

    climate_concierge::cli::run_with_cli(cli, config).await
}
