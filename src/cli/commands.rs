//! CLI command definitions for the climate concierge.

use clap::Parser;
use serde_json::{json, Value};
use tracing::info;

use crate::agents::RunRequest;
use crate::config::ConciergeConfig;
use crate::pipeline::{PipelineOrchestrator, PlanArtifact, RunResult};

const DEFAULT_ORGANIZER: &str = "Neighborhood Climate Team";
const DEFAULT_SCALE: &str = "Pilot";
const DEFAULT_COMMUNITY_PROFILE: &str =
    "Frontline neighborhood seeking resilient infrastructure upgrades.";

/// Community Climate Action Concierge.
#[derive(Parser)]
#[command(name = "climate-concierge")]
#[command(about = "Turn a community climate idea into a researched, funded, scored action plan")]
#[command(version)]
#[command(
    long_about = "climate-concierge runs a fixed sequence of agents (liaison, policy research, funding, planning, outreach, evaluation) over an organizer's request and writes the resulting plan as JSON.\n\nExample usage:\n  climate-concierge run --city Oakland --state CA --initiative \"Solarize the community center roof\" --allow-stub-llm"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides `LOG_LEVEL`.
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full agent pipeline for one request.
    Run(RunArgs),
}

/// Arguments for `climate-concierge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Organizer or team leading the initiative.
    #[arg(long, default_value = DEFAULT_ORGANIZER)]
    pub organizer: String,

    /// City (e.g., Oakland).
    #[arg(long)]
    pub city: String,

    /// State postal code (e.g., CA).
    #[arg(long)]
    pub state: String,

    /// Initiative description.
    #[arg(long)]
    pub initiative: String,

    /// Scale (Pilot/Medium/Large).
    #[arg(long, default_value = DEFAULT_SCALE)]
    pub scale: String,

    /// Community profile or notes.
    #[arg(long, default_value = DEFAULT_COMMUNITY_PROFILE)]
    pub community_profile: String,

    /// Reuse a live session instead of starting a fresh one.
    #[arg(long)]
    pub session_id: Option<String>,

    /// Enable the rule-based offline responder when no model endpoint is set.
    #[arg(long, default_value = "false")]
    pub allow_stub_llm: bool,
}

impl RunArgs {
    fn request(&self) -> RunRequest {
        RunRequest::new(
            self.organizer.clone(),
            self.city.clone(),
            self.state.clone(),
            self.initiative.clone(),
            self.scale.clone(),
            self.community_profile.clone(),
        )
    }
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli(), ConciergeConfig::from_env()?).await
}

/// Run the CLI with the parsed arguments and loaded configuration.
pub async fn run_with_cli(cli: Cli, config: ConciergeConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_pipeline_command(args, config).await,
    }
}

async fn run_pipeline_command(args: RunArgs, mut config: ConciergeConfig) -> anyhow::Result<()> {
    if args.allow_stub_llm {
        config = config.with_allow_stub_llm(true);
    }

    let orchestrator = PipelineOrchestrator::from_config(config).await?;
    info!(city = %args.city, initiative = %args.initiative, "Running concierge pipeline");

    let result = orchestrator
        .run_with_session(args.request(), args.session_id.as_deref())
        .await?;

    print_summary(&result)?;
    Ok(())
}

fn print_summary(result: &RunResult) -> anyhow::Result<()> {
    println!("\nRun completed. Run ID: {}", result.run_id);
    println!("Plan saved to: {}", result.artifact_path.display());
    println!("\n--- Highlights ---");
    println!("{}", serde_json::to_string_pretty(&highlights(&result.plan))?);
    Ok(())
}

/// The impact estimate, grant titles and average score of a plan.
pub fn highlights(plan: &PlanArtifact) -> Value {
    let grant_titles: Vec<&str> = plan
        .funding
        .grants
        .iter()
        .map(|grant| grant.title.as_str())
        .collect();

    json!({
        "Impact": plan.plan.impact,
        "Top Grants": grant_titles,
        "Average Score": plan.evaluation.average_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from([
            "climate-concierge",
            "run",
            "--city",
            "Oakland",
            "--state",
            "CA",
            "--initiative",
            "Solarize the community center roof",
        ])
        .expect("valid arguments");

        assert!(cli.log_level.is_none());
        let Commands::Run(args) = cli.command;
        assert_eq!(args.organizer, DEFAULT_ORGANIZER);
        assert_eq!(args.scale, DEFAULT_SCALE);
        assert!(!args.allow_stub_llm);
        assert!(args.session_id.is_none());

        let request = args.request();
        assert_eq!(request.community_profile, DEFAULT_COMMUNITY_PROFILE);
    }

    #[test]
    fn test_run_args_flags() {
        let cli = Cli::try_parse_from([
            "climate-concierge",
            "--log-level",
            "debug",
            "run",
            "--city",
            "Austin",
            "--state",
            "TX",
            "--initiative",
            "Tree canopy",
            "--scale",
            "Large",
            "--session-id",
            "abc",
            "--allow-stub-llm",
        ])
        .expect("valid arguments");

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Run(args) = cli.command;
        assert!(args.allow_stub_llm);
        assert_eq!(args.session_id.as_deref(), Some("abc"));
        assert_eq!(args.scale, "Large");
    }

    #[test]
    fn test_city_is_required() {
        let result = Cli::try_parse_from([
            "climate-concierge",
            "run",
            "--state",
            "CA",
            "--initiative",
            "Solar",
        ]);
        assert!(result.is_err());
    }
}
