use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "termpilot")]
#[command(about = "Drive interactive coding CLIs with a remote LLM acting as project manager")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.termpilot/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session: drive a coding CLI toward a goal
    Run {
        /// What the assistant should accomplish
        goal: String,

        /// The coding CLI to drive (e.g. "claude", "codex", "gemini")
        #[arg(long, default_value = "claude")]
        cli: String,

        /// Wall-clock time limit in minutes
        #[arg(long)]
        time_limit: Option<u64>,

        /// Working directory for the assistant (defaults to current directory)
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Template directory copied into the working directory before start
        #[arg(long)]
        seed_from: Option<PathBuf>,

        /// Command auto-sent once the CLI has loaded (e.g. "/init")
        #[arg(long)]
        first_command: Option<String>,

        /// Extra guidance appended to the decision model's system prompt
        #[arg(long)]
        instructions: Option<String>,

        /// Decision model override
        #[arg(long)]
        model: Option<String>,

        /// API key (falls back to TERMPILOT_API_KEY, then the config file)
        #[arg(long)]
        api_key: Option<String>,

        /// Chat-completion endpoint override
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show previous session records
    Sessions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Run {
            goal,
            cli: cli_cmd,
            time_limit,
            directory,
            seed_from,
            first_command,
            instructions,
            model,
            api_key,
            base_url,
        } => cli::run::run_command(cli::run::RunArgs {
            config_path: cli.config,
            goal,
            cli_cmd,
            time_limit,
            directory,
            seed_from,
            first_command,
            instructions,
            model,
            api_key,
            base_url,
        }),
        Commands::Sessions => cli::sessions::sessions_command(),
    }
}
