//! The `run` subcommand: start a terminal session and drive it to the goal.

use anyhow::Result;
use std::path::PathBuf;

use termpilot::{Config, LlmClient, Session, SessionOptions, ToolRegistry};

/// Resolved arguments for one run.
pub struct RunArgs {
    pub config_path: Option<PathBuf>,
    pub goal: String,
    pub cli_cmd: String,
    pub time_limit: Option<u64>,
    pub directory: Option<PathBuf>,
    pub seed_from: Option<PathBuf>,
    pub first_command: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

pub fn run_command(args: RunArgs) -> Result<()> {
    let mut config = Config::load(args.config_path.as_deref())?;

    // Flags beat the environment, the environment beats the config file.
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(base_url) = args.base_url {
        config.llm.base_url = base_url;
    }
    if let Some(api_key) = args
        .api_key
        .or_else(|| std::env::var("TERMPILOT_API_KEY").ok())
    {
        config.llm.api_key = api_key;
    }

    let service = LlmClient::new(config.llm)?;
    let driver = start_driver(&args.cli_cmd, args.directory.as_deref(), args.seed_from.as_deref())?;

    let mut session = Session::new(
        args.goal,
        driver,
        Box::new(service),
        ToolRegistry::new(),
        SessionOptions {
            time_limit_minutes: args.time_limit,
            first_command: args.first_command,
            instructions: args.instructions,
            ..SessionOptions::default()
        },
    );

    match session.run()? {
        Some(summary) => println!("\n{summary}"),
        None => println!("\nSession ended without a summary."),
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn start_driver(
    cli_cmd: &str,
    directory: Option<&std::path::Path>,
    seed_from: Option<&std::path::Path>,
) -> Result<Box<dyn termpilot::TerminalDriver>> {
    let driver = termpilot::driver::MacTerminal::start(cli_cmd, directory, seed_from)?;
    Ok(Box::new(driver))
}

#[cfg(not(target_os = "macos"))]
fn start_driver(
    _cli_cmd: &str,
    _directory: Option<&std::path::Path>,
    _seed_from: Option<&std::path::Path>,
) -> Result<Box<dyn termpilot::TerminalDriver>> {
    anyhow::bail!("Terminal automation is only available on macOS for now")
}
