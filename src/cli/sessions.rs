//! The `sessions` subcommand: print previous session records.

use anyhow::Result;

use termpilot::SessionLog;

pub fn sessions_command() -> Result<()> {
    let log = SessionLog::default_location();
    println!("{}", log.read_back()?);
    Ok(())
}
