//! Terminal.app automation for macOS.
//!
//! Opens a new Terminal window, tracks it by window id, injects keystrokes
//! via System Events, and reads the window contents back through
//! AppleScript. The window is left open on close so the operator can
//! inspect the session afterwards.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::helpers::applescript_escape;
use super::{seed_directory, TerminalDriver};

/// A Terminal.app window running the coding assistant CLI.
pub struct MacTerminal {
    window_id: String,
}

impl MacTerminal {
    /// Open a new Terminal window, optionally seed the working directory
    /// from a template, and launch `command` in it with colors disabled.
    pub fn start(command: &str, workdir: Option<&Path>, seed_from: Option<&Path>) -> Result<Self> {
        let cwd = match workdir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("Failed to resolve current directory")?,
        };

        if let Some(template) = seed_from {
            seed_directory(template, &cwd)?;
            tracing::info!(from = %template.display(), to = %cwd.display(), "Seeded working directory");
        } else {
            std::fs::create_dir_all(&cwd)
                .with_context(|| format!("Failed to create directory: {}", cwd.display()))?;
        }

        let script = format!(
            "tell application \"Terminal\"\n\
             \tactivate\n\
             \tdo script \"cd {}\"\n\
             \tdelay 0.5\n\
             \treturn id of front window\n\
             end tell",
            applescript_escape(&cwd.display().to_string())
        );

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .context("Failed to run osascript - is this macOS?")?;
        if !output.status.success() {
            anyhow::bail!(
                "Failed to open Terminal window: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let window_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if window_id.is_empty() {
            anyhow::bail!("Terminal did not report a window id");
        }

        let mut driver = Self { window_id };
        std::thread::sleep(Duration::from_secs(1));

        // Disable colors and launch the CLI in one line for faster startup
        let startup = format!("export NO_COLOR=1 && export CLICOLOR=0 && clear && {command}");
        driver.send(&startup)?;
        std::thread::sleep(Duration::from_secs(2));

        tracing::info!(window_id = %driver.window_id, command, "Terminal session started");
        Ok(driver)
    }

    /// Type text into the tracked window without pressing Enter.
    fn type_text(&self, text: &str) -> Result<()> {
        let script = format!(
            "tell application \"Terminal\"\n\
             \tactivate\n\
             \tset frontmost of window id {} to true\n\
             end tell\n\
             tell application \"System Events\"\n\
             \tkeystroke \"{}\"\n\
             end tell",
            self.window_id,
            applescript_escape(text)
        );
        run_osascript(&script).context("Failed to type into terminal")
    }

    /// Press the Enter key in the tracked window.
    fn press_enter(&self) -> Result<()> {
        let script = format!(
            "tell application \"Terminal\"\n\
             \tactivate\n\
             \tset frontmost of window id {} to true\n\
             end tell\n\
             tell application \"System Events\"\n\
             \tkey code 36\n\
             end tell",
            self.window_id
        );
        run_osascript(&script).context("Failed to press enter")
    }
}

impl TerminalDriver for MacTerminal {
    fn send(&mut self, text: &str) -> Result<()> {
        if !text.is_empty() {
            self.type_text(text)?;
        }
        self.press_enter()?;
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    }

    fn read_screen(&mut self) -> Result<String> {
        let script = format!(
            "tell application \"Terminal\"\n\
             \tget contents of window id {}\n\
             end tell",
            self.window_id
        );
        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .context("Failed to read terminal contents")?;
        if !output.status.success() {
            anyhow::bail!(
                "Screen read failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn close(&mut self) {
        // Leave the window open for the operator to inspect.
        tracing::debug!(window_id = %self.window_id, "Releasing terminal window");
    }
}

fn run_osascript(script: &str) -> Result<()> {
    let status = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .status()
        .context("Failed to run osascript")?;
    if !status.success() {
        anyhow::bail!("osascript exited with status: {status}");
    }
    Ok(())
}
