//! Terminal driver boundary.
//!
//! The session controller treats the terminal as an opaque collaborator: it
//! injects text and reads back whatever the screen currently shows. The
//! production implementation automates Terminal.app on macOS; tests script
//! the trait directly.

mod helpers;
#[cfg(target_os = "macos")]
mod mac;

pub use helpers::applescript_escape;
#[cfg(target_os = "macos")]
pub use mac::MacTerminal;

use anyhow::{Context, Result};
use std::path::Path;

/// A handle to an interactive terminal running the coding assistant.
///
/// `read_screen` results are opaque text requiring cleaning
/// (see [`crate::screen`]); the controller never inspects the automation
/// mechanism behind the trait.
pub trait TerminalDriver {
    /// Type `text` into the terminal followed by an Enter keystroke.
    fn send(&mut self, text: &str) -> Result<()>;

    /// Return the full current screen buffer.
    fn read_screen(&mut self) -> Result<String>;

    /// Release the terminal. Implementations may leave the window open for
    /// the operator to inspect.
    fn close(&mut self);
}

/// Copy a seed directory into the session's working directory before the
/// assistant starts, creating the destination as needed.
pub fn seed_directory(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        anyhow::bail!("Seed directory does not exist: {}", from.display());
    }
    std::fs::create_dir_all(to)
        .with_context(|| format!("Failed to create directory: {}", to.display()))?;
    copy_dir_recursive(from, to)
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from)
        .with_context(|| format!("Failed to read directory: {}", from.display()))?
    {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&target)?;
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_directory_copies_tree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dst_path = dst.path().join("project");

        std::fs::write(src.path().join("README.md"), "# Template\n").unwrap();
        std::fs::create_dir(src.path().join("src")).unwrap();
        std::fs::write(src.path().join("src").join("main.py"), "print('hi')\n").unwrap();

        seed_directory(src.path(), &dst_path).unwrap();

        assert_eq!(
            std::fs::read_to_string(dst_path.join("README.md")).unwrap(),
            "# Template\n"
        );
        assert_eq!(
            std::fs::read_to_string(dst_path.join("src").join("main.py")).unwrap(),
            "print('hi')\n"
        );
    }

    #[test]
    fn test_seed_directory_rejects_missing_source() {
        let dst = tempfile::tempdir().unwrap();
        let result = seed_directory(Path::new("/nonexistent/template"), dst.path());
        assert!(result.is_err());
    }
}
