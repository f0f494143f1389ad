//! Termpilot - drive interactive coding CLIs with a remote LLM.
//!
//! Termpilot opens a coding assistant CLI (like Claude Code) in a terminal
//! window and plays project manager: it watches the screen, summarizes new
//! output into a running conversation, and asks a chat-completion service
//! what to do next - send an instruction, wait, or exit. Sessions are
//! recorded to an append-only log for later review.
//!
//! ## Extending the directive grammar
//!
//! Callers can register custom tools that the model may invoke alongside
//! the built-in `<prompt>`/`<wait/>`/`<exit/>` commands:
//!
//! ```rust,ignore
//! let mut tools = ToolRegistry::new();
//! tools.register("<ask_human>question for the human</ask_human>", |question| {
//!     println!("HUMAN INPUT NEEDED: {question}");
//!     read_line_from_stdin()
//! })?;
//! let mut session = Session::new(goal, driver, service, tools, options);
//! session.run()?;
//! ```

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod llm;
pub mod prompts;
pub mod screen;
pub mod session;
pub mod sessionlog;
pub mod tools;

pub use config::{Config, LlmConfig, RunTiming};
pub use dispatch::{Dispatcher, Outcome};
pub use driver::TerminalDriver;
pub use llm::{ChatMessage, DecisionService, LlmClient, Role};
pub use session::{Session, SessionOptions};
pub use sessionlog::SessionLog;
pub use tools::{ToolError, ToolRegistry};
