//! Directive validation and dispatch.
//!
//! The decision service is steered toward a tiny fixed grammar plus an open
//! set of caller-registered custom tools, so the action surface stays
//! enumerable and validation is O(number of registered tools) per turn.

use crate::driver::TerminalDriver;
use crate::llm::ChatMessage;
use crate::tools::ToolRegistry;

/// Result of dispatching one directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; poll again after a short delay.
    Wait,
    /// End the session (summary and logging happen one level up).
    Exit,
    /// An instruction was forwarded to the terminal.
    Prompted,
    /// A registered custom tool ran; its result is in history.
    CustomTool,
}

/// Parses directives against the fixed grammar plus registered custom tools
/// and performs the corresponding side effect.
pub struct Dispatcher {
    tools: ToolRegistry,
}

impl Dispatcher {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Dispatch a single directive.
    ///
    /// Malformed, unrecognized, and failed directives all degrade to
    /// [`Outcome::Wait`]: the model re-decides on the next query against
    /// unchanged state. Only custom tool results and failures mutate
    /// `history`.
    pub fn dispatch(
        &self,
        directive: &str,
        driver: &mut dyn TerminalDriver,
        history: &mut Vec<ChatMessage>,
    ) -> Outcome {
        let cmd = directive.trim();

        if !is_well_formed(cmd) {
            tracing::warn!(directive = cmd, "Ignoring malformed directive");
            return Outcome::Wait;
        }

        if cmd == "<wait/>" {
            return Outcome::Wait;
        }

        if cmd == "<exit/>" {
            return Outcome::Exit;
        }

        if let Some(instruction) = cmd
            .strip_prefix("<prompt>")
            .and_then(|rest| rest.strip_suffix("</prompt>"))
        {
            if let Err(e) = driver.send(instruction) {
                // Automation-layer failures are never fatal mid-session.
                tracing::warn!(error = %e, "Failed to forward instruction to terminal");
                return Outcome::Wait;
            }
            return Outcome::Prompted;
        }

        for tool in self.tools.iter() {
            let Some(payload) = tool.extract(cmd) else {
                continue;
            };
            match tool.invoke(payload) {
                Ok(result) => {
                    history.push(ChatMessage::user(format!("Tool result: {result}")));
                    return Outcome::CustomTool;
                }
                Err(e) => {
                    tracing::warn!(template = tool.template(), error = %e, "Custom tool failed");
                    history.push(ChatMessage::user(format!("Tool error: {e}")));
                    return Outcome::Wait;
                }
            }
        }

        // Unrecognized directives are dropped without feeding a correction
        // back into history; the next query shows the model the same state.
        tracing::warn!(directive = cmd, "Ignoring unrecognized directive");
        Outcome::Wait
    }
}

/// Cheap well-formedness guard, not a full parser: the trimmed text must
/// start with `<`, end with `>`, and have matching bracket counts.
fn is_well_formed(cmd: &str) -> bool {
    cmd.starts_with('<')
        && cmd.ends_with('>')
        && cmd.matches('<').count() == cmd.matches('>').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::{Arc, Mutex};

    /// Driver double that records everything sent to it.
    struct RecordingDriver {
        sent: Arc<Mutex<Vec<String>>>,
        fail_sends: bool,
    }

    impl RecordingDriver {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    sent: sent.clone(),
                    fail_sends: false,
                },
                sent,
            )
        }
    }

    impl TerminalDriver for RecordingDriver {
        fn send(&mut self, text: &str) -> Result<()> {
            if self.fail_sends {
                anyhow::bail!("keystroke injection failed");
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn read_screen(&mut self) -> Result<String> {
            Ok(String::new())
        }

        fn close(&mut self) {}
    }

    fn dispatcher_with_ask_human() -> Dispatcher {
        let mut tools = ToolRegistry::new();
        tools
            .register("<ask_human>q</ask_human>", |q| {
                assert_eq!(q, "What now?");
                Ok("blue".to_string())
            })
            .unwrap();
        Dispatcher::new(tools)
    }

    #[test]
    fn test_wait_directive_leaves_history_unchanged() {
        let dispatcher = Dispatcher::new(ToolRegistry::new());
        let (mut driver, _) = RecordingDriver::new();
        let mut history = vec![ChatMessage::system("s"), ChatMessage::user("g")];

        let outcome = dispatcher.dispatch("<wait/>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Wait);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_exit_directive() {
        let dispatcher = Dispatcher::new(ToolRegistry::new());
        let (mut driver, sent) = RecordingDriver::new();
        let mut history = Vec::new();

        let outcome = dispatcher.dispatch("<exit/>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Exit);
        assert!(sent.lock().unwrap().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_prompt_forwards_exact_payload() {
        let dispatcher = Dispatcher::new(ToolRegistry::new());
        let (mut driver, sent) = RecordingDriver::new();
        let mut history = Vec::new();

        let outcome = dispatcher.dispatch("<prompt>do X</prompt>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Prompted);
        assert_eq!(sent.lock().unwrap().as_slice(), ["do X"]);
        assert!(history.is_empty());
    }

    #[test]
    fn test_prompt_send_failure_degrades_to_wait() {
        let dispatcher = Dispatcher::new(ToolRegistry::new());
        let (mut driver, _) = RecordingDriver::new();
        driver.fail_sends = true;
        let mut history = Vec::new();

        let outcome = dispatcher.dispatch("<prompt>do X</prompt>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Wait);
        assert!(history.is_empty());
    }

    #[test]
    fn test_custom_tool_result_lands_in_history() {
        let dispatcher = dispatcher_with_ask_human();
        let (mut driver, _) = RecordingDriver::new();
        let mut history = Vec::new();

        let outcome =
            dispatcher.dispatch("<ask_human>What now?</ask_human>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::CustomTool);
        assert_eq!(history.len(), 1);
        assert!(history[0].content.contains("blue"));
    }

    #[test]
    fn test_custom_tool_failure_reports_and_waits() {
        let mut tools = ToolRegistry::new();
        tools
            .register("<flaky>x</flaky>", |_| anyhow::bail!("human walked away"))
            .unwrap();
        let dispatcher = Dispatcher::new(tools);
        let (mut driver, _) = RecordingDriver::new();
        let mut history = Vec::new();

        let outcome = dispatcher.dispatch("<flaky>hi</flaky>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Wait);
        assert_eq!(history.len(), 1);
        assert!(history[0].content.contains("human walked away"));
    }

    #[test]
    fn test_malformed_directive_is_wait_without_mutation() {
        let dispatcher = dispatcher_with_ask_human();
        let (mut driver, sent) = RecordingDriver::new();
        let mut history = Vec::new();

        for bad in ["plain text", "<prompt>unbalanced", "<a><b></a>", ""] {
            let outcome = dispatcher.dispatch(bad, &mut driver, &mut history);
            assert_eq!(outcome, Outcome::Wait, "directive {bad:?}");
        }
        assert!(sent.lock().unwrap().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_unrecognized_directive_is_wait_without_mutation() {
        let dispatcher = dispatcher_with_ask_human();
        let (mut driver, _) = RecordingDriver::new();
        let mut history = Vec::new();

        let outcome = dispatcher.dispatch("<unknown>x</unknown>", &mut driver, &mut history);
        assert_eq!(outcome, Outcome::Wait);
        assert!(history.is_empty());
    }

    #[test]
    fn test_well_formedness_guard() {
        assert!(is_well_formed("<wait/>"));
        assert!(is_well_formed("<prompt>hi</prompt>"));
        assert!(!is_well_formed("wait"));
        assert!(!is_well_formed("<wait/"));
        assert!(!is_well_formed("<<wait/>"));
    }
}
