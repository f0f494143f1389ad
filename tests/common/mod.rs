//! Scripted collaborator doubles shared by integration tests.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use termpilot::{ChatMessage, DecisionService, TerminalDriver};

/// Terminal double that replays a fixed sequence of screen captures (the
/// last capture repeats once the script is exhausted) and records every
/// `send`.
pub struct ScriptedDriver {
    captures: VecDeque<String>,
    current: String,
    pub sent: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl ScriptedDriver {
    pub fn new(captures: &[&str]) -> Self {
        Self {
            captures: captures.iter().map(|s| s.to_string()).collect(),
            current: String::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }
}

impl TerminalDriver for ScriptedDriver {
    fn send(&mut self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn read_screen(&mut self) -> Result<String> {
        if let Some(next) = self.captures.pop_front() {
            self.current = next;
        }
        Ok(self.current.clone())
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }
}

/// One recorded decision-service call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Decision-service double that replays scripted responses and records
/// every call. An exhausted script yields an error, standing in for a
/// failed service round trip.
pub struct ScriptedService {
    responses: Mutex<VecDeque<String>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedService {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DecisionService for ScriptedService {
    fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            temperature,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("decision service unavailable"))
    }
}
