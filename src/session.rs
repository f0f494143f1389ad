//! Session controller: the turn-taking state machine.
//!
//! A session owns the conversation history, the time budget, and the loop
//! that drives one coding assistant toward one goal:
//!
//! ```text
//! POLLING -> STABILIZING -> QUERYING -> DISPATCHING -> TERMINATED
//!    ^____________|              |___________|
//! ```
//!
//! `POLLING` reads and cleans the screen; while output keeps changing, each
//! delta is summarized into history. Once the screen has been stable for the
//! stability threshold, the decision service is asked for a directive, which
//! the dispatcher executes. `<exit/>` (or time-limit expiry) produces a
//! final summary, appends it to the session log, and terminates.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::config::RunTiming;
use crate::dispatch::{Dispatcher, Outcome};
use crate::driver::TerminalDriver;
use crate::llm::{ChatMessage, DecisionService};
use crate::prompts;
use crate::screen;
use crate::sessionlog::SessionLog;
use crate::tools::ToolRegistry;

/// Temperature for directive selection (exploratory).
const DIRECTIVE_TEMPERATURE: f32 = 0.7;
/// Temperature for delta summarization.
const SUMMARIZE_TEMPERATURE: f32 = 0.3;
/// Temperature for the final session summary.
const FINAL_SUMMARY_TEMPERATURE: f32 = 0.1;

/// How much of the transcript tail feeds the final summary.
const FINAL_TRANSCRIPT_TAIL_CHARS: usize = 2_000;

/// Session construction options.
pub struct SessionOptions {
    /// Wall-clock budget in minutes; expiry forces termination.
    pub time_limit_minutes: Option<u64>,
    /// Command auto-sent once after the settle delay (e.g. `/init`).
    pub first_command: Option<String>,
    /// Extra operator guidance appended to the system prompt.
    pub instructions: Option<String>,
    /// Control loop timing.
    pub timing: RunTiming,
    /// Where the end-of-session record is appended.
    pub log: SessionLog,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            time_limit_minutes: None,
            first_command: None,
            instructions: None,
            timing: RunTiming::default(),
            log: SessionLog::default_location(),
        }
    }
}

/// Turn-taking states. `Terminated` is absorbing.
enum State {
    Polling,
    Stabilizing,
    Querying,
    Dispatching(String),
    Terminated(Option<String>),
}

/// One agent-driven terminal session.
pub struct Session {
    goal: String,
    driver: Box<dyn TerminalDriver>,
    service: Box<dyn DecisionService>,
    dispatcher: Dispatcher,
    history: Vec<ChatMessage>,
    transcript: String,
    previous_transcript: String,
    started_at: DateTime<Utc>,
    start: Instant,
    last_change: Instant,
    time_limit_minutes: Option<u64>,
    first_command: Option<String>,
    timing: RunTiming,
    log: SessionLog,
}

impl Session {
    /// Create a session. The first two history entries (system prompt and
    /// goal statement) are fixed here and never removed.
    pub fn new(
        goal: impl Into<String>,
        driver: Box<dyn TerminalDriver>,
        service: Box<dyn DecisionService>,
        tools: ToolRegistry,
        options: SessionOptions,
    ) -> Self {
        let goal = goal.into();
        let history = vec![
            ChatMessage::system(prompts::system_prompt(
                &goal,
                &tools,
                options.instructions.as_deref(),
            )),
            ChatMessage::user(goal.clone()),
        ];

        let now = Instant::now();
        Self {
            goal,
            driver,
            service,
            dispatcher: Dispatcher::new(tools),
            history,
            transcript: String::new(),
            previous_transcript: String::new(),
            started_at: Utc::now(),
            start: now,
            last_change: now,
            time_limit_minutes: options.time_limit_minutes,
            first_command: options.first_command,
            timing: options.timing,
            log: options.log,
        }
    }

    /// Run the session to completion.
    ///
    /// Returns the final summary when the session ended through `<exit/>` or
    /// time-limit expiry. A decision-service failure during the loop
    /// propagates and ends the session abnormally (no fallback decision
    /// source exists).
    pub fn run(&mut self) -> Result<Option<String>> {
        tracing::info!(goal = %self.goal, "Session starting");
        std::thread::sleep(self.timing.settle);

        if let Some(cmd) = self.first_command.take() {
            tracing::info!(command = %cmd, "Sending first command");
            if let Err(e) = self.driver.send(&cmd) {
                tracing::warn!(error = %e, "Failed to send first command");
            }
        }

        let mut state = State::Polling;
        let summary = loop {
            state = match state {
                State::Polling => self.poll()?,
                State::Stabilizing => self.stabilize()?,
                State::Querying => self.query()?,
                State::Dispatching(directive) => self.dispatch(directive)?,
                State::Terminated(summary) => break summary,
            };
        };

        self.driver.close();
        Ok(summary)
    }

    /// Read and clean the screen; on change, summarize the delta into
    /// history and keep polling. On no change, move to stabilizing.
    fn poll(&mut self) -> Result<State> {
        let raw = match self.driver.read_screen() {
            Ok(raw) => raw,
            Err(e) => {
                // A failed read is an empty capture, never fatal.
                tracing::warn!(error = %e, "Screen read failed, treating as empty");
                String::new()
            }
        };
        let cleaned = screen::clean(&raw);

        if cleaned == self.transcript {
            return Ok(State::Stabilizing);
        }

        self.previous_transcript = std::mem::replace(&mut self.transcript, cleaned);
        self.last_change = Instant::now();

        let delta = screen::delta(&self.previous_transcript, &self.transcript);
        if !delta.trim().is_empty() {
            tracing::debug!(chars = delta.len(), "Screen updated, summarizing delta");
            let summary = self.summarize_delta(&delta)?;
            self.history.push(ChatMessage::user(format!("Terminal: {summary}")));
        }

        std::thread::sleep(self.timing.poll_interval);
        Ok(State::Polling)
    }

    /// Debounce: require the screen unchanged for the stability threshold
    /// before querying, so the decision service is never asked mid-output.
    /// The time-limit check runs once per stable iteration, not every poll.
    fn stabilize(&mut self) -> Result<State> {
        if self.last_change.elapsed() < self.timing.stability_threshold {
            std::thread::sleep(self.timing.poll_interval);
            return Ok(State::Polling);
        }

        if self.time_expired() {
            tracing::info!("Time limit expired, forcing exit");
            let summary = self.finalize(true)?;
            return Ok(State::Terminated(Some(summary)));
        }

        Ok(State::Querying)
    }

    /// Ask the decision service for a directive over the full history plus
    /// an ephemeral time-status message (never persisted).
    fn query(&mut self) -> Result<State> {
        let mut outgoing = self.history.clone();
        if let Some(status) = self.time_status() {
            outgoing.push(ChatMessage::user(format!("TIME STATUS: {status}")));
        }

        let directive = self
            .service
            .complete(&outgoing, DIRECTIVE_TEMPERATURE)
            .context("Directive query failed")?;
        tracing::info!(directive = %directive, "Received directive");

        self.history.push(ChatMessage::assistant(directive.clone()));
        Ok(State::Dispatching(directive))
    }

    fn dispatch(&mut self, directive: String) -> Result<State> {
        let outcome =
            self.dispatcher
                .dispatch(&directive, self.driver.as_mut(), &mut self.history);

        match outcome {
            Outcome::Exit => {
                let summary = self.finalize(false)?;
                Ok(State::Terminated(Some(summary)))
            }
            Outcome::Wait => {
                std::thread::sleep(self.timing.wait_delay);
                Ok(State::Polling)
            }
            Outcome::Prompted | Outcome::CustomTool => {
                std::thread::sleep(self.timing.dispatch_delay);
                Ok(State::Polling)
            }
        }
    }

    /// Generate the final summary and append the session record to the log.
    ///
    /// On the forced (time-limit) path the summary is best-effort: a failed
    /// service call is replaced by a placeholder so the record still lands.
    fn finalize(&mut self, forced: bool) -> Result<String> {
        let summary = match self.generate_summary() {
            Ok(summary) => summary,
            Err(e) if forced => {
                tracing::warn!(error = %e, "Final summary unavailable at time limit");
                format!("Session ended at its time limit before a summary could be generated ({e:#})")
            }
            Err(e) => return Err(e),
        };

        self.log
            .append(&self.goal, self.started_at, &summary)
            .context("Failed to record session")?;
        tracing::info!(summary = %summary, "Session complete");
        Ok(summary)
    }

    fn generate_summary(&self) -> Result<String> {
        let tail = screen::tail(&self.transcript, FINAL_TRANSCRIPT_TAIL_CHARS);
        let messages = [
            ChatMessage::system(prompts::FINAL_SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(prompts::final_summary_prompt(&self.goal, tail)),
        ];
        self.service.complete(&messages, FINAL_SUMMARY_TEMPERATURE)
    }

    fn summarize_delta(&self, delta: &str) -> Result<String> {
        let messages = [
            ChatMessage::system(prompts::SUMMARIZE_SYSTEM_PROMPT),
            ChatMessage::user(prompts::summarize_prompt(delta)),
        ];
        self.service
            .complete(&messages, SUMMARIZE_TEMPERATURE)
            .context("Delta summarization failed")
    }

    fn elapsed_minutes(&self) -> f64 {
        self.start.elapsed().as_secs_f64() / 60.0
    }

    fn time_expired(&self) -> bool {
        self.time_limit_minutes
            .map(|limit| self.elapsed_minutes() >= limit as f64)
            .unwrap_or(false)
    }

    fn time_status(&self) -> Option<String> {
        let limit = self.time_limit_minutes? as f64;
        Some(time_status_message(limit, self.elapsed_minutes()))
    }

    /// The conversation history as it stands.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The last recorded cleaned screen capture.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }
}

/// Render the time-status string for a given budget and elapsed time.
///
/// Four tiers by remaining minutes: expired (<= 0), urgent (<= 5), warning
/// (<= 15), informational (> 15). Exactly zero remaining is expired.
pub fn time_status_message(limit_minutes: f64, elapsed_minutes: f64) -> String {
    let remaining = limit_minutes - elapsed_minutes;
    if remaining <= 0.0 {
        "TIME EXPIRED! Wrap up immediately and exit.".to_string()
    } else if remaining <= 5.0 {
        format!(
            "URGENT: Only {remaining:.1} minutes left! Prioritize essential tasks and wrap up quickly."
        )
    } else if remaining <= 15.0 {
        format!("{remaining:.1} minutes remaining. Focus on core requirements, avoid extras.")
    } else {
        format!("{remaining:.1} minutes remaining out of {limit_minutes:.0} total.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_status_urgent_tier() {
        // 10-minute limit, 9.0 elapsed: 1.0 remaining is urgent
        let status = time_status_message(10.0, 9.0);
        assert!(status.contains("URGENT"), "got: {status}");
        assert!(status.contains("1.0"));
    }

    #[test]
    fn test_time_status_expired_exactly_at_zero_remaining() {
        let status = time_status_message(10.0, 10.0);
        assert!(status.contains("TIME EXPIRED"), "got: {status}");
    }

    #[test]
    fn test_time_status_expired_past_limit() {
        let status = time_status_message(10.0, 10.9);
        assert!(status.contains("TIME EXPIRED"), "got: {status}");
    }

    #[test]
    fn test_time_status_warning_tier() {
        let status = time_status_message(20.0, 10.0);
        assert!(status.contains("Focus on core requirements"), "got: {status}");
    }

    #[test]
    fn test_time_status_informational_tier() {
        let status = time_status_message(60.0, 10.0);
        assert!(status.contains("out of 60 total"), "got: {status}");
    }
}
