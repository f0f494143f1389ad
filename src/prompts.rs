//! Prompt construction for the three decision-service call sites.

use crate::tools::ToolRegistry;

/// System prompt for delta summarization (low-moderate temperature).
pub const SUMMARIZE_SYSTEM_PROMPT: &str = "Summarize terminal output in 1-2 concise lines. \
     Focus on what's happening, any prompts, errors, or key information.";

/// System prompt for the end-of-session summary (low temperature).
pub const FINAL_SUMMARY_SYSTEM_PROMPT: &str = "Create concise summaries.";

/// Build the project-manager system prompt: goal, directive grammar,
/// registered custom tools, and optional operator instructions.
pub fn system_prompt(goal: &str, tools: &ToolRegistry, instructions: Option<&str>) -> String {
    let mut prompt = format!(
        "You are a PROJECT MANAGER directing a coding assistant. You make all decisions \
         and give clear instructions.\n\nGOAL: {goal}\n\n\
         YOU DECIDE EVERYTHING. The assistant implements what you tell them.\n\n\
         OUTPUT FORMAT: One XML command only.\n\n\
         Commands:\n\
         - <prompt>specific instruction</prompt>\n\
         - <wait/>\n\
         - <exit/>"
    );

    if !tools.is_empty() {
        prompt.push_str("\n\nCustom Tools:");
        for template in tools.templates() {
            prompt.push_str("\n- ");
            prompt.push_str(template);
        }
    }

    prompt.push_str(
        "\n\nYOUR ROLE:\n\
         - Give direct, specific instructions\n\
         - Make all technical decisions yourself\n\
         - Don't ask the assistant to choose - YOU choose\n\
         - Be decisive and clear about requirements\n\
         - Keep solutions simple and focused\n\n\
         Examples:\n\
         <prompt>create a simple calculator that adds two numbers</prompt>\n\
         <prompt>yes, save it as calculator.py</prompt>\n\
         <prompt>1</prompt>\n\
         <exit/>\n\n\
         NEVER output technical syntax or code in prompts. Only give natural instructions.\n\n\
         When you see options or questions from the assistant, make the decision and \
         instruct them to proceed.\n\n\
         Exit when the core goal is achieved - don't over-engineer.",
    );

    if let Some(instructions) = instructions {
        prompt.push_str("\n\nADDITIONAL INSTRUCTIONS:\n");
        prompt.push_str(instructions);
    }

    prompt
}

/// User message for delta summarization.
pub fn summarize_prompt(delta: &str) -> String {
    format!("New terminal content:\n{delta}")
}

/// User message for the end-of-session summary: the goal and the tail of
/// the terminal transcript, asking for 2-3 sentences.
pub fn final_summary_prompt(goal: &str, transcript_tail: &str) -> String {
    format!(
        "The session is over. Goal: {goal}\n\n\
         Final terminal state:\n{transcript_tail}\n\n\
         Summarize in 2-3 sentences what was accomplished and the final state."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_contains_goal_and_grammar() {
        let tools = ToolRegistry::new();
        let prompt = system_prompt("add two numbers", &tools, None);
        assert!(prompt.contains("GOAL: add two numbers"));
        assert!(prompt.contains("<wait/>"));
        assert!(prompt.contains("<exit/>"));
        assert!(prompt.contains("<prompt>"));
        assert!(!prompt.contains("Custom Tools:"));
    }

    #[test]
    fn test_system_prompt_lists_custom_tools() {
        let mut tools = ToolRegistry::new();
        tools
            .register("<ask_human>question for the human</ask_human>", |_| {
                Ok(String::new())
            })
            .unwrap();
        let prompt = system_prompt("goal", &tools, None);
        assert!(prompt.contains("Custom Tools:"));
        assert!(prompt.contains("- <ask_human>question for the human</ask_human>"));
    }

    #[test]
    fn test_system_prompt_appends_instructions() {
        let tools = ToolRegistry::new();
        let prompt = system_prompt("goal", &tools, Some("Ask before deleting files."));
        assert!(prompt.ends_with("Ask before deleting files."));
    }
}
