//! Custom tool registry.
//!
//! Callers extend the directive grammar with their own commands by
//! registering a tag-pair template (e.g. `<ask_human>question</ask_human>`)
//! together with a synchronous text-in/text-out callback. The registry is a
//! capability table: templates are validated when registered, and dispatch
//! scans tools in registration order.

use thiserror::Error;

/// Callback invoked with the text enclosed by a tool's tag pair.
///
/// The only contract is synchronous text in, text out; errors are captured
/// by the dispatcher and surfaced to the model as a failure report.
pub type ToolCallback = Box<dyn Fn(&str) -> anyhow::Result<String> + Send>;

/// Errors raised when registering a custom tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The template is not a well-formed `<name>...</name>` tag pair.
    #[error("invalid tool template {0:?}: expected \"<name>...</name>\"")]
    InvalidTemplate(String),
}

/// A single registered tool: its template as shown to the model, the tag
/// pair derived from it, and the callback.
pub struct RegisteredTool {
    template: String,
    start_tag: String,
    end_tag: String,
    callback: ToolCallback,
}

impl RegisteredTool {
    /// The full template as registered (shown verbatim in the system prompt).
    pub fn template(&self) -> &str {
        &self.template
    }

    /// If `directive` is bounded by this tool's tag pair, return the
    /// enclosed payload.
    pub fn extract<'a>(&self, directive: &'a str) -> Option<&'a str> {
        directive
            .strip_prefix(self.start_tag.as_str())
            .and_then(|rest| rest.strip_suffix(self.end_tag.as_str()))
    }

    /// Invoke the callback with the given payload.
    pub fn invoke(&self, payload: &str) -> anyhow::Result<String> {
        (self.callback)(payload)
    }
}

/// Ordered mapping from tag-pair templates to callbacks.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom tool.
    ///
    /// The template must be a two-sided tag pair like
    /// `<ask_human>question for the human</ask_human>`; the tag name is
    /// taken from the first angle-bracket-delimited token and must close the
    /// template. Re-registering an existing template replaces its callback
    /// in place, keeping the original scan position.
    pub fn register(
        &mut self,
        template: &str,
        callback: impl Fn(&str) -> anyhow::Result<String> + Send + 'static,
    ) -> Result<(), ToolError> {
        let (start_tag, end_tag) = parse_template(template)
            .ok_or_else(|| ToolError::InvalidTemplate(template.to_string()))?;

        if let Some(existing) = self.tools.iter_mut().find(|t| t.template == template) {
            existing.callback = Box::new(callback);
            return Ok(());
        }

        self.tools.push(RegisteredTool {
            template: template.to_string(),
            start_tag,
            end_tag,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Remove a tool by its full template. Unknown templates are ignored.
    pub fn unregister(&mut self, template: &str) {
        self.tools.retain(|t| t.template != template);
    }

    /// Iterate tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.iter()
    }

    /// Templates in registration order, for listing in the system prompt.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.template.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

/// Derive the `(start_tag, end_tag)` pair from a template like
/// `<name>payload</name>`. Returns `None` for malformed templates.
fn parse_template(template: &str) -> Option<(String, String)> {
    let name = template.strip_prefix('<')?.split('>').next()?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }

    let start_tag = format!("<{name}>");
    let end_tag = format!("</{name}>");
    if template.starts_with(&start_tag)
        && template.ends_with(&end_tag)
        && template.len() > start_tag.len() + end_tag.len()
    {
        Some((start_tag, end_tag))
    } else {
        None
    }
}
