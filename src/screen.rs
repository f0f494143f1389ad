//! Screen capture cleaning and incremental delta computation.
//!
//! Raw captures from the terminal driver carry ANSI escape sequences and
//! control bytes that change between otherwise identical frames. [`clean`]
//! reduces a capture to a comparison-stable text rendering; [`delta`]
//! extracts only the output that appeared since the previous stable capture.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of characters a delta may carry. When new output is longer,
/// the most recent characters are kept.
pub const MAX_DELTA_CHARS: usize = 30_000;

/// Cursor movement and color sequences: `ESC [ params letter`.
static CURSOR_SEQ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("hardcoded regex"));

/// Private mode toggles: `ESC [ ? params l/h` (cursor visibility, alt screen).
static MODE_SEQ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[\?[0-9;]*[lh]").expect("hardcoded regex"));

/// Catch-all for any remaining CSI sequence.
static CSI_SEQ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[^A-Za-z]*[A-Za-z]").expect("hardcoded regex"));

/// Strip ANSI escape sequences and non-printable control bytes from a raw
/// screen capture, leaving a comparison-stable text rendering.
///
/// Common whitespace (`\n`, `\t`, `\r`) is preserved; everything else in the
/// C0 range plus DEL is removed.
pub fn clean(raw: &str) -> String {
    let text = CURSOR_SEQ.replace_all(raw, "");
    let text = MODE_SEQ.replace_all(&text, "");
    let text = CSI_SEQ.replace_all(&text, "");
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
}

/// Compute the newly observed portion of terminal output.
///
/// - No previous capture: the tail of `current`, capped at
///   [`MAX_DELTA_CHARS`].
/// - `previous` appears as a substring of `current`: everything after its
///   last occurrence, capped the same way.
/// - Otherwise (the terminal was cleared or scrolled past its buffer): the
///   capped tail of `current`.
///
/// The contains-then-suffix check is a heuristic for terminals with bounded
/// scrollback, not a true diff: robustness against clears and scrolls is
/// traded for exactness.
pub fn delta(previous: &str, current: &str) -> String {
    if previous.is_empty() {
        // An empty needle would match at the end of any haystack.
        return tail(current, MAX_DELTA_CHARS).to_string();
    }

    if let Some(pos) = current.rfind(previous) {
        let suffix = &current[pos + previous.len()..];
        return tail(suffix, MAX_DELTA_CHARS).to_string();
    }

    tail(current, MAX_DELTA_CHARS).to_string()
}

/// Return the last `max_chars` characters of a string (char-boundary safe).
pub fn tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let skip = count - max_chars;
    s.char_indices()
        .nth(skip)
        .map(|(idx, _)| &s[idx..])
        .unwrap_or(s)
}
