//! AppleScript quoting helpers.

/// Escape a string for embedding inside a double-quoted AppleScript literal.
///
/// Backslashes are escaped first, then double quotes.
pub fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applescript_escape() {
        assert_eq!(applescript_escape("hello"), "hello");
        assert_eq!(applescript_escape("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(applescript_escape("a\\b"), "a\\\\b");
    }
}
