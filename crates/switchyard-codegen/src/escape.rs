//! String escaping for generated Rust literals.
//!
//! Two contexts share one rule:
//!
//! | Context | Escaped characters |
//! |---------|--------------------|
//! | [`escape_literal`] (single-line text) | `\` then `"` |
//! | [`escape_text`] (patterns, help and label text) | `\`, `"`, newline, carriage return, tab |
//!
//! Backslash is always replaced first so that the backslashes introduced for
//! the other characters are never doubled. [`unescape`] inverts both.

/// Escapes single-line text for use inside a `"..."` literal.
pub fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escapes human-readable text for use inside a `"..."` literal.
pub fn escape_text(s: &str) -> String {
    escape_literal(s)
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Reverses [`escape_literal`] and [`escape_text`].
///
/// Unknown escape sequences and a trailing lone backslash are kept verbatim.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_backslash_first() {
        assert_eq!(escape_literal(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_literal(r"C:\temp"), r"C:\\temp");
        // A quote preceded by a backslash must not collapse into `\\"`.
        assert_eq!(escape_literal(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn test_escape_literal_keeps_whitespace() {
        assert_eq!(escape_literal("a\tb\n"), "a\tb\n");
    }

    #[test]
    fn test_escape_text_control_characters() {
        assert_eq!(escape_text("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_text("a\r\n\tb"), "a\\r\\n\\tb");
    }

    #[test]
    fn test_unescape_inverts_escape_text() {
        let original = "deploy \"{env}\"\n\tC:\\path";
        assert_eq!(unescape(&escape_text(original)), original);
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        assert_eq!(unescape(r"\x41"), r"\x41");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
