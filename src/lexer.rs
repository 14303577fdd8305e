//! # Lexer / Scanner
//!
//! The scanner is deliberately thin: it has no notion of tokens or
//! notation, only of where the *next* significant boundary character is.
//! Everything else (what a run of text between boundaries *means*) is the
//! parser's job.

/// The boundary characters the parser cares about.
pub const BOUNDARY_CHARS: [char; 5] = ['(', ')', ' ', '<', ','];

/// Returns the byte offset of the next boundary character (`(`, `)`, ` `,
/// `<`, or `,`) in `text`, or `None` if there isn't one.
///
/// This mirrors the source's `next_boundary` stateless scan: it does not
/// trim or interpret anything, it just finds the smallest index of any
/// boundary character.
pub fn next_boundary(text: &str) -> Option<usize> {
    text.find(BOUNDARY_CHARS.as_slice())
}

/// Normalises an identifier for name comparison: upper-cases it and maps
/// `-` to `_`.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

/// A leading character class, used by the parser's inner loop to decide
/// what action to take next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadChar {
    Open,
    Close,
    OperandArgsOpen,
    Word,
}

/// Classify the first non-whitespace/non-comma character of `text`.
pub fn classify_lead(text: &str) -> Option<LeadChar> {
    let c = text.chars().next()?;
    Some(match c {
        '(' => LeadChar::Open,
        ')' => LeadChar::Close,
        '<' => LeadChar::OperandArgsOpen,
        _ => LeadChar::Word,
    })
}

/// Trims leading whitespace and commas (runs of space/comma are
/// insignificant separators).
pub fn trim_separators(text: &str) -> &str {
    text.trim_start_matches(|c: char| c == ' ' || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_boundary() {
        assert_eq!(next_boundary("add(1 2)"), Some(3));
        assert_eq!(next_boundary("foo"), None);
        assert_eq!(next_boundary("a<1>(b)"), Some(1));
    }

    #[test]
    fn normalizes_case_and_dash() {
        assert_eq!(normalize_name("less-than"), "LESS_THAN");
        assert_eq!(normalize_name("BLOCK_NUMBER"), "BLOCK_NUMBER");
        assert_eq!(normalize_name("Eager-If"), "EAGER_IF");
    }

    #[test]
    fn trims_separators_but_not_content() {
        assert_eq!(trim_separators("  , ,add"), "add");
        assert_eq!(trim_separators("add"), "add");
    }
}
