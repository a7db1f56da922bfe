//! Whitespace and line helpers shared by the parser, the CSS scanner and the engine.

#[inline]
pub fn is_ascii_ws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\n' | b'\t' | b'\r' | b'\x0C')
}

/// Trims every line, drops lines that end up empty and joins the rest with `\n`.
///
/// Used to compare markup while ignoring indentation and blank-line noise that
/// editors and browsers introduce around a copied fragment.
pub fn normalize_lines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Collapses every run of whitespace into a single space and trims both ends.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// 1-based line number of the byte at `offset`.
///
/// Offsets past the end clamp to the last line.
pub fn line_of_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lines_drops_indentation_and_blank_lines() {
        let input = "  <h2 class=\"title\">\n\n      Hello\n  </h2>\n";
        assert_eq!(normalize_lines(input), "<h2 class=\"title\">\nHello\n</h2>");
    }

    #[test]
    fn normalize_lines_handles_crlf() {
        assert_eq!(normalize_lines("a\r\n  b\r\n"), "a\nb");
    }

    #[test]
    fn collapse_whitespace_joins_words() {
        assert_eq!(collapse_whitespace("\n  Old \t title\n"), "Old title");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn line_of_offset_counts_newlines_before_offset() {
        let text = "a {}\nb {}\n\nc {}";
        assert_eq!(line_of_offset(text, 0), 1);
        assert_eq!(line_of_offset(text, 5), 2);
        assert_eq!(line_of_offset(text, text.find('c').unwrap()), 4);
        assert_eq!(line_of_offset(text, 10_000), 4);
    }
}
