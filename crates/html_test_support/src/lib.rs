//! Shared helpers for integration tests: scenario fixtures, temp projects and
//! readable line diffs.

pub mod project;
pub mod scenario;

pub use project::TempProject;
pub use scenario::{Expectation, NamedText, SCENARIO_FORMAT_V1, Scenario, load_scenarios};

use std::fmt::Write;

/// Escapes control characters and quotes so a string prints on one line.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Describes where `actual` first departs from `expected`, line by line, with
/// two lines of context on either side. Empty when the texts are equal.
pub fn diff_text(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::new();
    }
    let expected: Vec<&str> = expected.lines().collect();
    let actual: Vec<&str> = actual.lines().collect();
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let line = |lines: &[&str], i: usize| lines.get(i).copied().unwrap_or(missing).to_string();

    let mut out = String::new();
    match (0..max).find(|&i| line(&expected, i) != line(&actual, i)) {
        Some(i) => {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(max);
            let _ = writeln!(
                &mut out,
                "first mismatch at line {} (showing {}..={}):",
                i + 1,
                start + 1,
                end
            );
            for idx in start..end {
                let marker = if idx == i { ">" } else { " " };
                let _ = writeln!(
                    &mut out,
                    "{marker} {:>4}  expected: \"{}\"",
                    idx + 1,
                    escape_text(&line(&expected, idx))
                );
                let _ = writeln!(
                    &mut out,
                    "{marker} {:>4}    actual: \"{}\"",
                    idx + 1,
                    escape_text(&line(&actual, idx))
                );
            }
        }
        None => {
            let _ = writeln!(&mut out, "lines match; texts differ in line endings or trailing newline");
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Panics with a line diff when the texts differ.
#[track_caller]
pub fn assert_text_eq(label: &str, expected: &str, actual: &str) {
    let diff = diff_text(expected, actual);
    assert!(diff.is_empty(), "{label}: text mismatch\n{diff}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_points_at_first_mismatch() {
        let diff = diff_text("a\nb\nc", "a\nB\nc");
        assert!(diff.starts_with("first mismatch at line 2"), "{diff}");
        assert!(diff.contains(">    2  expected: \"b\""), "{diff}");
        assert!(diff.contains(">    2    actual: \"B\""), "{diff}");
    }

    #[test]
    fn equal_texts_have_no_diff() {
        assert_eq!(diff_text("x\ny", "x\ny"), "");
    }

    #[test]
    fn trailing_newline_difference_is_reported() {
        let diff = diff_text("x\n", "x");
        assert!(diff.starts_with("lines match"), "{diff}");
    }

    #[test]
    fn escape_text_keeps_output_on_one_line() {
        assert_eq!(escape_text("a\"b\n\t\u{1}"), "a\\\"b\\n\\t\\u{01}");
    }
}
