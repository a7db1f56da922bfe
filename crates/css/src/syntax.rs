//! Flat `selector { body }` scanning.
//!
//! Rules are found by splitting on `}` and then on the first `{` of each chunk,
//! exactly like a single-level stylesheet. Nesting is not understood: for
//! `@media x { .a { b: c; } }` the scanner reports one rule with selector
//! `@media x` whose body runs to the first `}`. Bodies containing literal
//! braces are not supported.

use std::ops::Range;

/// One scanned rule, borrowing from the stylesheet text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpan<'a> {
    /// Selector text, trimmed, leading comments removed.
    pub selector: &'a str,
    /// Declarations between the braces, trimmed.
    pub body: &'a str,
    /// Byte range of the whole rule, from the first selector byte through `}`.
    pub span: Range<usize>,
}

impl<'a> RuleSpan<'a> {
    /// The rule exactly as written in the source.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }
}

// input: "/* nav */ .title { color: red; } #t1 { margin: 0 }"
// output: [RuleSpan { selector: ".title", .. }, RuleSpan { selector: "#t1", .. }]
pub fn scan_rules(input: &str) -> Vec<RuleSpan<'_>> {
    let mut rules = Vec::new();
    let mut start = 0usize;
    while let Some(rel_close) = input[start..].find('}') {
        let close = start + rel_close;
        let chunk = &input[start..close];
        if let Some(open) = chunk.find('{') {
            let selector_start = start + skip_leading_trivia(&chunk[..open]);
            let selector = input[selector_start..start + open].trim();
            if !selector.is_empty() {
                rules.push(RuleSpan {
                    selector,
                    body: chunk[open + 1..].trim(),
                    span: selector_start..close + 1,
                });
            }
        }
        start = close + 1;
    }
    rules
}

/// Offset of the first byte in `prefix` that is neither whitespace nor inside a `/* */` comment.
fn skip_leading_trivia(prefix: &str) -> usize {
    let mut offset = 0usize;
    loop {
        let rest = &prefix[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if !trimmed.starts_with("/*") {
            return offset;
        }
        match trimmed.find("*/") {
            Some(end) => offset += end + 2,
            None => return offset,
        }
    }
}

// input: ".a { x: 1; }\n.b { y: 2; }"
// output: [".a { x: 1; }", ".b { y: 2; }"]
/// Splits replacement style text into rules at each closing brace.
///
/// Trailing text after the last `}` is kept as its own chunk so that callers can
/// report it instead of silently dropping it.
pub fn split_rules(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for (i, _) in input.match_indices('}') {
        let chunk = input[start..=i].trim();
        if !chunk.is_empty() && chunk != "}" {
            out.push(chunk);
        }
        start = i + 1;
    }
    let tail = input[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Selector of a single rule: the text before the first `{`, trimmed.
pub fn selector_of(rule: &str) -> Option<&str> {
    let (selector, _) = rule.split_once('{')?;
    let selector = selector.trim();
    (!selector.is_empty()).then_some(selector)
}
