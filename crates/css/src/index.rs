//! Best-effort rule catalog for display.
//!
//! Line numbers are approximate: they come from byte offsets in the scanned
//! text and do not account for anything the flat scanner misreads.

use crate::syntax::scan_rules;
use std::fmt::Write;
use tools::line_of_offset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    /// 1-based, unique across every source in the index.
    pub id: usize,
    pub source: String,
    pub selector: String,
    pub body: String,
    pub start_line: usize,
    pub end_line: usize,
    pub original_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    records: Vec<RuleRecord>,
}

impl RuleIndex {
    /// Indexes `(source name, stylesheet text)` pairs in the order given.
    pub fn build<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut records = Vec::new();
        for (source, text) in sources {
            let rules = scan_rules(text);
            log::debug!(target: "css.index", "{source}: {} rules", rules.len());
            for rule in rules {
                records.push(RuleRecord {
                    id: records.len() + 1,
                    source: source.to_string(),
                    selector: rule.selector.to_string(),
                    body: rule.body.to_string(),
                    start_line: line_of_offset(text, rule.span.start),
                    end_line: line_of_offset(text, rule.span.end.saturating_sub(1)),
                    original_text: rule.text(text).to_string(),
                });
            }
        }
        Self { records }
    }

    pub fn records(&self) -> &[RuleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose selector text is exactly `selector`.
    pub fn by_selector<'s>(&'s self, selector: &'s str) -> impl Iterator<Item = &'s RuleRecord> + 's {
        self.records.iter().filter(move |r| r.selector == selector)
    }

    /// Text catalog, one block per rule:
    ///
    /// ```text
    /// === CSS Rule #1
    /// File: css/main.css
    /// Selector: .title
    /// Body:
    ///   color: black;
    /// Lines: 3-5
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        for rec in &self.records {
            let _ = writeln!(out, "=== CSS Rule #{}", rec.id);
            let _ = writeln!(out, "File: {}", rec.source);
            let _ = writeln!(out, "Selector: {}", rec.selector);
            let _ = writeln!(out, "Body:");
            for line in rec.body.lines() {
                let _ = writeln!(out, "  {}", line.trim());
            }
            let _ = writeln!(out, "Lines: {}-{}", rec.start_line, rec.end_line);
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
