pub mod index;
pub mod syntax;

// Re-exports so other crates can just use `css::...` nicely.
pub use index::{RuleIndex, RuleRecord};
pub use syntax::{RuleSpan, scan_rules, selector_of, split_rules};
