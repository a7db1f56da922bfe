//! Engine configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no file)
//! is a valid configuration:
//!
//! ```toml
//! [locator]
//! fallback = "serialization"      # or "attributes_and_text", "none"
//!
//! [context]
//! ancestors = "chain"             # or "nearest"
//! ancestor_depth = 4              # or "unbounded"
//! max_ancestor_bytes = 20000      # optional
//! style_granularity = "per_rule"  # or "whole_sheet"
//!
//! [patch]
//! replace = "relocate"            # or "exact_text"
//! script_placeholder = "—"
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub locator: LocatorConfig,
    pub context: ContextConfig,
    pub patch: PatchConfig,
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|err| EngineError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = crate::storage::read_text(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!(target: "engine.config", "loaded {}: {config:?}", path.display());
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    pub fallback: Fallback,
}

/// Last-resort tier run after the attribute tiers come up empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Normalized serialized markup equals the normalized fragment text.
    #[default]
    Serialization,
    /// Same tag, same attribute map, same normalized inner text.
    AttributesAndText,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    pub ancestors: AncestorPolicy,
    pub ancestor_depth: AncestorDepth,
    /// Ancestors whose serialized markup is longer than this are not collected.
    pub max_ancestor_bytes: Option<usize>,
    pub style_granularity: StyleGranularity,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ancestors: AncestorPolicy::Chain,
            ancestor_depth: AncestorDepth::Limited(4),
            max_ancestor_bytes: None,
            style_granularity: StyleGranularity::PerRule,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorPolicy {
    /// Every ancestor up to the depth/size limits, outermost first.
    #[default]
    Chain,
    /// Only the nearest ancestor that fits the size limit, else the node itself.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DepthRepr", into = "DepthRepr")]
pub enum AncestorDepth {
    Limited(usize),
    Unbounded,
}

impl AncestorDepth {
    pub fn allows(self, level: usize) -> bool {
        match self {
            AncestorDepth::Limited(max) => level < max,
            AncestorDepth::Unbounded => true,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DepthRepr {
    Levels(usize),
    Keyword(String),
}

impl TryFrom<DepthRepr> for AncestorDepth {
    type Error = String;

    fn try_from(value: DepthRepr) -> std::result::Result<Self, Self::Error> {
        match value {
            DepthRepr::Levels(0) => Err("ancestor_depth must be at least 1".to_string()),
            DepthRepr::Levels(n) => Ok(AncestorDepth::Limited(n)),
            DepthRepr::Keyword(k) if k == "unbounded" => Ok(AncestorDepth::Unbounded),
            DepthRepr::Keyword(k) => Err(format!(
                "ancestor_depth must be a positive integer or \"unbounded\", got {k:?}"
            )),
        }
    }
}

impl From<AncestorDepth> for DepthRepr {
    fn from(value: AncestorDepth) -> Self {
        match value {
            AncestorDepth::Limited(n) => DepthRepr::Levels(n),
            AncestorDepth::Unbounded => DepthRepr::Keyword("unbounded".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleGranularity {
    /// Only the rules whose selector mentions the node.
    #[default]
    PerRule,
    /// Every style source that has at least one such rule, in full.
    WholeSheet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchConfig {
    pub replace: ReplaceStrategy,
    /// Script text starting with this marker means "no script needed".
    pub script_placeholder: String,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            replace: ReplaceStrategy::Relocate,
            script_placeholder: "—".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Re-run the locator on the current document and replace the subtree.
    #[default]
    Relocate,
    /// Replace the first verbatim occurrence of the original fragment text.
    ExactText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.context.ancestor_depth, AncestorDepth::Limited(4));
        assert_eq!(config.patch.script_placeholder, "—");
    }

    #[test]
    fn parses_every_section() {
        let config = EngineConfig::from_toml_str(
            r#"
            [locator]
            fallback = "attributes_and_text"

            [context]
            ancestors = "nearest"
            ancestor_depth = "unbounded"
            max_ancestor_bytes = 2048
            style_granularity = "whole_sheet"

            [patch]
            replace = "exact_text"
            script_placeholder = "NONE"
            "#,
        )
        .unwrap();
        assert_eq!(config.locator.fallback, Fallback::AttributesAndText);
        assert_eq!(config.context.ancestors, AncestorPolicy::Nearest);
        assert_eq!(config.context.ancestor_depth, AncestorDepth::Unbounded);
        assert_eq!(config.context.max_ancestor_bytes, Some(2048));
        assert_eq!(config.context.style_granularity, StyleGranularity::WholeSheet);
        assert_eq!(config.patch.replace, ReplaceStrategy::ExactText);
        assert_eq!(config.patch.script_placeholder, "NONE");
    }

    #[test]
    fn depth_accepts_integers() {
        let config = EngineConfig::from_toml_str("[context]\nancestor_depth = 1").unwrap();
        assert_eq!(config.context.ancestor_depth, AncestorDepth::Limited(1));
    }

    #[test]
    fn rejects_zero_depth_and_unknown_keywords() {
        for bad in [
            "[context]\nancestor_depth = 0",
            "[context]\nancestor_depth = \"all\"",
            "[context]\nancestors = \"siblings\"",
            "[locator]\nfalback = \"none\"",
        ] {
            let err = EngineConfig::from_toml_str(bad).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn serializes_back_to_toml() {
        let mut config = EngineConfig::default();
        config.context.ancestor_depth = AncestorDepth::Unbounded;
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("ancestor_depth = \"unbounded\""), "{text}");
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
