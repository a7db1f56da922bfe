//! TOML scenario fixtures.
//!
//! ```toml
//! format = "splice-scenario-v1"
//! name = "id wins over class set"
//! document = """<div>...</div>"""
//! fragment = """<p id="b">...</p>"""
//!
//! [[stylesheets]]
//! name = "main.css"
//! text = ".note { color: red; }"
//!
//! [config.context]
//! ancestor_depth = 1
//!
//! [expect]
//! found = """<p id="b">...</p>"""
//! strategy = "id"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCENARIO_FORMAT_V1: &str = "splice-scenario-v1";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub format: String,
    pub name: String,
    pub document: String,
    pub fragment: String,
    #[serde(default)]
    pub stylesheets: Vec<NamedText>,
    #[serde(default)]
    pub scripts: Vec<NamedText>,
    /// Engine configuration overrides, in the engine's own TOML layout.
    #[serde(default)]
    pub config: Option<toml::Table>,
    pub expect: Expectation,
}

impl Scenario {
    /// The `config` table re-serialized as TOML text; empty when absent.
    pub fn config_toml(&self) -> String {
        self.config
            .as_ref()
            .map(|table| toml::to_string(table).unwrap_or_else(|err| panic!("{}: {err}", self.name)))
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NamedText {
    pub name: String,
    pub text: String,
}

/// Unset fields are not checked.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    pub found: Option<String>,
    pub strategy: Option<String>,
    /// `"not_found"` or `"invalid_fragment"`.
    pub error: Option<String>,
    pub ancestors: Option<String>,
    pub style: Option<String>,
    pub script: Option<String>,
}

pub fn parse_scenario(content: &str, path: &Path) -> Scenario {
    let scenario: Scenario = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse scenario {path:?}: {err}"));
    assert_eq!(
        scenario.format, SCENARIO_FORMAT_V1,
        "unsupported format in {path:?}"
    );
    assert!(
        scenario.expect.error.is_none() || scenario.expect.found.is_none(),
        "scenario {path:?} expects both an error and a match"
    );
    scenario
}

/// Every `*.toml` scenario in `dir`, sorted by file name.
pub fn load_scenarios(dir: &Path) -> Vec<(PathBuf, Scenario)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read scenario dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no scenarios in {dir:?}");
    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|err| panic!("failed to read scenario {path:?}: {err}"));
            let scenario = parse_scenario(&content, &path);
            (path, scenario)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_scenario() {
        let scenario = parse_scenario(
            r#"
            format = "splice-scenario-v1"
            name = "minimal"
            document = "<p id='a'>x</p>"
            fragment = "<p id='a'>y</p>"

            [config.locator]
            fallback = "none"

            [expect]
            strategy = "id"
            "#,
            Path::new("minimal.toml"),
        );
        assert_eq!(scenario.expect.strategy.as_deref(), Some("id"));
        assert!(scenario.stylesheets.is_empty());
        assert!(scenario.config_toml().contains("fallback = \"none\""));
    }

    #[test]
    #[should_panic(expected = "unsupported format")]
    fn rejects_unknown_formats() {
        parse_scenario(
            "format = \"v0\"\nname = \"x\"\ndocument = \"\"\nfragment = \"\"\n[expect]\n",
            Path::new("old.toml"),
        );
    }
}
