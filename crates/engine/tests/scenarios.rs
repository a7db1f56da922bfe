use engine::{Engine, EngineConfig, EngineError, Fragment, Resources, collect_context};
use html::{outer_html, parse_document};
use html_test_support::{Scenario, assert_text_eq, load_scenarios};
use std::path::{Path, PathBuf};

fn scenario_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/scenarios")
}

fn run(scenario: &Scenario) {
    let config = EngineConfig::from_toml_str(&scenario.config_toml())
        .unwrap_or_else(|err| panic!("{}: {err}", scenario.name));
    let engine = Engine::new(config);
    let expect = &scenario.expect;

    let located = Fragment::parse(&scenario.fragment).and_then(|fragment| {
        let doc = parse_document(&scenario.document);
        let found = engine.locate(&doc, &fragment)?;
        Ok((doc, found))
    });
    let (doc, found) = match (located, expect.error.as_deref()) {
        (Ok(located), None) => located,
        (Err(EngineError::NotFound { .. }), Some("not_found")) => return,
        (Err(EngineError::InvalidFragment), Some("invalid_fragment")) => return,
        (Ok((doc, found)), Some(error)) => panic!(
            "{}: expected {error}, found {}",
            scenario.name,
            outer_html(&doc, found.node)
        ),
        (Err(err), expected) => panic!("{}: expected {expected:?}, got {err}", scenario.name),
    };

    if let Some(strategy) = &expect.strategy {
        assert_eq!(found.strategy.name(), strategy.as_str(), "{}: strategy", scenario.name);
    }
    if let Some(markup) = &expect.found {
        assert_text_eq(&scenario.name, markup, &outer_html(&doc, found.node));
    }

    let resources = scenario
        .stylesheets
        .iter()
        .fold(Resources::new(), |r, s| r.with_style(&s.name, &s.text));
    let resources = scenario
        .scripts
        .iter()
        .fold(resources, |r, s| r.with_script(&s.name, &s.text));
    let bundle = collect_context(&doc, found.node, &resources, &engine.config().context);

    if let Some(ancestors) = &expect.ancestors {
        assert_text_eq(&scenario.name, ancestors, &bundle.ancestor_markup);
    }
    if let Some(style) = &expect.style {
        assert_text_eq(&scenario.name, style, &bundle.related_style_text);
    }
    if let Some(script) = &expect.script {
        assert_text_eq(&scenario.name, script, &bundle.related_script_text);
    }
}

#[test]
fn scenario_fixtures() {
    let scenarios = load_scenarios(&scenario_dir());
    for (path, scenario) in &scenarios {
        log_case(path, scenario);
        run(scenario);
    }
}

fn log_case(path: &Path, scenario: &Scenario) {
    eprintln!(
        "scenario {}: {}",
        path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        scenario.name
    );
}
