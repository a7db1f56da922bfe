//! `splice`: locate a fragment in a project's `index.html`, dump its context,
//! apply a replacement bundle, or list the project's CSS rules.

mod logger;

use clap::{ArgAction, Args, Parser, Subcommand};
use css::RuleIndex;
use engine::storage::{read_text, write_text};
use engine::{Engine, EngineConfig, EngineError, PatchRequest, PatchTargets, Project};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "splice",
    version,
    about = "Locate HTML fragments, collect their context and patch them back"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Locate a fragment and print its context summary
    Context(ContextArgs),
    /// Apply a replacement bundle for a previously located fragment
    Apply(ApplyArgs),
    /// List every CSS rule of the project
    Index(IndexArgs),
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Project directory containing index.html
    project: PathBuf,

    /// File holding the fragment markup
    fragment: PathBuf,

    /// Write the summary here instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Project directory containing index.html
    project: PathBuf,

    /// File holding the original fragment markup
    fragment: PathBuf,

    /// TOML bundle with `markup`, `style` and `script` keys
    bundle: PathBuf,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Project directory containing index.html
    project: PathBuf,
}

/// Replacement bundle as written by whoever produced the patch.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatchBundle {
    markup: String,
    #[serde(default)]
    style: String,
    #[serde(default)]
    script: Option<String>,
}

#[derive(Debug)]
enum CliError {
    Engine(EngineError),
    Bundle { path: PathBuf, message: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(err) => write!(f, "{err}"),
            CliError::Bundle { path, message } => {
                write!(f, "invalid bundle {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        CliError::Engine(err)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);
    match cli.command {
        Command::Context(args) => context(&engine, &args),
        Command::Apply(args) => apply(&engine, &args),
        Command::Index(args) => index(&args),
    }
}

fn context(engine: &Engine, args: &ContextArgs) -> Result<ExitCode, CliError> {
    let project = Project::discover(&args.project)?;
    let fragment = read_text(&args.fragment)?;
    let resolution = engine.resolve_in(&project, &fragment)?;
    let summary = format!("{resolution}\n");
    match &args.out {
        Some(out) => {
            write_text(out, &summary)?;
            log::info!(target: "splice", "context written to {}", out.display());
        }
        None => print!("{summary}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn apply(engine: &Engine, args: &ApplyArgs) -> Result<ExitCode, CliError> {
    let project = Project::discover(&args.project)?;
    let original = read_text(&args.fragment)?;
    let bundle = load_bundle(&args.bundle)?;
    let request = PatchRequest {
        original,
        markup: bundle.markup,
        style: bundle.style,
        script: bundle.script,
    };
    let report = engine.apply(&request, &PatchTargets::for_project(&project));
    println!("{report}");
    Ok(if report.markup.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_bundle(path: &Path) -> Result<PatchBundle, CliError> {
    let text = read_text(path)?;
    toml::from_str(&text).map_err(|err| CliError::Bundle {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn index(args: &IndexArgs) -> Result<ExitCode, CliError> {
    let project = Project::discover(&args.project)?;
    let document = html::parse_document(&read_text(&project.document)?);
    let resources = project.resources()?;
    let sources = engine::context::style_sources(&document, &resources);
    let index = RuleIndex::build(sources.iter().map(|s| (s.name.as_str(), s.text.as_str())));
    if index.is_empty() {
        println!("no CSS rules found");
    } else {
        println!("{}", index.render());
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use html_test_support::TempProject;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["splice", "-vv", "context", "site", "frag.html", "--out", "ctx.txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Context(args) => {
                assert_eq!(args.project, PathBuf::from("site"));
                assert_eq!(args.out, Some(PathBuf::from("ctx.txt")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["splice", "apply", "site", "frag.html"]).is_err());
    }

    #[test]
    fn bundle_requires_markup() {
        let tmp = TempProject::new()
            .with_file("ok.toml", "markup = \"<p>x</p>\"\nscript = \"go();\"\n")
            .with_file("bad.toml", "style = \".a { b: c; }\"\n");
        let bundle = load_bundle(&tmp.path("ok.toml")).unwrap();
        assert_eq!(bundle.style, "");
        assert_eq!(bundle.script.as_deref(), Some("go();"));
        assert!(matches!(load_bundle(&tmp.path("bad.toml")), Err(CliError::Bundle { .. })));
    }

    #[test]
    fn apply_exit_code_follows_markup_result() {
        let tmp = TempProject::new()
            .with_file("index.html", "<html><body><p id=\"a\">x</p></body></html>")
            .with_file("frag.html", "<p id=\"a\">x</p>")
            .with_file("missing.html", "<p id=\"zzz\">nope</p>")
            .with_file("bundle.toml", "markup = '<p id=\"a\">y</p>'\n");
        let engine = Engine::default();
        let args = |fragment: &str| ApplyArgs {
            project: tmp.root().to_path_buf(),
            fragment: tmp.path(fragment),
            bundle: tmp.path("bundle.toml"),
        };
        assert_eq!(apply(&engine, &args("frag.html")).unwrap(), ExitCode::SUCCESS);
        assert!(tmp.read("index.html").contains("<p id=\"a\">y</p>"));
        assert_eq!(apply(&engine, &args("missing.html")).unwrap(), ExitCode::FAILURE);
    }
}
