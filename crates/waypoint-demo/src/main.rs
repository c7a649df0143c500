//! Command-line front end for the waypoint dispatcher.
//!
//! Dispatches one request path against a small compiled-in blog
//! application. Handler unit files are looked up under `--dir`; pass
//! `--scaffold` to create them first.
//!
//! ```text
//! waypoint --dir ./site --scaffold post/show/id/3
//! waypoint --dir ./site hello --query name=ferris
//! RUST_LOG=waypoint_dispatch=debug waypoint --dir ./site post/save/id/3
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waypoint_dispatch::params::from_pairs;
use waypoint_dispatch::{
    Action, Controller, Dispatched, Dispatcher, DispatcherConfig, HandlerBase, HandlerRegistry,
    Params, UnitKind,
};
use waypoint_mapper::{Defaults, MapperRegistry, Rules};

/// Dispatch a request path to the sample application
#[derive(Debug, Parser)]
#[command(name = "waypoint", version, about)]
struct Cli {
    /// Request path, e.g. `post/show/id/3`
    path: String,

    /// Base directory holding the controller and action directories
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// YAML dispatcher configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query parameter (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Body parameter (repeatable)
    #[arg(long = "body", value_name = "KEY=VALUE", value_parser = parse_pair)]
    body: Vec<(String, String)>,

    /// Parameter merged over everything else (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Controller directory, relative to --dir
    #[arg(long)]
    controller_dir: Option<String>,

    /// Action directory, relative to --dir
    #[arg(long)]
    action_dir: Option<String>,

    /// Route pattern to register instead of the built-in ones (repeatable)
    #[arg(short, long = "route", value_name = "PATTERN")]
    routes: Vec<String>,

    /// Create the unit files of every sample handler before dispatching
    #[arg(long)]
    scaffold: bool,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

// ============================================================================
// Sample application
// ============================================================================

#[derive(Default)]
struct PostController {
    base: HandlerBase,
}

impl Controller for PostController {
    fn has_action(&self, action: &str) -> bool {
        matches!(action, "index" | "show" | "save")
    }

    fn call_action(&mut self, action: &str) -> anyhow::Result<()> {
        match action {
            "index" => println!("listing posts, page {}", self.base.param_str_or("page", "1")),
            "show" => {
                let id = self
                    .base
                    .param("id")
                    .and_then(Value::as_str)
                    .context("show needs an id")?;
                println!("showing post {id}");
            }
            _ => {
                println!("saving post {}", self.base.param_str_or("id", "?"));
                self.base
                    .action_stack("show", None, Some(from_pairs([("saved", "true")])));
            }
        }
        Ok(())
    }

    fn base(&self) -> Option<&HandlerBase> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut HandlerBase> {
        Some(&mut self.base)
    }
}

#[derive(Default)]
struct HelloAction {
    base: HandlerBase,
}

impl Action for HelloAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        println!("hello, {}", self.base.param_str_or("name", "world"));
        Ok(())
    }

    fn base(&self) -> Option<&HandlerBase> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut HandlerBase> {
        Some(&mut self.base)
    }
}

#[derive(Default)]
struct LatestAction {
    base: HandlerBase,
}

impl Action for LatestAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.base.action_stack("index", Some("post"), None);
        Ok(())
    }

    fn base_mut(&mut self) -> Option<&mut HandlerBase> {
        Some(&mut self.base)
    }
}

const CONTROLLERS: &[&str] = &["post"];
const ACTIONS: &[&str] = &["hello", "latest"];

fn handlers() -> HandlerRegistry {
    HandlerRegistry::new()
        .controller("post", PostController::default)
        .action("hello", HelloAction::default)
        .action("latest", LatestAction::default)
}

/// Writes an empty unit file for every sample handler.
fn scaffold(dir: &Path, config: &DispatcherConfig) -> anyhow::Result<()> {
    let units = CONTROLLERS
        .iter()
        .map(|name| (&config.controller_directory, UnitKind::Controller.unit_name(name)))
        .chain(
            ACTIONS
                .iter()
                .map(|name| (&config.action_directory, UnitKind::Action.unit_name(name))),
        );

    for (sub, unit) in units {
        let path = dir.join(sub).join(format!("{unit}.{}", config.unit_extension));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, "").with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "scaffolded unit");
    }
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

fn load_config(cli: &Cli) -> anyhow::Result<DispatcherConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DispatcherConfig::from_yaml_str(&source)?
        }
        None => DispatcherConfig::default(),
    };

    if let Some(dir) = &cli.dir {
        config.directory = Some(dir.clone());
    }
    if let Some(name) = &cli.controller_dir {
        config.controller_directory = name.clone();
    }
    if let Some(name) = &cli.action_dir {
        config.action_directory = name.clone();
    }
    if !cli.params.is_empty() {
        config.params.extend(from_pairs(cli.params.clone()));
    }
    config.path_info = Some(cli.path.clone());
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<Dispatched> {
    let config = load_config(cli)?;
    let dir = config
        .directory
        .clone()
        .context("no handler directory given (use --dir or the config file)")?;
    if cli.scaffold {
        scaffold(&dir, &config)?;
    }

    let mappers = MapperRegistry::new();
    let mut dispatcher =
        Dispatcher::new(&mappers, "waypoint", Arc::new(handlers())).with_config(config);

    if cli.routes.is_empty() {
        dispatcher
            .connect("post/:action/*params", Defaults::new(), Rules::new())?
            .connect(":action/*params", Defaults::new(), Rules::new())?;
    } else {
        for pattern in &cli.routes {
            dispatcher.connect(pattern, Defaults::new(), Rules::new())?;
        }
    }

    let query: Params = from_pairs(cli.query.clone());
    let body: Params = from_pairs(cli.body.clone());
    dispatcher.set_query(query).set_body(body);

    Ok(dispatcher.dispatch()?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let done = run(&cli)?;

    match done.action() {
        Some(action) => println!("=> {}::{}", done.unit(), action),
        None => println!("=> {}", done.unit()),
    }
    println!("{}", serde_json::to_string_pretty(done.params())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_dispatch::DispatchError;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("waypoint").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_pair_splits_on_first_equals() {
        assert_eq!(parse_pair("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert_eq!(parse_pair("a="), Ok(("a".into(), String::new())));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=v").is_err());
    }

    #[test]
    fn dispatches_controller_route() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let done = run(&cli(&["--dir", dir_arg, "--scaffold", "post/show/id/3"])).unwrap();

        assert_eq!(done.unit(), "PostController");
        assert_eq!(done.action(), Some("show"));
        assert_eq!(done.params()["id"], "3");
    }

    #[test]
    fn save_forwards_to_show() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let done = run(&cli(&["--dir", dir_arg, "--scaffold", "post/save/id/9"])).unwrap();

        assert_eq!(done.action(), Some("show"));
        assert_eq!(done.params()["id"], "9");
        assert_eq!(done.params()["saved"], "true");
    }

    #[test]
    fn bare_action_with_query_and_param_override() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let done = run(&cli(&[
            "--dir", dir_arg, "--scaffold", "--query", "name=ferris", "--param", "lang=en",
            "hello",
        ]))
        .unwrap();

        assert_eq!(done.unit(), "HelloAction");
        assert_eq!(done.params()["name"], "ferris");
        assert_eq!(done.params()["lang"], "en");
    }

    #[test]
    fn action_forwards_to_controller() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let done = run(&cli(&["--dir", dir_arg, "--scaffold", "latest"])).unwrap();

        assert_eq!(done.unit(), "PostController");
        assert_eq!(done.action(), Some("index"));
    }

    #[test]
    fn missing_unit_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let err = run(&cli(&["--dir", dir_arg, "hello"])).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::NotFound { .. })
        ));
    }

    #[test]
    fn show_without_id_fails_in_action_phase() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let err = run(&cli(&["--dir", dir_arg, "--scaffold", "post/show"])).unwrap_err();

        assert!(err.to_string().contains("show needs an id"));
    }

    #[test]
    fn custom_routes_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let err = run(&cli(&[
            "--dir",
            dir_arg,
            "--scaffold",
            "--action-dir",
            "pages/actions",
            "--route",
            "greet/*params",
            "greet/name/ada",
        ]))
        .unwrap_err();
        // `greet/*params` makes `greet` the controller, which the sample lacks.
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::NotFound { .. })
        ));

        let done = run(&cli(&[
            "--dir",
            dir_arg,
            "--action-dir",
            "pages/actions",
            "--route",
            ":action/*params",
            "hello/name/ada",
        ]))
        .unwrap();
        assert_eq!(done.params()["name"], "ada");
    }
}
