use anyhow::{Context, Result, bail};
use markweave_config::{AffordanceSettings, Config, PersistenceSettings};
use markweave_engine::affordance::menu_items;
use markweave_engine::registry::kinds;
use markweave_engine::{
    AffordanceConfig, ConfigMap, ExtensionConfig, PersistConfig, Registry, compose, parse, serialize,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
    time::Duration,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  markweave-cli fmt <file.md>            normalize markdown (parse, then serialize)
  markweave-cli tree <file.md>           dump the document tree
  markweave-cli menu <file.md> <block>   list the block menu for a top-level block
  markweave-cli config                   print the effective configuration";

enum Cmd {
    Fmt(PathBuf),
    Tree(PathBuf),
    Menu(PathBuf, usize),
    Config,
}

fn parse_args(args: &[String]) -> Result<Cmd> {
    match args {
        [cmd, file] if cmd == "fmt" => Ok(Cmd::Fmt(PathBuf::from(file))),
        [cmd, file] if cmd == "tree" => Ok(Cmd::Tree(PathBuf::from(file))),
        [cmd, file, index] if cmd == "menu" => {
            let index = index
                .parse()
                .with_context(|| format!("Block index must be a number, got '{index}'"))?;
            Ok(Cmd::Menu(PathBuf::from(file), index))
        }
        [cmd] if cmd == "config" => Ok(Cmd::Config),
        _ => bail!("unrecognized arguments"),
    }
}

fn config_map(config: &Config) -> ConfigMap {
    config
        .extensions
        .iter()
        .map(|(name, setting)| {
            let ext = if !setting.is_enabled() {
                ExtensionConfig::Disabled
            } else {
                setting
                    .options()
                    .map_or(ExtensionConfig::Defaults, ExtensionConfig::Options)
            };
            (name.clone(), ext)
        })
        .collect()
}

fn affordance_config(settings: &AffordanceSettings) -> AffordanceConfig {
    AffordanceConfig {
        grace_period: Duration::from_millis(settings.grace_period_ms),
        scroll_edge: settings.scroll_edge_px,
        scroll_step: settings.scroll_step_px,
        hover_probe: settings.hover_probe_px,
        disabled_kinds: settings.disabled_kinds.clone(),
    }
}

fn persist_config(settings: &PersistenceSettings) -> PersistConfig {
    PersistConfig {
        debounce: Duration::from_millis(settings.debounce_ms),
        max_attempts: settings.max_attempts,
        backoff: Duration::from_millis(settings.backoff_ms),
    }
}

fn load_document(registry: &Registry, path: &Path) -> Result<markweave_engine::Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(registry, &content).with_context(|| format!("{} is not valid text", path.display()))
}

fn run(cmd: Cmd, config: &Config) -> Result<()> {
    let registry = compose(&kinds::starter_kit(), &config_map(config));
    match cmd {
        Cmd::Fmt(path) => {
            let doc = load_document(&registry, &path)?;
            print!("{}", serialize(&registry, &doc));
        }
        Cmd::Tree(path) => {
            let doc = load_document(&registry, &path)?;
            println!("{}", doc.dump());
        }
        Cmd::Menu(path, index) => {
            let doc = load_document(&registry, &path)?;
            let Some(block) = doc
                .content()
                .maybe_child(index)
                .and_then(|node| node.as_element())
            else {
                bail!("Document has {} blocks, no block {index}", doc.child_count());
            };
            let items: Vec<&str> = menu_items(&registry, block).iter().map(|i| i.id()).collect();
            println!("{}: {}", block.kind_name(), items.join(" "));
        }
        Cmd::Config => {
            let affordance = affordance_config(&config.affordance);
            let persistence = persist_config(&config.persistence);
            println!("config file: {}", Config::config_path().display());
            println!("extensions: {:?}", config_map(config));
            println!("affordance: {affordance:?}");
            println!("persistence: {persistence:?}");
            if let Some(dir) = &config.persistence.drafts_dir {
                println!("drafts: {}", dir.display());
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cmd = match parse_args(&args) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            debug!(path = %config_path.display(), "loaded config");
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    run(cmd, &config)
}
