//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use drdocer_core::pipeline::{self, GenerateResult, ProgressReporter};
use drdocer_core::relate::build_relationships;
use drdocer_relationship::{
    MemoryRelationshipStore, RelationshipService, RelationshipStore, RelationshipType,
};
use drdocer_render::DocumentStorage;
use drdocer_shared::{AppConfig, EntityType, config_file_path, init_config, load_config};
use drdocer_storage::{FilesystemDocumentStorage, JsonRelationshipStore, StdoutDocumentStorage};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DrDocer: generate infrastructure documentation from discovered metadata.
#[derive(Parser)]
#[command(
    name = "drdocer",
    version,
    about = "Discover servers and services, link their dependencies, and render Markdown docs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to a config file (defaults to ./drdocer.toml, then ~/.drdocer/drdocer.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover entities and render one document per entity.
    Generate {
        /// Print documents instead of writing them to the output directory.
        #[arg(long)]
        stdout: bool,

        /// Output directory (overrides `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Persist the relationship graph to this JSON file.
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List discovered entities.
    List {
        /// Only show entities of this type.
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// Show the parents and children of an entity.
    Graph {
        /// Entity name.
        name: String,

        /// Read the graph from a JSON store written by `generate --store`
        /// instead of rediscovering.
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init {
        /// Where to write the file (defaults to ~/.drdocer/drdocer.toml).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "drdocer=info",
        1 => "drdocer=debug",
        _ => "drdocer=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate { stdout, out, store } => {
            cmd_generate(config_path, stdout, out.as_deref(), store.as_deref())
        }
        Command::List { entity_type } => cmd_list(config_path, entity_type.as_deref()),
        Command::Graph { name, store } => cmd_graph(config_path, &name, store.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init { path, force } => cmd_config_init(path, force),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_generate(
    config_path: Option<&Path>,
    stdout: bool,
    out: Option<&Path>,
    store: Option<&Path>,
) -> Result<()> {
    let mut config: AppConfig = load_config(config_path)?;
    if let Some(out) = out {
        config.defaults.output_dir = out.to_string_lossy().to_string();
    }

    let mut storage: Box<dyn DocumentStorage> = if stdout {
        Box::new(StdoutDocumentStorage::new())
    } else {
        Box::new(FilesystemDocumentStorage::new(
            &config.defaults.output_dir,
            env!("CARGO_PKG_VERSION"),
        )?)
    };

    info!(
        output = %config.defaults.output_dir,
        stdout,
        "starting generate"
    );

    // Progress output would interleave with printed documents.
    let progress: Box<dyn ProgressReporter> = if stdout {
        Box::new(pipeline::SilentProgress)
    } else {
        Box::new(CliProgress::new())
    };

    let result = match store {
        Some(path) => {
            let mut graph = RelationshipService::new(JsonRelationshipStore::open(path)?);
            pipeline::generate(&config, &mut graph, storage.as_mut(), progress.as_ref())?
        }
        None => {
            let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
            pipeline::generate(&config, &mut graph, storage.as_mut(), progress.as_ref())?
        }
    };

    if !stdout {
        print_summary(&config, &result);
    }
    Ok(())
}

fn print_summary(config: &AppConfig, result: &GenerateResult) {
    println!();
    println!("  Documentation generated");
    println!("  Entities:  {}", result.entity_count);
    println!("  Edges:     {}", result.edge_count);
    println!("  Documents: {}", result.document_count);
    println!("  Output:    {}", config.defaults.output_dir);
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn cmd_list(config_path: Option<&Path>, entity_type: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let collection = pipeline::discover(&config)?;
    let filter = entity_type.map(EntityType::from);

    let mut shown = 0;
    for entity in collection.entities() {
        if filter.as_ref().is_some_and(|t| t != entity.entity_type()) {
            continue;
        }
        println!(
            "{:<10} {:<30} {} attribute(s)",
            entity.entity_type(),
            entity.name(),
            entity.attribute_count()
        );
        shown += 1;
    }

    if shown == 0 {
        println!("No entities found.");
    }
    Ok(())
}

fn cmd_graph(config_path: Option<&Path>, name: &str, store: Option<&Path>) -> Result<()> {
    match store {
        Some(path) => {
            let graph = RelationshipService::new(JsonRelationshipStore::open(path)?);
            print_graph(&graph, name)
        }
        None => {
            let config = load_config(config_path)?;
            let collection = pipeline::discover(&config)?;
            let mut graph = RelationshipService::new(MemoryRelationshipStore::new());
            build_relationships(&collection, &mut graph)?;
            print_graph(&graph, name)
        }
    }
}

fn print_graph<S: RelationshipStore>(graph: &RelationshipService<S>, name: &str) -> Result<()> {
    println!("{name}");
    for kind in RelationshipType::ALL {
        let parents = graph.get_entity_parents(name, kind)?;
        let children = graph.get_entity_children(name, kind)?;
        println!("  {kind} parents:  {}", join_or_dash(&parents));
        println!("  {kind} children: {}", join_or_dash(&children));
    }
    Ok(())
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn cmd_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config_file_path()?,
    };
    if path.exists() && !force {
        return Err(eyre!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    let path = init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_generated(&self, entity: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {entity}"));
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "drdocer", "-vv", "--config", "x.toml", "generate", "--stdout", "--store", "g.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
        match cli.command {
            Command::Generate { stdout, out, store } => {
                assert!(stdout);
                assert!(out.is_none());
                assert_eq!(store.as_deref(), Some(Path::new("g.json")));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn parses_list_type_filter() {
        let cli = Cli::try_parse_from(["drdocer", "list", "--type", "server"]).unwrap();
        match cli.command {
            Command::List { entity_type } => assert_eq!(entity_type.as_deref(), Some("server")),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn join_or_dash_formats() {
        assert_eq!(join_or_dash(&[]), "-");
        assert_eq!(join_or_dash(&["a".into(), "b".into()]), "a, b");
    }
}
