// Bank Directory CLI
//
// Commands:
// - `bank-directory render <slices.json>`   CMS slices → rendered nodes (JSON)
// - `bank-directory rank <records.json>`    backend records → ranked cards (JSON)
// - `bank-directory browse <records.json>`  terminal UI (`tui` feature)

use anyhow::{bail, Context, Result};
use bank_directory::config::{build_config, AppConfig, CliOverrides};
use bank_directory::directory::{
    default_scope, DirectorySession, DirectoryState, FilterState, LocationScope, SnapshotSource,
};
use bank_directory::slices::{slices_from_document, RenderOptions, SliceRegistry};
use bank_directory::telemetry::init_tracing;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Ethical bank directory and CMS slice renderer
#[derive(Parser, Debug)]
#[command(name = "bank-directory")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE", env = "BANKDIR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Environment (development, staging, production)
    #[arg(long = "env", global = true)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct LocationArgs {
    /// ISO country code, e.g. GB
    #[arg(long)]
    country: Option<String>,

    /// US state code (required when country is US)
    #[arg(long)]
    state: Option<String>,

    /// IP-geolocation payload used when --country is not given
    #[arg(long, value_name = "FILE")]
    geo: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a CMS slice document to JSON nodes
    Render {
        /// Slice list, or a document with a `body`/`slices` array
        file: PathBuf,

        /// Suppress dev diagnostics regardless of environment
        #[arg(long)]
        production: bool,
    },

    /// Rank bank records for a location, query and filters
    Rank {
        /// Backend snapshot (defaults to data.records_path)
        records: Option<PathBuf>,

        #[command(flatten)]
        location: LocationArgs,

        /// Fuzzy bank name query
        #[arg(short, long, default_value = "")]
        query: String,

        /// Active filter as category:key (repeatable)
        #[arg(short, long = "filter", value_name = "CATEGORY:KEY")]
        filters: Vec<String>,
    },

    /// Browse the directory in a terminal UI
    Browse {
        /// Backend snapshot (defaults to data.records_path)
        records: Option<PathBuf>,

        #[command(flatten)]
        location: LocationArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        config_file: cli.config.clone(),
        log_level: cli.log_level.clone(),
        environment: cli.environment.clone(),
        ..Default::default()
    };
    let config = build_config(&overrides).context("invalid configuration")?;

    init_tracing(config.log_level.as_filter_str());
    tracing::debug!(
        environment = %config.environment,
        threshold = config.search.threshold,
        "configuration loaded"
    );

    match cli.command {
        Commands::Render { file, production } => run_render(&config, &file, production),
        Commands::Rank {
            records,
            location,
            query,
            filters,
        } => run_rank(&config, records, &location, query, &filters),
        Commands::Browse { records, location } => run_browse(&config, records, &location),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn run_render(config: &AppConfig, file: &Path, production: bool) -> Result<()> {
    let document = read_json(file)?;
    let slices = slices_from_document(&document);

    let options = if production {
        RenderOptions::production()
    } else {
        config.render_options()
    };
    let report = SliceRegistry::new(options).render_report(&slices);

    tracing::info!(
        slices = slices.len(),
        nodes = report.nodes.len(),
        diagnostics = report.diagnostics.len(),
        "rendered slices"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn records_path(config: &AppConfig, records: Option<PathBuf>) -> Result<PathBuf> {
    match records.or_else(|| config.data.records_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("no records file given (pass a path or set data.records_path / BANKDIR_RECORDS)"),
    }
}

fn resolve_location(args: &LocationArgs) -> Result<LocationScope> {
    if args.country.is_some() {
        return Ok(LocationScope::new(args.country.as_deref(), args.state.as_deref()));
    }
    let payload = match &args.geo {
        Some(path) => Some(read_json(path)?),
        None => None,
    };
    let mut location = default_scope(payload.as_ref());
    if args.state.is_some() {
        location = LocationScope::new(location.country.as_deref(), args.state.as_deref());
    }
    Ok(location)
}

fn run_rank(
    config: &AppConfig,
    records: Option<PathBuf>,
    location: &LocationArgs,
    query: String,
    filter_specs: &[String],
) -> Result<()> {
    let path = records_path(config, records)?;
    let source = SnapshotSource::from_file(&path)
        .with_context(|| format!("failed to load records from {}", path.display()))?;

    let mut filters = FilterState::default();
    for spec in filter_specs {
        filters.enable(spec)?;
    }

    let mut session = DirectorySession::new(config.matcher()).with_location(resolve_location(location)?);
    session.set_query(query);
    session.set_filters(filters);
    session.run(&source);

    let exclusions = config.exclusions();
    let output = match session.state() {
        DirectoryState::Error { message } => bail!("{}", message),
        DirectoryState::Empty if !session.request().location.is_complete() => {
            tracing::warn!("location incomplete: pass --country (and --state for US)");
            json!({ "status": "empty", "cards": [] })
        }
        state => json!({
            "status": state.label(),
            "location": session.request().location,
            "filters": session.request().filters.active_specs(),
            "cards": session.cards(&exclusions),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_browse(config: &AppConfig, records: Option<PathBuf>, location: &LocationArgs) -> Result<()> {
    use bank_directory::ui;

    let path = records_path(config, records)?;
    let source = SnapshotSource::from_file(&path)
        .with_context(|| format!("failed to load records from {}", path.display()))?;

    println!("🏦 Loaded {} banks from {}", source.len(), path.display());
    println!("Starting UI... (Press 'q' to quit)\n");

    let session = DirectorySession::new(config.matcher()).with_location(resolve_location(location)?);
    let mut app = ui::App::new(source, session, config.exclusions());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_browse(_config: &AppConfig, _records: Option<PathBuf>, _location: &LocationArgs) -> Result<()> {
    bail!("TUI mode not available: rebuild with --features tui")
}
