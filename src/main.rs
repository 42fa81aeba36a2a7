use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use schemasnap::config::DbConfig;
use schemasnap::prelude::{
    DatabaseProfile, LogicRegistry, ObjectBasedResult, ObjectKind, ObjectName, ObjectReference,
    ReportRenderer, SnapshotObjectsAction,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    /// Foreign keys, one entry per constraint
    ForeignKeys,
    /// Primary keys, one entry per table
    PrimaryKeys,
}

impl From<Target> for ObjectKind {
    fn from(target: Target) -> Self {
        match target {
            Target::ForeignKeys => ObjectKind::ForeignKey,
            Target::PrimaryKeys => ObjectKind::PrimaryKey,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "schemasnap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Kind of object to snapshot
    target: Target,

    /// Catalog to look in
    #[arg(long)]
    catalog: Option<String>,

    /// Schema to look in (default: public when nothing else is given)
    #[arg(long)]
    schema: Option<String>,

    /// Only objects belonging to this table
    #[arg(long)]
    table: Option<String>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("schemasnap v{}", env!("CARGO_PKG_VERSION"));

    let required = [ObjectKind::ForeignKey, ObjectKind::PrimaryKey];
    let registry = LogicRegistry::with_builtins();
    registry
        .ensure_complete(&required)
        .context("Snapshot logic registry is incomplete")?;

    let config = DbConfig::load(&cli.env_file).context("Failed to load database configuration")?;
    debug!(connection = ?config.redacted_connection_string(), "Loaded configuration");

    let related_to = related_reference(&cli);
    let action = SnapshotObjectsAction::new(cli.target.into(), related_to);
    info!(action = %action, "Starting snapshot");

    let profile = config.profile();
    let result = snapshot_database(&registry, &config, &profile, &action)?;

    let report = ReportRenderer::new()
        .render(&action, &profile.short_name, &result)
        .context("Failed to render report")?;
    println!("{}", report);

    Ok(())
}

/// Most specific scope the options describe
fn related_reference(cli: &Cli) -> ObjectReference {
    let catalog = cli.catalog.as_deref();
    let schema = cli.schema.as_deref();

    if let Some(table) = cli.table.as_deref() {
        let name = match (catalog, schema) {
            (None, None) => ObjectName::simple(table),
            (None, Some(_)) => ObjectName::new([schema, Some(table)]),
            _ => ObjectName::new([catalog, schema, Some(table)]),
        };
        ObjectReference::new(ObjectKind::Table, name)
    } else if let Some(schema) = schema {
        let name = match catalog {
            Some(_) => ObjectName::new([catalog, Some(schema)]),
            None => ObjectName::simple(schema),
        };
        ObjectReference::new(ObjectKind::Schema, name)
    } else if let Some(catalog) = catalog {
        ObjectReference::new(ObjectKind::Catalog, ObjectName::simple(catalog))
    } else {
        ObjectReference::new(ObjectKind::Schema, ObjectName::simple("public"))
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(feature = "postgres")]
fn snapshot_database(
    registry: &LogicRegistry,
    config: &DbConfig,
    profile: &DatabaseProfile,
    action: &SnapshotObjectsAction,
) -> Result<ObjectBasedResult> {
    use postgres::NoTls;
    use schemasnap::prelude::Scope;
    use schemasnap::PostgresExecutor;

    config
        .ensure_postgres_compatible()
        .context("Unsupported capability settings")?;

    info!(connection = ?config.redacted_connection_string(), "Connecting to PostgreSQL");

    let mut client = postgres::Client::connect(&config.postgres_connection_string(), NoTls)
        .with_context(|| {
            format!(
                "Failed to connect to PostgreSQL at {}",
                config.redacted_connection_string()
            )
        })?;

    info!("Connected to database");

    let mut executor = PostgresExecutor::new(&mut client);
    let mut scope = Scope::new(profile, &mut executor);
    let result = registry
        .snapshot(action, &mut scope)
        .context("Failed to snapshot database objects")?;

    Ok(result)
}

#[cfg(not(feature = "postgres"))]
fn snapshot_database(
    _registry: &LogicRegistry,
    _config: &DbConfig,
    _profile: &DatabaseProfile,
    _action: &SnapshotObjectsAction,
) -> Result<ObjectBasedResult> {
    bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}
