use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use aircraftdb::commands::{self, LookupTarget};
use aircraftdb::config::AppConfig;
use aircraftdb::log_format::TargetFirstFormat;
use aircraftdb::store::{ModelFilters, RegistryFilters, Store};

#[derive(Parser, Debug)]
#[command(
    name = "aircraftdb",
    version,
    about = "Ingest FAA aircraft registry snapshots into a local store and query them."
)]
struct Cli {
    /// TOML configuration file (default: $AIRCRAFTDB_CONFIG, then ./aircraftdb.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file, overriding the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every supported file of a directory
    Ingest { dir: PathBuf },
    /// Ingest a single file
    IngestFile { file: PathBuf },
    /// Row counts per table
    Stats,
    /// Registry entry with its model, engine and deregistration history
    Lookup {
        #[arg(long, conflicts_with = "transponder", required_unless_present = "transponder")]
        registration: Option<String>,
        /// Mode S transponder address in hex
        #[arg(long)]
        transponder: Option<String>,
    },
    /// Aircraft model by manufacturer/model code
    Model { code: String },
    /// Engine by code
    Engine { code: String },
    /// Dealer by certificate number
    Dealer { certificate: String },
    /// Search registry entries
    SearchRegistry(SearchRegistryArgs),
    /// Search aircraft models
    SearchModels(SearchModelsArgs),
    /// Run a read-only SELECT
    Query { sql: String },
}

#[derive(Args, Debug)]
struct SearchRegistryArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    manufacturer: Option<String>,
    #[arg(long)]
    model_code: Option<String>,
    #[arg(long)]
    type_aircraft: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    year_from: Option<i64>,
    #[arg(long)]
    year_to: Option<i64>,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct SearchModelsArgs {
    #[arg(long)]
    manufacturer: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    type_aircraft: Option<String>,
    #[arg(long)]
    engines: Option<i64>,
    #[arg(long)]
    min_seats: Option<i64>,
    #[arg(long)]
    limit: Option<usize>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(TargetFirstFormat::new())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref(), cli.database.as_deref())?;
    debug!("Resolved configuration: {:?}", config);

    let store = Store::open(config.store.clone())
        .with_context(|| format!("Failed to open store at {:?}", config.store.path))?;

    let output: Value = match cli.command {
        Command::Ingest { dir } => {
            commands::handle_ingest_directory(&store, &config.ingest, dir).await?
        }
        Command::IngestFile { file } => {
            commands::handle_ingest_file(&store, &config.ingest, file).await?
        }
        Command::Stats => commands::handle_stats(&store)?,
        Command::Lookup {
            registration,
            transponder,
        } => {
            let target = match (registration, transponder) {
                (Some(registration), _) => LookupTarget::Registration(registration),
                (None, Some(hex)) => LookupTarget::Transponder(hex),
                (None, None) => bail!("lookup needs --registration or --transponder"),
            };
            commands::handle_lookup(&store, &target)?
        }
        Command::Model { code } => commands::handle_model(&store, &code)?,
        Command::Engine { code } => commands::handle_engine(&store, &code)?,
        Command::Dealer { certificate } => commands::handle_dealer(&store, &certificate)?,
        Command::SearchRegistry(args) => {
            let filters = RegistryFilters {
                registrant_name: args.name,
                city: args.city,
                state: args.state,
                manufacturer: args.manufacturer,
                mfr_mdl_code: args.model_code,
                type_aircraft: args.type_aircraft,
                status_code: args.status,
                year_from: args.year_from,
                year_to: args.year_to,
            };
            commands::handle_search_registry(&store, &filters, args.limit)?
        }
        Command::SearchModels(args) => {
            let filters = ModelFilters {
                manufacturer: args.manufacturer,
                model: args.model,
                type_aircraft: args.type_aircraft,
                num_engines: args.engines,
                min_seats: args.min_seats,
            };
            commands::handle_search_models(&store, &filters, args.limit)?
        }
        Command::Query { sql } => commands::handle_query(&store, &sql)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
