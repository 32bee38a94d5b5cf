mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use policy::{ANONYMOUS_ROLE, Caller, Policy};
use storage::{CreateMode, DEFAULT_ID, FundingStore, ListKind};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "funding.toml";

#[derive(Parser)]
#[command(name = "funding-state")]
#[command(about = "Set up and edit the shared funding state record", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Database path, overriding the config file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Access policy file, replacing the config's [access] table
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Role to run statements as
    #[arg(long, default_value = ANONYMOUS_ROLE)]
    role: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the table and seed the default row
    Init {
        /// Only do the steps that are missing
        #[arg(long)]
        if_not_exists: bool,
    },
    /// Create the funding_state table
    CreateTable {
        #[arg(long)]
        if_not_exists: bool,
    },
    /// Insert the default row
    Seed,
    /// Print a row as JSON
    Show {
        #[arg(long, default_value = DEFAULT_ID)]
        id: String,
        /// Print every visible row
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Replace a list on the default row
    Set {
        /// applied or irrelevant
        list: ListKind,
        items: Vec<String>,
    },
    /// Show which list holds an item
    Status { item: String },
    /// Put an item on a list, taking it off the other one
    Mark { list: ListKind, item: String },
    /// Take an item off a list
    Unmark { list: ListKind, item: String },
    /// Delete a row
    Delete {
        #[arg(long, default_value = DEFAULT_ID)]
        id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let db_path = cli.db.unwrap_or_else(|| config.database.path.clone());
    let access = match &cli.policy {
        Some(path) => Policy::load(path)?,
        None => config.access,
    };
    let store = FundingStore::open_with(&db_path, access, config.database.busy_timeout())?;
    let caller = Caller::with_role(cli.role);
    debug!(db = %db_path.display(), role = %caller.role, "running command");

    match cli.command {
        Commands::Init { if_not_exists } => {
            let report = store.setup(create_mode(if_not_exists))?;
            info!(?report, "setup finished");
            println!(
                "table: {}, default row: {}",
                if report.created_table { "created" } else { "exists" },
                if report.seeded { "seeded" } else { "exists" },
            );
        }
        Commands::CreateTable { if_not_exists } => {
            let created = store.create_table(create_mode(if_not_exists))?;
            println!("table: {}", if created { "created" } else { "exists" });
        }
        Commands::Seed => {
            store.seed()?;
            println!("default row: seeded");
        }
        Commands::Show { id, all } => {
            if all {
                print_json(&store.select_all(&caller)?)?;
            } else {
                let state = store
                    .select(&caller, &id)?
                    .ok_or_else(|| storage::Error::not_found(&id))?;
                print_json(&state)?;
            }
        }
        Commands::Set { list, items } => {
            store.set_list(&caller, DEFAULT_ID, list, &items)?;
            println!("{list}: {} item(s)", items.len());
        }
        Commands::Status { item } => match store.load(&caller)?.status(&item) {
            Some(list) => println!("{item}: {list}"),
            None => println!("{item}: unmarked"),
        },
        Commands::Mark { list, item } => {
            let changed = match list {
                ListKind::Applied => store.mark_applied(&caller, &item)?,
                ListKind::Irrelevant => store.mark_irrelevant(&caller, &item)?,
            };
            print_change(changed, &item, list);
        }
        Commands::Unmark { list, item } => {
            let changed = store.unmark(&caller, list, &item)?;
            print_change(changed, &item, list);
        }
        Commands::Delete { id } => {
            if store.delete(&caller, &id)? {
                println!("deleted '{id}'");
            } else {
                println!("no row '{id}'");
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Ok(Config::load(path)?)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default_config())
    }
}

fn create_mode(if_not_exists: bool) -> CreateMode {
    if if_not_exists {
        CreateMode::IfNotExists
    } else {
        CreateMode::Strict
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_change(changed: bool, item: &str, list: ListKind) {
    if changed {
        println!("{item}: {list}");
    } else {
        println!("{item}: unchanged");
    }
}
