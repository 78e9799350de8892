use anyhow::{bail, Result};
use aqlite_api::{Key, Request};
use aqlite_core::ClientConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod output;
mod session;
mod shell;
mod table;

use output::{print_deliveries, OutputFormat};
use session::Session;

#[derive(Parser)]
#[command(name = "aqlite")]
#[command(about = "AQL-lite client over an in-memory key-value store", long_about = None)]
struct Cli {
    /// TTL in seconds for written records
    #[arg(long, global = true)]
    ttl: Option<u32>,

    /// JSON file to preload: {namespace: {set: {key: {bin: value}}}}
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    /// Output format (table, json, jsonl, csv)
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one AQL statement
    Query {
        /// SELECT, INSERT, UPDATE or DELETE statement
        aql: String,
    },
    /// Scan a namespace or one of its sets
    Browse {
        namespace: String,
        set: Option<String>,
    },
    /// List namespaces and their sets
    Namespaces,
    /// Delete one record by key
    Delete {
        namespace: String,
        set: String,
        key: String,
    },
    /// Overwrite one bin, keeping the type of the stored value when possible
    Edit {
        namespace: String,
        set: String,
        key: String,
        bin: String,
        value: String,
    },
    /// Delete every record of a set
    Truncate { namespace: String, set: String },
    /// Start interactive shell
    Shell,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        match self.ttl {
            Some(ttl) => ClientConfig::new().with_default_ttl(ttl),
            None => ClientConfig::new(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = Session::open(cli.client_config(), cli.seed.as_deref())?;

    let request = match cli.command {
        Commands::Shell => {
            let shell = shell::Shell::new(session, cli.output)?;
            return shell.run();
        }
        Commands::Query { aql } => Request::aql(aql),
        Commands::Browse { namespace, set } => Request::Browse { namespace, set },
        Commands::Namespaces => Request::Catalogue,
        Commands::Delete { namespace, set, key } => {
            Request::DeleteRecord(Key::new(namespace, set, key))
        }
        Commands::Edit {
            namespace,
            set,
            key,
            bin,
            value,
        } => Request::EditBin {
            key: Key::new(namespace, set, key),
            bin,
            raw: value,
        },
        Commands::Truncate { namespace, set } => Request::Truncate { namespace, set },
    };

    let deliveries = session.run(request);
    session.close();

    let errors = print_deliveries(&deliveries, cli.output)?;
    if errors > 0 {
        bail!("{} error{} reported", errors, if errors == 1 { "" } else { "s" });
    }
    Ok(())
}
