//! CLI command implementations
//!
//! Every command opens the file-backed datastore under the configured data
//! directory, runs one manager operation, and prints a single JSON line.
//! Mutating commands flush the index before returning.

use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{read_contact, write_error, write_response};
use crate::config::GcdsConfig;
use crate::contact::{MergedContactId, OriginStore};
use crate::manager::GlobalContacts;
use crate::observability::init_logging;
use crate::store::{DatastoreProvider, FileProvider};

/// Main CLI entry point
///
/// Failures are reported as an error JSON line before being returned.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.json_logs);

    let result = run_cli(cli);
    if let Err(ref e) = result {
        write_error(e.code(), &e.to_string())?;
    }
    result
}

fn run_cli(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let data = runtime.block_on(run_command(config, cli.command))?;
    write_response(data)
}

/// Resolve configuration: file (or defaults), then `--data-dir`.
fn load_config(cli: &Cli) -> CliResult<GcdsConfig> {
    let config = match &cli.config {
        Some(path) => GcdsConfig::from_file(path)?,
        None => GcdsConfig::default(),
    };

    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir.clone()),
        None => config,
    })
}

/// Run one command against a manager over the file provider
pub async fn run_command(config: GcdsConfig, command: Command) -> CliResult<Value> {
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let provider: Arc<dyn DatastoreProvider> = Arc::new(FileProvider::new(config.data_dir.clone()));
    let gcds = GlobalContacts::new(config, Some(provider));

    execute(&gcds, command).await
}

async fn execute(gcds: &GlobalContacts, command: Command) -> CliResult<Value> {
    match command {
        Command::Add { owner, uid, contact } => {
            let contact = read_contact(&contact)?;
            let id = gcds.add(&OriginStore::new(owner), &uid, &contact).await?;
            let flushed = gcds.flush().await?;
            Ok(json!({ "id": id, "flushed": flushed }))
        }

        Command::Remove { owner, uid, contact } => {
            let contact = contact.as_deref().map(read_contact).transpose()?;
            gcds.remove(&OriginStore::new(owner), &uid, contact.as_ref()).await?;
            let flushed = gcds.flush().await?;
            Ok(json!({ "removed": uid, "flushed": flushed }))
        }

        Command::Find { field, value } => {
            let found = gcds.find_by_field(&field, &value).await?;
            Ok(serde_json::to_value(found)?)
        }

        Command::Entry { id } => {
            let entry = gcds.get_data(MergedContactId::new(id)).await?;
            Ok(serde_json::to_value(entry)?)
        }

        Command::Clear { owner } => {
            let origin = owner.map(OriginStore::new);
            gcds.clear(origin.as_ref()).await?;
            let flushed = gcds.flush().await?;
            Ok(json!({ "cleared": origin.map(|o| o.owner), "flushed": flushed }))
        }

        Command::Flush => {
            gcds.open().await?;
            let flushed = gcds.flush().await?;
            Ok(json!({ "flushed": flushed, "revision": gcds.revision_id() }))
        }
    }
}
