//! CLI argument definitions using clap
//!
//! Commands:
//! - gcds add --owner <owner> --uid <uid> [--contact <json>|-]
//! - gcds remove --owner <owner> --uid <uid> [--contact <json>|-]
//! - gcds find <field> <value>
//! - gcds entry <id>
//! - gcds clear [--owner <owner>]
//! - gcds flush

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gcds - Global Contacts Data Store
#[derive(Parser, Debug)]
#[command(name = "gcds")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the datastore file (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge an origin contact into the store
    Add {
        /// Owner of the origin address book
        #[arg(long)]
        owner: String,

        /// Contact id inside the origin address book
        #[arg(long)]
        uid: String,

        /// Contact JSON, or "-" to read it from stdin (default)
        #[arg(long, default_value = "-")]
        contact: String,
    },

    /// Remove an origin contact from its merged contact
    Remove {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        uid: String,

        /// Contact JSON, or "-" to read it from stdin. Omit to remove
        /// without a payload.
        #[arg(long)]
        contact: Option<String>,
    },

    /// Find merged contacts by tel, email, name, givenName or familyName
    Find { field: String, value: String },

    /// Show the origin references of one merged contact
    Entry { id: u64 },

    /// Remove every contact of one origin store, or everything
    Clear {
        #[arg(long)]
        owner: Option<String>,
    },

    /// Persist the index snapshot
    Flush,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
