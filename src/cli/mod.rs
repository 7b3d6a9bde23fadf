//! gcds command line interface
//!
//! A thin wrapper over `GlobalContacts` backed by file stores. Each
//! invocation performs one operation and prints one JSON line:
//!
//! ```text
//! {"status":"ok","data":...}
//! {"status":"error","code":"GCDS_...","message":"..."}
//! ```

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliResult};
