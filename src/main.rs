//! gcds entry point
//!
//! All logic is delegated to the CLI module; the error line has already
//! been printed when `run` fails.

use globalcontacts::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}
