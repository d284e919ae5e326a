//! Command-line front end for the organizer core.
//!
//! # Responsibility
//! - Map subcommands onto manager add/edit/toggle/delete/list use-cases.
//! - Keep all validation and persistence inside `organizer_core`.

mod commands;
mod handlers;

use clap::Parser;
use commands::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = handlers::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
