//! LineFrame command-line front end.
//!
//! Inspects, upgrades and moves document files, and manages the local
//! document store.

mod commands;
mod shortcuts;

pub use commands::{CliError, CliResult, Command, STORE_ENV, USAGE, run, summarize};
pub use shortcuts::{Shortcut, ShortcutRegistry};
