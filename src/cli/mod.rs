//! CLI layer for ReturnSight.
//!
//! Provides the command-line interface using clap, with one subcommand
//! per service plus the CSV seeding helper.

pub mod commands;
pub mod parser;

pub use commands::execute;
pub use parser::{Cli, Commands};
