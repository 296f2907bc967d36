//! Command-line subcommands

pub mod list;
pub mod new;
