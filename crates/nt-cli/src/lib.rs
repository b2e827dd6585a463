//! Note time tracker CLI library.
//!
//! This crate provides the `nt` command-line interface over `nt-core`:
//! configuration, filesystem access to notes and the subcommands.

mod cli;
pub mod commands;
mod config;
pub mod host;

pub use cli::{Cli, Commands, ConfigAction, ExportArg};
pub use config::Config;
pub use host::{DocumentHost, FsHost, Notice};
