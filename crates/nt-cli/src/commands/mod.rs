//! CLI subcommand implementations.

pub mod config;
pub mod export;
pub mod show;
pub mod start_stop;
pub mod update;
pub mod util;
pub mod watch;
