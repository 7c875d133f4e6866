//! Shift & dispatch analytics CLI library.
//!
//! This crate provides the CLI interface around [`vda_core`]: CSV loading,
//! configuration, and the report/correlate/validate commands.

mod cli;
pub mod commands;
mod config;
pub mod loader;

pub use cli::{Cli, Commands, Selection, Sources};
pub use config::Config;
