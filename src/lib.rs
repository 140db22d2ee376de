//! ABC behavior incident capture and reporting.
//!
//! The core ([`timer`], [`capture`], [`aggregation`], [`reports`]) talks to
//! storage only through the traits in [`collaborators`]; [`db::Database`] is
//! the SQLite implementation the CLI uses.

pub mod aggregation;
pub mod capture;
mod cli;
pub mod collaborators;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod settings;
pub mod timer;
mod utils;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;

pub use cli::{Cli, Commands, RecordArgs};

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(cli::execute(cli))
}
