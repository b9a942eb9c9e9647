//! xsctl
//!
//! Offline inspection of Xunsearch project configs and connection values.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Xunsearch client tool
#[derive(Parser, Debug)]
#[command(name = "xsctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a project ini, then list its fields
    Check {
        /// Path to the project ini file
        ini: PathBuf,

        /// Cache parsed configs in Redis instead of in memory
        #[arg(long, env = "XSCTL_REDIS_URL")]
        redis: Option<String>,
    },
    /// Show how a connection value resolves
    Resolve {
        /// Index (primary + shards) or search (shuffled candidates)
        role: Role,

        /// Connection value, e.g. "host1:8383;host2:8383"
        value: Option<String>,

        /// Seed the search shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Approximate distance in meters between two points
    #[command(allow_negative_numbers = true)]
    Geo {
        /// Longitude of the first point
        lon1: f64,
        /// Latitude of the first point
        lat1: f64,
        /// Longitude of the second point
        lon2: f64,
        /// Latitude of the second point
        lat2: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Role {
    Index,
    Search,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    tracing::debug!(command = ?args.command, "Dispatching");

    let mut out = io::stdout().lock();
    match args.command {
        Command::Check { ini, redis } => commands::check(&ini, redis.as_deref(), &mut out),
        Command::Resolve { role, value, seed } => match role {
            Role::Index => commands::resolve_index(value.as_deref(), &mut out),
            Role::Search => commands::resolve_search(value.as_deref(), seed, &mut out),
        },
        Command::Geo {
            lon1,
            lat1,
            lon2,
            lat2,
        } => commands::geo(lon1, lat1, lon2, lat2, &mut out),
    }
}
