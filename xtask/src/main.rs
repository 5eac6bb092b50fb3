// Host tooling crate: unwrap/expect/panic acceptable outside the tile.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
#![allow(missing_docs)]

mod hil;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "I2S conformance harness development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tests (unit, integration and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Run the host bench over the bit-depth × channel-layout build matrix
    Hil {
        /// Sweep level: smoke runs the first MCLK only, nightly runs them all
        #[arg(long, value_enum, default_value_t = hil::Level::Smoke)]
        level: hil::Level,
        /// Restrict to one bit depth (16 or 32)
        #[arg(long)]
        bits: Option<u8>,
        /// Keep going after a failing configuration
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Hil {
            level,
            bits,
            keep_going,
        } => hil::run(level, bits, keep_going),
    }
}
