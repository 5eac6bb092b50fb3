//! Host bench for the I2S conformance harness.
//!
//! Runs the full harness against the simulated tester and loopback driver,
//! with the filler roster alongside, and exits with the harness's status:
//! 0 when the final round passed, 1 otherwise.
//!
//! ```bash
//! cargo run -p harness --features bench --bin i2s-bench -- --bits 16 --smoke
//! RUST_LOG=debug cargo run -p harness --features bench --bin i2s-bench -- --num-in 4 --num-out 0
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use embassy_time::Duration;
use harness::roster::WorkerRoster;
use harness::sim::{Fault, LoopbackDriver, SimTester};
use harness::{Harness, HarnessConfig, TestLevel};
use platform::BitDepth;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "i2s-bench")]
#[command(about = "Run the I2S master conformance harness against a simulated tester")]
#[command(version)]
struct Args {
    /// Sample width in bits (16 or 32)
    #[arg(long, default_value_t = 32)]
    bits: u8,

    /// Sweep the first master clock only
    #[arg(long)]
    smoke: bool,

    /// Input data lines (0-4)
    #[arg(long, default_value_t = 4)]
    num_in: u8,

    /// Output data lines (0-4)
    #[arg(long, default_value_t = 4)]
    num_out: u8,

    /// Response-line polls before the tester answers
    #[arg(long, default_value_t = 3)]
    verdict_delay: u32,

    /// Give up on the tester after this many milliseconds
    #[arg(long)]
    verdict_timeout_ms: Option<u64>,

    /// Make the tester fail this round (repeatable)
    #[arg(long = "fail-round")]
    fail_rounds: Vec<usize>,

    /// Corrupt the samples the driver receives in this round (repeatable)
    #[arg(long = "corrupt-rx-round")]
    corrupt_rx_rounds: Vec<usize>,

    /// Filler tasks next to the driver
    #[arg(long, default_value_t = harness::config::FILLER_WORKERS)]
    fillers: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let depth = BitDepth::try_new(args.bits).context("invalid --bits")?;
    let level = if args.smoke { TestLevel::Smoke } else { TestLevel::Full };
    let mut config = HarnessConfig::new(depth, level, args.num_in, args.num_out)
        .context("invalid harness configuration")?;
    if let Some(ms) = args.verdict_timeout_ms {
        config = config.with_verdict_timeout(Duration::from_millis(ms));
    }

    let tester = SimTester::new().with_verdict_delay(args.verdict_delay);
    for round in args.fail_rounds {
        tester.inject(Fault::FailVerdict { round });
    }
    for round in args.corrupt_rx_rounds {
        tester.inject(Fault::CorruptReceive { round });
    }

    tracing::info!(
        bits = depth.bits(),
        ?level,
        num_in = config.num_in(),
        num_out = config.num_out(),
        rounds = config.total_rounds(),
        "starting conformance run"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let roster = WorkerRoster::new(args.fillers);
    let outcome = runtime
        .block_on(roster.run(move || {
            let (strobe, data, response) = tester.ports();
            let mut harness = Harness::new(config, strobe, data, response, tester.clock_block());
            let mut driver = LoopbackDriver::new(tester.clone(), config.num_in(), config.num_out());
            driver
                .run(&mut harness)
                .map(|stats| (stats, harness.into_report(), tester.violations()))
        }))
        .context("driver worker panicked")?;

    let (stats, report, violations) = outcome.value.context("loopback run aborted")?;

    for round in report.failed_rounds() {
        tracing::warn!(
            mclk_hz = round.config.mclk_hz,
            ratio = round.config.ratio,
            mode = ?round.point.mode,
            mismatches = round.mismatches,
            verdict_residual = round.verdict.residual,
            "round failed"
        );
    }
    for violation in &violations {
        tracing::warn!(?violation, "handshake violation");
    }

    tracing::info!(
        rounds = report.rounds().len(),
        failed = report.failed_rounds().count(),
        restarts = report.num_restarts(),
        frames = stats.frames,
        filler_ticks = outcome.filler_ticks,
        exit_code = report.exit_code(),
        "conformance run finished"
    );

    std::process::exit(report.exit_code());
}
