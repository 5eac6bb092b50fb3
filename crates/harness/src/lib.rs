//! I2S master (external clock) conformance harness
//!
//! Runs an I2S master driver through a sweep of MCLK/BCLK ratios, master
//! clocks and justification modes while a tester device watches the bus.
//! The harness is the driver's application: it implements
//! [`I2sCallbacks`](platform::I2sCallbacks), feeds known samples out, checks
//! known samples in, tells the tester what to expect before each round and
//! collects its verdict after.
//!
//! # Layout
//!
//! - [`matrix`] - parameter sweep order and exhaustion
//! - [`samples`] - sample tables and per-channel cursors
//! - [`handshake`] - strobe/data/response protocol to the tester
//! - [`clock`] - bit-clock divider setup
//! - [`state`] / [`harness`] - the callbacks and the state they own
//! - [`report`] - per-round results and exit status
//! - [`roster`], [`sim`] - host-only worker roster, simulated tester and
//!   loopback driver (`std` feature)
//!
//! # Features
//!
//! - `std` (default): host build with the roster and simulator
//! - `data-bits-16`: 16-bit samples in [`HarnessConfig::BUILD`]
//! - `smoke`: first MCLK only in [`HarnessConfig::BUILD`]
//! - `defmt` / `tracing`: logging backend
//! - `bench`: the `i2s-bench` host binary

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod clock;
pub mod config;
pub mod error;
pub mod handshake;
pub mod harness;
pub mod matrix;
pub mod report;
pub mod samples;
pub mod state;

#[cfg(feature = "std")]
pub mod roster;
#[cfg(feature = "std")]
pub mod sim;

pub use config::{ConfigError, HarnessConfig, TestLevel};
pub use error::HarnessError;
pub use handshake::{LinkError, TesterConfig, TesterLink, Verdict};
pub use harness::Harness;
pub use matrix::{MatrixPoint, MatrixSequencer, Step};
pub use report::{RoundRecord, RunOutcome, RunReport};
pub use samples::{SampleCursors, SampleMismatch};
pub use state::{HarnessState, RoundState};
