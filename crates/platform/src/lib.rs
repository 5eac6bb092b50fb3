//! Hardware Abstraction Layer for the I2S master conformance harness
//!
//! This crate provides the trait seams between the harness and the pieces of
//! the tile it does not own: the I2S driver that calls back into it, the
//! signal-line ports wired to the tester, and the clock block that turns the
//! external master clock into a bit clock.
//!
//! # Architecture Layers
//!
//! ```text
//! Harness (harness crate: matrix, samples, handshake)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Tile ports / clock blocks / I2S driver library
//! ```
//!
//! # Abstractions
//!
//! - [`I2sCallbacks`] - the four callbacks an I2S driver invokes per round/frame
//! - [`Port`] - opaque signal-line handle with explicit write synchronisation
//! - [`ClockBlock`] - divider-based bit-clock generator
//! - [`audio_types`] - validated bit depth and clock-ratio newtypes
//!
//! # Features
//!
//! - `std`: Enable the recording mocks (for testing)
//! - `defmt`: Enable defmt::Format derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // port and signal names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio_types;
pub mod clock_block;
pub mod i2s;
pub mod mocks;
pub mod port;

// Re-export main traits
pub use clock_block::{ClockBlock, ClockSource};
pub use i2s::{I2sCallbacks, I2sConfig, I2sMode, InitStatus, RestartDecision};
pub use port::{InputPinPort, OutputPinPort, PinPortError, Port};

pub use audio_types::{BitDepth, MclkBclkRatio, OutOfRangeError};
