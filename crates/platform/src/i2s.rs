//! I2S driver callback interface
//!
//! The I2S master driver owns bit-clock/frame-clock timing and runs its own
//! transfer loop. It calls back into the application through
//! [`I2sCallbacks`], synchronously and never re-entrantly:
//!
//! ```text
//! init ──► send ─► receive ─► restart_check ─┬─ Continue ─► send ...
//!  ▲                                         │
//!  └──────────────── Restart ◄───────────────┘
//! ```
//!
//! `init` runs once before the first frame and again after every
//! [`RestartDecision::Restart`]. A driver stops its loop when `init`
//! reports [`InitStatus::Exhausted`].

/// Data justification relative to the frame-clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2sMode {
    /// Philips I2S: first data bit one bit-clock after the LRCLK edge.
    #[default]
    I2s,
    /// Left-justified: first data bit coincides with the LRCLK edge.
    LeftJustified,
}

impl I2sMode {
    /// Returns `true` for Philips I2S justification.
    pub const fn is_i2s_justified(self) -> bool {
        matches!(self, Self::I2s)
    }
}

/// Per-round driver configuration filled in by [`I2sCallbacks::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sConfig {
    /// Justification mode for the next round.
    pub mode: I2sMode,
    /// MCLK/BCLK ratio the application configured on the bit-clock block.
    pub mclk_bclk_ratio: u32,
}

impl Default for I2sConfig {
    fn default() -> Self {
        Self {
            mode: I2sMode::I2s,
            mclk_bclk_ratio: 2,
        }
    }
}

/// Answer to the driver's per-frame restart poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartDecision {
    /// Keep streaming with the current configuration.
    Continue,
    /// Stop the clocks and call [`I2sCallbacks::init`] again.
    Restart,
}

/// Result of [`I2sCallbacks::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStatus {
    /// A new round is configured; the driver starts streaming.
    Configured,
    /// Nothing left to run; the driver leaves its loop.
    Exhausted,
}

/// Callback set an I2S master driver invokes.
///
/// Implementations are called from the driver's own loop, one callback at a
/// time, so they take `&mut self` and need no locking.
pub trait I2sCallbacks {
    /// Error type surfaced from `init`.
    type Error: core::fmt::Debug;

    /// Prepare the next round and fill in the driver configuration.
    fn init(&mut self, config: &mut I2sConfig) -> Result<InitStatus, Self::Error>;

    /// Polled once per frame, after the frame's samples were exchanged.
    fn restart_check(&mut self) -> RestartDecision;

    /// Provide one frame of output samples, one per output channel.
    fn send(&mut self, samples: &mut [i32]);

    /// Consume one frame of input samples, one per input channel.
    fn receive(&mut self, samples: &[i32]);
}
