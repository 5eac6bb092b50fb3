//! Harness configuration and build-time constants.
//!
//! The tile build fixes everything at compile time, like the driver library
//! it exercises: bit depth and test level come from Cargo features, channel
//! layout from [`HarnessConfig::BUILD`]. Host tooling builds the same struct
//! at runtime through [`HarnessConfig::new`], which applies the same
//! validation the features imply.
//!
//! # Clock plan
//!
//! | Bit depth | MCLK (48 kHz family) | MCLK (44.1 kHz family) |
//! |-----------|----------------------|------------------------|
//! | 32        | 24.576 MHz           | 22.5792 MHz            |
//! | 16        | 12.288 MHz           | 11.2896 MHz            |
//!
//! Each MCLK is chosen so the narrowest ratio in the sweep (2) still lands on
//! 192 kHz / 176.4 kHz with a 2 × `bits` bit frame. A ratio of 1 is not
//! supported by the clock block, so MCLK cannot be any lower.

use embassy_time::Duration;
use platform::BitDepth;

/// Highest MCLK/BCLK exponent in the sweep: ratios 2, 4, 8 (192, 96, 48 kHz).
pub const MAX_RATIO_LOG2: u8 = 3;

/// Sample tables cover this many channels.
pub const MAX_CHANNELS: usize = 8;

/// Data lines available in each direction. Each line carries two channels.
pub const MAX_DATA_LINES: u8 = 4;

/// Channels per I2S data line (left + right).
pub const CHANNELS_PER_LINE: usize = 2;

/// Length of each per-channel sample sequence.
pub const SAMPLES_PER_CHANNEL: usize = 8;

/// Frames streamed before the harness asks the driver to restart.
pub const FRAMES_PER_ROUND: u32 = 4;

/// Busy filler workers launched next to the driver to fill the tile.
pub const FILLER_WORKERS: usize = 7;

/// Extra response-line reads after the acknowledge strobe.
pub const VERDICT_DRAIN_READS: u32 = 10;

/// Justification modes swept per MCLK/ratio pair.
pub const NUM_MODES: usize = 2;

/// MCLK table for 32-bit builds.
pub const MCLK_FREQS_32BIT: [u32; 2] = [24_576_000, 22_579_200];

/// MCLK table for 16-bit builds.
pub const MCLK_FREQS_16BIT: [u32; 2] = [12_288_000, 11_289_600];

/// Largest number of rounds any configuration can run.
pub const MAX_ROUNDS: usize = MAX_RATIO_LOG2 as usize * MCLK_FREQS_32BIT.len() * NUM_MODES;

/// How much of the clock plan to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestLevel {
    /// First MCLK only (per-commit runs).
    Smoke,
    /// Every MCLK in the table (nightly runs).
    Full,
}

/// Rejected configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Only 16- and 32-bit builds have a clock plan.
    UnsupportedBitDepth(u8),
    /// More data lines than the tile exposes in one direction.
    TooManyDataLines(u8),
    /// Neither direction has a data line; nothing to test.
    NoDataLines,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedBitDepth(bits) => {
                write!(f, "no clock plan for {bits}-bit samples (use 16 or 32)")
            }
            Self::TooManyDataLines(n) => {
                write!(f, "{n} data lines requested, at most {MAX_DATA_LINES} available")
            }
            Self::NoDataLines => write!(f, "at least one input or output data line is required"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Everything that shapes a conformance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    bit_depth: BitDepth,
    level: TestLevel,
    num_in: u8,
    num_out: u8,
    verdict_timeout: Option<Duration>,
}

impl HarnessConfig {
    /// Configuration selected by Cargo features: `data-bits-16`, `smoke`.
    /// Four input and four output data lines.
    pub const BUILD: Self = Self {
        bit_depth: if cfg!(feature = "data-bits-16") {
            BitDepth::SIXTEEN
        } else {
            BitDepth::THIRTY_TWO
        },
        level: if cfg!(feature = "smoke") {
            TestLevel::Smoke
        } else {
            TestLevel::Full
        },
        num_in: MAX_DATA_LINES,
        num_out: MAX_DATA_LINES,
        verdict_timeout: None,
    };

    /// Validate a configuration.
    pub fn new(
        bit_depth: BitDepth,
        level: TestLevel,
        num_in: u8,
        num_out: u8,
    ) -> Result<Self, ConfigError> {
        if bit_depth != BitDepth::SIXTEEN && bit_depth != BitDepth::THIRTY_TWO {
            return Err(ConfigError::UnsupportedBitDepth(bit_depth.bits()));
        }
        if let Some(&n) = [num_in, num_out].iter().find(|&&n| n > MAX_DATA_LINES) {
            return Err(ConfigError::TooManyDataLines(n));
        }
        if num_in == 0 && num_out == 0 {
            return Err(ConfigError::NoDataLines);
        }
        Ok(Self {
            bit_depth,
            level,
            num_in,
            num_out,
            verdict_timeout: None,
        })
    }

    /// Give up on the tester after `timeout` instead of spinning forever.
    #[must_use]
    pub fn with_verdict_timeout(mut self, timeout: Duration) -> Self {
        self.verdict_timeout = Some(timeout);
        self
    }

    /// Sample word width.
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Test level.
    pub fn level(&self) -> TestLevel {
        self.level
    }

    /// Input data lines.
    pub fn num_in(&self) -> u8 {
        self.num_in
    }

    /// Output data lines.
    pub fn num_out(&self) -> u8 {
        self.num_out
    }

    /// Input channels the driver delivers per frame.
    pub fn in_channels(&self) -> usize {
        usize::from(self.num_in).saturating_mul(CHANNELS_PER_LINE)
    }

    /// Output channels the driver requests per frame.
    pub fn out_channels(&self) -> usize {
        usize::from(self.num_out).saturating_mul(CHANNELS_PER_LINE)
    }

    /// Optional limit on the verdict wait.
    pub fn verdict_timeout(&self) -> Option<Duration> {
        self.verdict_timeout
    }

    /// MCLK frequencies swept at this bit depth and level.
    pub fn mclk_frequencies(&self) -> &'static [u32] {
        let table: &'static [u32] = if self.bit_depth == BitDepth::SIXTEEN {
            &MCLK_FREQS_16BIT
        } else {
            &MCLK_FREQS_32BIT
        };
        match self.level {
            TestLevel::Smoke => table.get(..1).unwrap_or(table),
            TestLevel::Full => table,
        }
    }

    /// Rounds a complete sweep takes.
    pub fn total_rounds(&self) -> usize {
        usize::from(MAX_RATIO_LOG2)
            .saturating_mul(self.mclk_frequencies().len())
            .saturating_mul(NUM_MODES)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::BUILD
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn build_config_uses_four_lines_each_way() {
        let cfg = HarnessConfig::BUILD;
        assert_eq!(cfg.num_in(), 4);
        assert_eq!(cfg.num_out(), 4);
        assert_eq!(cfg.in_channels(), 8);
        assert_eq!(cfg.out_channels(), 8);
        assert_eq!(cfg.verdict_timeout(), None);
    }

    #[test]
    fn smoke_level_sweeps_one_mclk() {
        let cfg = HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Smoke, 1, 1).unwrap();
        assert_eq!(cfg.mclk_frequencies(), &[24_576_000]);
        assert_eq!(cfg.total_rounds(), 6);
    }

    #[test]
    fn full_level_sweeps_both_families() {
        let cfg = HarnessConfig::new(BitDepth::SIXTEEN, TestLevel::Full, 4, 0).unwrap();
        assert_eq!(cfg.mclk_frequencies(), &[12_288_000, 11_289_600]);
        assert_eq!(cfg.total_rounds(), 12);
        assert!(cfg.total_rounds() <= MAX_ROUNDS);
    }

    #[test]
    fn rejects_unplanned_bit_depth() {
        let depth = BitDepth::try_new(24).unwrap();
        assert_eq!(
            HarnessConfig::new(depth, TestLevel::Full, 1, 1),
            Err(ConfigError::UnsupportedBitDepth(24))
        );
    }

    #[test]
    fn rejects_too_many_lines() {
        assert_eq!(
            HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Full, 5, 1),
            Err(ConfigError::TooManyDataLines(5))
        );
        assert_eq!(
            HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Full, 0, 9),
            Err(ConfigError::TooManyDataLines(9))
        );
    }

    #[test]
    fn rejects_no_lines() {
        assert_eq!(
            HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Smoke, 0, 0),
            Err(ConfigError::NoDataLines)
        );
    }

    #[test]
    fn one_directional_layouts_are_valid() {
        assert!(HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Smoke, 4, 0).is_ok());
        assert!(HarnessConfig::new(BitDepth::THIRTY_TWO, TestLevel::Smoke, 0, 4).is_ok());
    }

    #[test]
    fn every_mclk_reaches_192k_family_at_ratio_two() {
        // MCLK / 2 / (2 × bits) must be a standard rate.
        for (table, bits) in [(MCLK_FREQS_32BIT, 32u32), (MCLK_FREQS_16BIT, 16)] {
            for mclk in table {
                let fs = mclk / 2 / (2 * bits);
                assert!(fs == 192_000 || fs == 176_400, "{mclk} Hz gives {fs} Hz");
            }
        }
    }
}
