//! Bit-clock configuration.
//!
//! The driver under test runs with an external clock: the harness owns the
//! clock block, feeds it from the MCLK pin and divides by the round's
//! MCLK/BCLK ratio. This has to happen before the driver starts clocking the
//! round, so it runs at the end of `init`.

use platform::{ClockBlock, ClockSource, MclkBclkRatio};

/// Enable `clk`, source it from the MCLK pin and divide by `ratio`.
pub fn configure_bit_clock<C: ClockBlock>(clk: &mut C, ratio: MclkBclkRatio) -> Result<(), C::Error> {
    clk.enable()?;
    clk.set_source(ClockSource::MasterClockPin)?;
    clk.set_divide(ratio.divider())
}

/// Bit-clock frequency for `mclk_hz` divided by `ratio`.
pub fn bclk_hz(mclk_hz: u32, ratio: MclkBclkRatio) -> u32 {
    mclk_hz.checked_div(ratio.get()).unwrap_or(0)
}

/// Frame rate for a stereo frame of two `bits`-bit slots.
pub fn sample_rate_hz(mclk_hz: u32, ratio: MclkBclkRatio, bits: u8) -> u32 {
    bclk_hz(mclk_hz, ratio)
        .checked_div(u32::from(bits).saturating_mul(2))
        .unwrap_or(0)
}
