//! Clock block abstraction.
//!
//! A clock block is a programmable divider that derives a port clock from a
//! source signal. The I2S master with external clock needs one: its bit clock
//! is the master clock, taken from a pin, divided down.
//!
//! The block divides by `2 × divide`; a divide of 0 passes the source through
//! undivided. The application must configure it before the driver starts
//! clocking a round, because the driver only toggles the derived clock.

/// Where a clock block takes its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// The tile's internal reference clock.
    Reference,
    /// The external master-clock input pin.
    MasterClockPin,
}

/// Divider-based clock generator.
pub trait ClockBlock {
    /// Error type
    type Error: core::fmt::Debug;

    /// Power the block up. Idempotent.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Select the input signal.
    fn set_source(&mut self, source: ClockSource) -> Result<(), Self::Error>;

    /// Set the divider: output = source / (2 × `divide`).
    fn set_divide(&mut self, divide: u8) -> Result<(), Self::Error>;
}
