//! Signal-line port abstraction
//!
//! A [`Port`] is an opaque handle on one or more physical lines driven or
//! sampled as a single unsigned value. Writes are posted: the value reaches
//! the pins some time after `write` returns, and [`Port::sync`] blocks until
//! it has. Protocols that hand a value to a peer and then raise a strobe must
//! sync in between, or the peer can latch stale data.
//!
//! Single GPIOs from any `embedded-hal` 1.0 implementation become one-bit
//! ports through [`OutputPinPort`] and [`InputPinPort`].

use embassy_time::Instant;
use embedded_hal::digital::{InputPin, OutputPin};

/// Signal-line handle.
pub trait Port {
    /// Error type
    type Error: core::fmt::Debug;

    /// Drive `value` onto the lines.
    fn write(&mut self, value: u32) -> Result<(), Self::Error>;

    /// Sample the lines.
    fn read(&mut self) -> Result<u32, Self::Error>;

    /// Commit outstanding writes and wait until they are visible on the pins.
    fn sync(&mut self) -> Result<(), Self::Error>;

    /// Drive the line high then low.
    fn pulse(&mut self) -> Result<(), Self::Error> {
        self.write(1)?;
        self.write(0)
    }

    /// Spin on [`read`](Self::read) until `predicate` accepts a value.
    ///
    /// Returns `Ok(None)` only if `deadline` passes first; with no deadline
    /// this blocks for as long as the peer takes.
    fn read_until<F>(
        &mut self,
        mut predicate: F,
        deadline: Option<Instant>,
    ) -> Result<Option<u32>, Self::Error>
    where
        F: FnMut(u32) -> bool,
    {
        loop {
            let value = self.read()?;
            if predicate(value) {
                return Ok(Some(value));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
        }
    }
}

/// Error from a pin-backed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinPortError<E> {
    /// The underlying pin reported an error.
    Pin(E),
    /// Operation not supported in this pin's direction.
    WrongDirection,
}

impl<E: core::fmt::Debug> core::fmt::Display for PinPortError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "pin error: {e:?}"),
            Self::WrongDirection => write!(f, "operation not supported in this pin direction"),
        }
    }
}

/// One-bit output port over an `embedded-hal` output pin.
///
/// Bit 0 of each written value selects the level. Reads return the last
/// level driven. GPIO writes complete before `set_high`/`set_low` return, so
/// `sync` has nothing to wait for.
pub struct OutputPinPort<P> {
    pin: P,
    level: u32,
}

impl<P: OutputPin> OutputPinPort<P> {
    /// Wrap `pin`; the recorded level starts low.
    pub fn new(pin: P) -> Self {
        Self { pin, level: 0 }
    }

    /// Release the underlying pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Port for OutputPinPort<P> {
    type Error = PinPortError<P::Error>;

    fn write(&mut self, value: u32) -> Result<(), Self::Error> {
        let level = value & 1;
        if level == 1 {
            self.pin.set_high().map_err(PinPortError::Pin)?;
        } else {
            self.pin.set_low().map_err(PinPortError::Pin)?;
        }
        self.level = level;
        Ok(())
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        Ok(self.level)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// One-bit input port over an `embedded-hal` input pin.
pub struct InputPinPort<P> {
    pin: P,
}

impl<P: InputPin> InputPinPort<P> {
    /// Wrap `pin`.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the underlying pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> Port for InputPinPort<P> {
    type Error = PinPortError<P::Error>;

    fn write(&mut self, _value: u32) -> Result<(), Self::Error> {
        Err(PinPortError::WrongDirection)
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        self.pin
            .is_high()
            .map(u32::from)
            .map_err(PinPortError::Pin)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
