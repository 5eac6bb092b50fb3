//! Errors the harness propagates out of `init`.

use crate::handshake::LinkError;

/// Failure while preparing a round.
///
/// `P` is the port error, `C` the clock-block error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HarnessError<P, C> {
    /// Handshake with the tester failed.
    Link(LinkError<P>),
    /// The bit-clock block rejected its configuration.
    Clock(C),
}

impl<P, C> From<LinkError<P>> for HarnessError<P, C> {
    fn from(e: LinkError<P>) -> Self {
        Self::Link(e)
    }
}

impl<P: core::fmt::Debug, C: core::fmt::Debug> core::fmt::Display for HarnessError<P, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Link(e) => write!(f, "{e}"),
            Self::Clock(e) => write!(f, "bit-clock configuration failed: {e:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<P: core::fmt::Debug, C: core::fmt::Debug> std::error::Error for HarnessError<P, C> {}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for LinkError<E> {}
