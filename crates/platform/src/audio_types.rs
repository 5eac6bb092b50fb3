//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `BitDepth`: validates 8–32 bit sample words, owns the wire-width comparison
//! - `MclkBclkRatio`: power-of-two MCLK/BCLK ratio, never 1

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "value {} outside {}..={}",
            self.value, self.min, self.max
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRangeError {}

// ── BitDepth ─────────────────────────────────────────────────────────────────

/// Number of significant bits carried per sample slot on the I2S bus.
///
/// Samples travel through the callbacks as `i32`. A narrower bus only carries
/// the low `bits` bits of each word, so the harness compares samples after
/// shifting the remaining high bits out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct BitDepth(u8);

impl BitDepth {
    /// Narrowest word the I2S driver can be built for.
    pub const MIN_BITS: u8 = 8;

    /// Full 32-bit slot.
    pub const MAX_BITS: u8 = 32;

    /// 16-bit samples.
    pub const SIXTEEN: Self = Self(16);

    /// 32-bit samples.
    pub const THIRTY_TWO: Self = Self(32);

    /// Create a `BitDepth`, returning an error outside 8–32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `bits` is not in `8..=32`.
    pub fn try_new(bits: u8) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_BITS..=Self::MAX_BITS).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(OutOfRangeError {
                value: u32::from(bits),
                min: u32::from(Self::MIN_BITS),
                max: u32::from(Self::MAX_BITS),
            })
        }
    }

    /// Return the number of bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Left shift that discards everything the bus cannot carry.
    #[must_use]
    pub const fn discard_shift(self) -> u32 {
        // Invariant: 8 <= self.0 <= 32, so the result is 0..=24.
        Self::MAX_BITS.saturating_sub(self.0) as u32
    }

    /// Keep only the low `bits` bits of `sample`, left-aligned in the word.
    #[must_use]
    pub const fn on_wire(self, sample: i32) -> i32 {
        sample.wrapping_shl(self.discard_shift())
    }

    /// Returns `true` if two samples are indistinguishable on a bus of this depth.
    ///
    /// A difference confined to bits at or above `bits` is ignored (the value
    /// cannot be represented, e.g. 401 in an 8-bit word); any difference in
    /// the low `bits` bits is reported.
    #[must_use]
    pub const fn same_on_wire(self, a: i32, b: i32) -> bool {
        self.on_wire(a) == self.on_wire(b)
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        Self::THIRTY_TWO
    }
}

// ── MclkBclkRatio ────────────────────────────────────────────────────────────

/// Master-clock to bit-clock frequency ratio.
///
/// Always a power of two and at least 2: the clock block divides by
/// `2 × divider`, and a ratio of 1 cannot be produced from an external MCLK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct MclkBclkRatio(u32);

impl MclkBclkRatio {
    /// Largest supported exponent. The clock block divider is 8 bits wide,
    /// so `ratio / 2` must fit in a `u8`.
    pub const MAX_LOG2: u8 = 8;

    /// Narrowest ratio: MCLK / 2.
    pub const MIN: Self = Self(2);

    /// Build the ratio `2^log2`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `log2` is 0 or above [`Self::MAX_LOG2`].
    pub fn from_log2(log2: u8) -> Result<Self, OutOfRangeError> {
        if (1..=Self::MAX_LOG2).contains(&log2) {
            Ok(Self(1u32.wrapping_shl(log2 as u32)))
        } else {
            Err(OutOfRangeError {
                value: u32::from(log2),
                min: 1,
                max: u32::from(Self::MAX_LOG2),
            })
        }
    }

    /// Return the ratio value (2, 4, 8, ...).
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the exponent (`ratio == 1 << log2`).
    #[must_use]
    pub const fn log2(self) -> u8 {
        // Invariant: ratio <= 2^8, so trailing_zeros() <= 8.
        self.0.trailing_zeros() as u8
    }

    /// Clock-block divider value producing this ratio: `ratio / 2`.
    #[must_use]
    pub const fn divider(self) -> u8 {
        // Invariant: ratio <= 256, so ratio >> 1 <= 128.
        (self.0 >> 1) as u8
    }
}
