//! Tester handshake protocol.
//!
//! Three lines connect the harness to the tester:
//!
//! - **strobe** (1 bit, harness → tester): a high-then-low pulse marks a word
//!   on the data lines as valid, or acknowledges a verdict.
//! - **data** (16 bits, harness → tester): configuration words.
//! - **response** (1 bit, tester → harness): nonzero once the tester has a
//!   verdict for the round.
//!
//! Each round starts with a broadcast of seven words:
//!
//! | # | Word                              |
//! |---|-----------------------------------|
//! | 0 | MCLK frequency, bits 31..16       |
//! | 1 | MCLK frequency, bits 15..0        |
//! | 2 | MCLK/BCLK ratio                   |
//! | 3 | input data lines                  |
//! | 4 | output data lines                 |
//! | 5 | bit depth                         |
//! | 6 | 1 for I2S justification, else 0   |
//!
//! Every word is `data ← w; sync(data); strobe ← 1; strobe ← 0; sync(strobe)`.
//! The data sync before the strobe edge keeps the tester from latching a
//! stale word. Protocol is level-triggered; there are no checksums.
//!
//! After the round the harness spins on the response line, pulses the strobe
//! once a nonzero value arrives, then drains the line. A tester that never
//! answers blocks [`TesterLink::await_verdict`] forever unless a deadline is
//! configured.

use embassy_time::{Duration, Instant};
use platform::Port;

use crate::config::VERDICT_DRAIN_READS;

/// Number of words in one configuration broadcast.
pub const CONFIG_WORDS: usize = 7;

/// Width of the data lines.
const DATA_WORD_MASK: u32 = 0xFFFF;

/// Round parameters as the tester sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TesterConfig {
    /// Master-clock frequency in Hz.
    pub mclk_hz: u32,
    /// MCLK/BCLK ratio (2, 4, 8).
    pub ratio: u32,
    /// Input data lines.
    pub num_in: u8,
    /// Output data lines.
    pub num_out: u8,
    /// Sample word width in bits.
    pub bit_depth: u8,
    /// `true` for I2S justification, `false` for left-justified.
    pub i2s_justified: bool,
}

impl TesterConfig {
    /// The seven data-line words, in transfer order.
    pub fn words(&self) -> [u32; CONFIG_WORDS] {
        [
            self.mclk_hz >> 16,
            self.mclk_hz & DATA_WORD_MASK,
            self.ratio & DATA_WORD_MASK,
            u32::from(self.num_in),
            u32::from(self.num_out),
            u32::from(self.bit_depth),
            u32::from(self.i2s_justified),
        ]
    }

    /// Rebuild a configuration from the seven words. Inverse of [`words`](Self::words).
    pub fn from_words(words: &[u32; CONFIG_WORDS]) -> Self {
        let [hi, lo, ratio, num_in, num_out, bits, justified] = *words;
        Self {
            mclk_hz: ((hi & DATA_WORD_MASK) << 16) | (lo & DATA_WORD_MASK),
            ratio,
            num_in: u8::try_from(num_in).unwrap_or(u8::MAX),
            num_out: u8::try_from(num_out).unwrap_or(u8::MAX),
            bit_depth: u8::try_from(bits).unwrap_or(u8::MAX),
            i2s_justified: justified != 0,
        }
    }
}

/// What the tester answered for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Verdict {
    /// First nonzero reading. Never 0.
    pub code: u32,
    /// Last reading while draining; 0 once the tester released the line.
    pub residual: u32,
}

impl Verdict {
    /// The tester released the response line after the acknowledge.
    pub fn passed(&self) -> bool {
        self.residual == 0
    }

    /// The tester held the response line through the whole drain.
    pub fn failed(&self) -> bool {
        !self.passed()
    }
}

/// Handshake failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// A signal-line operation failed.
    Port(E),
    /// The verdict deadline passed with the response line still low.
    VerdictTimeout,
}

impl<E> From<E> for LinkError<E> {
    fn from(e: E) -> Self {
        Self::Port(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Port(e) => write!(f, "tester port error: {e:?}"),
            Self::VerdictTimeout => write!(f, "tester did not answer before the deadline"),
        }
    }
}

/// The three lines to the tester, owned exclusively by the harness.
pub struct TesterLink<S, D, R> {
    strobe: S,
    data: D,
    response: R,
    verdict_timeout: Option<Duration>,
}

impl<S, D, R> TesterLink<S, D, R>
where
    S: Port,
    D: Port<Error = S::Error>,
    R: Port<Error = S::Error>,
{
    /// Bind the strobe, data and response ports.
    pub fn new(strobe: S, data: D, response: R) -> Self {
        Self {
            strobe,
            data,
            response,
            verdict_timeout: None,
        }
    }

    /// Bound [`await_verdict`](Self::await_verdict); `None` waits forever.
    #[must_use]
    pub fn with_verdict_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.verdict_timeout = timeout;
        self
    }

    /// Send the seven configuration words for the next round.
    pub fn broadcast_config(&mut self, config: &TesterConfig) -> Result<(), LinkError<S::Error>> {
        self.strobe.write(0)?;
        for word in config.words() {
            self.send_word(word)?;
        }
        Ok(())
    }

    fn send_word(&mut self, word: u32) -> Result<(), LinkError<S::Error>> {
        self.data.write(word)?;
        self.data.sync()?;
        self.strobe.pulse()?;
        self.strobe.sync()?;
        Ok(())
    }

    /// Wait for the tester's verdict on the round just streamed.
    ///
    /// Spins until the response line reads nonzero, acknowledges with a
    /// strobe pulse, then reads up to [`VERDICT_DRAIN_READS`] more times,
    /// stopping at the first zero.
    pub fn await_verdict(&mut self) -> Result<Verdict, LinkError<S::Error>> {
        let deadline = self
            .verdict_timeout
            .map(|t| Instant::now().checked_add(t).unwrap_or(Instant::MAX));
        let code = self
            .response
            .read_until(|v| v != 0, deadline)?
            .ok_or(LinkError::VerdictTimeout)?;

        self.strobe.pulse()?;

        let mut residual = code;
        for _ in 0..VERDICT_DRAIN_READS {
            if residual == 0 {
                break;
            }
            residual = self.response.read()?;
        }
        Ok(Verdict { code, residual })
    }

    /// Release the three ports.
    pub fn into_parts(self) -> (S, D, R) {
        (self.strobe, self.data, self.response)
    }
}
