//! Known sample sequences and per-channel cursors.
//!
//! Channel `c` carries `c × 100 + 1 ..= c × 100 + 8` in both directions, so a
//! swapped channel, a dropped frame and a shifted bit all show up as a
//! distinct wrong value. Each channel has its own cursor, advanced by one per
//! sample produced or consumed and reset at the start of every round.
//!
//! A round is [`FRAMES_PER_ROUND`](crate::config::FRAMES_PER_ROUND) frames,
//! shorter than the tables. Should a driver run longer without restarting,
//! cursors wrap to the start of the table rather than index past it.

use platform::BitDepth;

use crate::config::{MAX_CHANNELS, SAMPLES_PER_CHANNEL};

/// Per-channel sample sequence table.
pub type SampleTable = [[i32; SAMPLES_PER_CHANNEL]; MAX_CHANNELS];

/// Samples the harness transmits, per channel.
pub const TX_DATA: SampleTable = [
    [1, 2, 3, 4, 5, 6, 7, 8],
    [101, 102, 103, 104, 105, 106, 107, 108],
    [201, 202, 203, 204, 205, 206, 207, 208],
    [301, 302, 303, 304, 305, 306, 307, 308],
    [401, 402, 403, 404, 405, 406, 407, 408],
    [501, 502, 503, 504, 505, 506, 507, 508],
    [601, 602, 603, 604, 605, 606, 607, 608],
    [701, 702, 703, 704, 705, 706, 707, 708],
];

/// Samples the harness expects to receive, per channel.
pub const RX_DATA: SampleTable = TX_DATA;

/// Sample `index` of `channel`, wrapping past the end of the sequence.
///
/// Returns `None` for channels outside the table.
pub fn table_sample(table: &SampleTable, channel: usize, index: usize) -> Option<i32> {
    table
        .get(channel)
        .and_then(|row| row.get(index % SAMPLES_PER_CHANNEL))
        .copied()
}

/// A received sample that did not match the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleMismatch {
    /// Channel the sample arrived on.
    pub channel: usize,
    /// Cursor position within the round.
    pub index: usize,
    /// Table value.
    pub expected: i32,
    /// Value the driver delivered.
    pub received: i32,
}

/// Independent transmit and receive cursors for every channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleCursors {
    tx: [usize; MAX_CHANNELS],
    rx: [usize; MAX_CHANNELS],
}

impl SampleCursors {
    /// All cursors at the start of the table.
    pub const fn new() -> Self {
        Self {
            tx: [0; MAX_CHANNELS],
            rx: [0; MAX_CHANNELS],
        }
    }

    /// Rewind every cursor.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Transmit cursor of `channel` (0 for channels outside the table).
    pub fn tx(&self, channel: usize) -> usize {
        self.tx.get(channel).copied().unwrap_or(0)
    }

    /// Receive cursor of `channel` (0 for channels outside the table).
    pub fn rx(&self, channel: usize) -> usize {
        self.rx.get(channel).copied().unwrap_or(0)
    }

    /// Fill one output frame from [`TX_DATA`], one sample per channel.
    ///
    /// Slots beyond [`MAX_CHANNELS`] have no table and are zero-filled.
    pub fn produce_transmit_frame(&mut self, out: &mut [i32]) {
        for (channel, slot) in out.iter_mut().enumerate() {
            *slot = match self.tx.get_mut(channel) {
                Some(cursor) => {
                    let sample = table_sample(&TX_DATA, channel, *cursor).unwrap_or(0);
                    *cursor = cursor.wrapping_add(1) % SAMPLES_PER_CHANNEL;
                    sample
                }
                None => 0,
            };
        }
    }

    /// Check one input frame against [`RX_DATA`] as seen through a bus of
    /// `depth` bits. Every cursor advances whether or not the sample matched.
    ///
    /// Calls `on_mismatch` once per mismatching channel and returns the
    /// number of mismatches. Channels beyond [`MAX_CHANNELS`] are ignored.
    pub fn consume_receive_frame<F>(&mut self, depth: BitDepth, input: &[i32], mut on_mismatch: F) -> u32
    where
        F: FnMut(SampleMismatch),
    {
        let mut mismatches = 0u32;
        for ((channel, &received), cursor) in input.iter().enumerate().zip(self.rx.iter_mut()) {
            let index = *cursor;
            let expected = table_sample(&RX_DATA, channel, index).unwrap_or(0);
            if !depth.same_on_wire(received, expected) {
                mismatches = mismatches.saturating_add(1);
                on_mismatch(SampleMismatch {
                    channel,
                    index,
                    expected,
                    received,
                });
            }
            *cursor = index.wrapping_add(1) % SAMPLES_PER_CHANNEL;
        }
        mismatches
    }
}
