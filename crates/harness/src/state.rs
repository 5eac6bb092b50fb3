//! Harness state.
//!
//! Everything the callbacks mutate lives here and is reached through
//! `&mut self`: the driver invokes one callback at a time, so nothing is
//! shared and nothing is locked.

use platform::{BitDepth, RestartDecision};

use crate::config::FRAMES_PER_ROUND;
use crate::matrix::MatrixSequencer;
use crate::samples::{SampleCursors, SampleMismatch};

/// Per-round bookkeeping, cleared at every `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundState {
    /// `restart_check` calls since the round started.
    pub frames_sent: u32,
    /// Sample mismatch or failed verdict seen this round.
    pub error: bool,
    /// Received samples that did not match.
    pub mismatches: u32,
    /// First of those.
    pub first_mismatch: Option<SampleMismatch>,
}

/// All mutable harness state.
#[derive(Debug, Clone)]
pub struct HarnessState {
    round: RoundState,
    num_restarts: u32,
    cursors: SampleCursors,
    matrix: MatrixSequencer,
    bit_depth: BitDepth,
}

impl HarnessState {
    /// Fresh state for a sweep over `num_mclks` master clocks.
    pub fn new(bit_depth: BitDepth, num_mclks: usize) -> Self {
        Self {
            round: RoundState::default(),
            num_restarts: 0,
            cursors: SampleCursors::new(),
            matrix: MatrixSequencer::new(num_mclks),
            bit_depth,
        }
    }

    /// Current round.
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Restarts requested over the whole run. Never reset.
    pub fn num_restarts(&self) -> u32 {
        self.num_restarts
    }

    /// Sample cursors.
    pub fn cursors(&self) -> &SampleCursors {
        &self.cursors
    }

    /// Matrix position.
    pub fn matrix(&self) -> &MatrixSequencer {
        &self.matrix
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut MatrixSequencer {
        &mut self.matrix
    }

    /// Bus width samples are compared at.
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Clear the round and rewind every cursor. The restart count survives.
    pub fn reset_round(&mut self) {
        self.round = RoundState::default();
        self.cursors.reset();
    }

    /// Count a frame; ask for a restart on the last frame of the round.
    pub fn restart_check(&mut self) -> RestartDecision {
        self.round.frames_sent = self.round.frames_sent.saturating_add(1);
        if self.round.frames_sent == FRAMES_PER_ROUND {
            self.num_restarts = self.num_restarts.saturating_add(1);
            RestartDecision::Restart
        } else {
            RestartDecision::Continue
        }
    }

    /// Fill one output frame.
    pub fn produce_transmit_frame(&mut self, out: &mut [i32]) {
        self.cursors.produce_transmit_frame(out);
    }

    /// Check one input frame and record any mismatch against the round.
    pub fn consume_receive_frame(&mut self, input: &[i32]) {
        let round = &mut self.round;
        let found = self
            .cursors
            .consume_receive_frame(self.bit_depth, input, |m| {
                if round.first_mismatch.is_none() {
                    warn!(
                        "sample mismatch: channel {} index {} expected {} received {}",
                        m.channel,
                        m.index,
                        m.expected,
                        m.received
                    );
                    round.first_mismatch = Some(m);
                }
            });
        if found > 0 {
            self.round.mismatches = self.round.mismatches.saturating_add(found);
            self.round.error = true;
        }
    }

    /// Fold the tester's verdict into the round; returns the round's error flag.
    pub fn fold_verdict(&mut self, failed: bool) -> bool {
        self.round.error |= failed;
        self.round.error
    }
}
