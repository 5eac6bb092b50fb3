//! Per-round records and the run outcome.

use heapless::Vec;

use crate::config::MAX_ROUNDS;
use crate::handshake::{TesterConfig, Verdict};
use crate::matrix::MatrixPoint;
use crate::samples::SampleMismatch;

/// One completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundRecord {
    /// Matrix cell the round ran.
    pub point: MatrixPoint,
    /// Configuration broadcast to the tester.
    pub config: TesterConfig,
    /// Tester's answer.
    pub verdict: Verdict,
    /// Received samples that did not match.
    pub mismatches: u32,
    /// First mismatch, if any.
    pub first_mismatch: Option<SampleMismatch>,
    /// Sample mismatch or failed verdict.
    pub error: bool,
}

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    /// The final round was clean.
    Passed,
    /// The final round saw a mismatch or a failed verdict.
    Failed,
}

impl RunOutcome {
    /// Process exit status: 0 or 1.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
        }
    }
}

/// Everything recorded over a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    rounds: Vec<RoundRecord, MAX_ROUNDS>,
    last_error: bool,
    num_restarts: u32,
    outcome: Option<RunOutcome>,
}

impl RunReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed round.
    pub fn record(&mut self, round: RoundRecord) {
        self.last_error = round.error;
        if self.rounds.push(round).is_err() {
            warn!("round log full, dropping record");
        }
    }

    /// Close the report once the matrix is exhausted. The outcome is the
    /// final round's error flag; earlier failures are visible in
    /// [`rounds`](Self::rounds) but do not change the exit status.
    pub fn finish(&mut self, num_restarts: u32) -> RunOutcome {
        let outcome = if self.last_error {
            RunOutcome::Failed
        } else {
            RunOutcome::Passed
        };
        self.num_restarts = num_restarts;
        self.outcome = Some(outcome);
        outcome
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Rounds that failed.
    pub fn failed_rounds(&self) -> impl Iterator<Item = &RoundRecord> {
        self.rounds.iter().filter(|r| r.error)
    }

    /// Restarts the driver performed, once finished.
    pub fn num_restarts(&self) -> u32 {
        self.num_restarts
    }

    /// `None` until the matrix is exhausted.
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Whether the run reached the end of the matrix.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Exit status: 0 for a clean final round, 1 otherwise, including an
    /// unfinished run.
    pub fn exit_code(&self) -> i32 {
        self.outcome.unwrap_or(RunOutcome::Failed).exit_code()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn record(error: bool) -> RoundRecord {
        RoundRecord {
            point: MatrixPoint::FIRST,
            config: TesterConfig {
                mclk_hz: 24_576_000,
                ratio: 2,
                num_in: 1,
                num_out: 1,
                bit_depth: 32,
                i2s_justified: true,
            },
            verdict: Verdict {
                code: 1,
                residual: u32::from(error),
            },
            mismatches: 0,
            first_mismatch: None,
            error,
        }
    }

    #[test]
    fn unfinished_run_exits_nonzero() {
        let report = RunReport::new();
        assert!(!report.is_finished());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn final_round_decides_exit_code() {
        let mut report = RunReport::new();
        report.record(record(true));
        report.record(record(false));
        assert_eq!(report.finish(8), RunOutcome::Passed);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.failed_rounds().count(), 1);
        assert_eq!(report.num_restarts(), 8);

        let mut report = RunReport::new();
        report.record(record(false));
        report.record(record(true));
        assert_eq!(report.finish(2), RunOutcome::Failed);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn keeps_rounds_in_order() {
        let mut report = RunReport::new();
        for i in 0..3 {
            report.record(record(i == 1));
        }
        let errors: std::vec::Vec<_> = report.rounds().iter().map(|r| r.error).collect();
        assert_eq!(errors, [false, true, false]);
    }
}
