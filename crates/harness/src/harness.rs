//! The conformance harness: the callback set the driver under test invokes.
//!
//! # Round lifecycle
//!
//! ```text
//! init ──► [await verdict of previous round] ──► advance matrix
//!            │                                      │
//!            │                          Exhausted ──┴──► finish report
//!            ▼
//!      reset round ──► fill I2sConfig ──► broadcast to tester ──► bit clock
//!
//! send / receive / restart_check × FRAMES_PER_ROUND ──► Restart ──► init
//! ```
//!
//! The verdict for round N is always collected before the broadcast for
//! round N+1, so the tester never sees two configurations back to back.

use platform::{ClockBlock, I2sCallbacks, I2sConfig, InitStatus, Port, RestartDecision};

use crate::clock::configure_bit_clock;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::handshake::{TesterConfig, TesterLink};
use crate::matrix::{MatrixPoint, Step};
use crate::report::{RoundRecord, RunReport};
use crate::state::HarnessState;

/// Conformance harness over strobe, data and response ports `S`, `D`, `R`
/// and bit-clock block `C`.
pub struct Harness<S, D, R, C> {
    config: HarnessConfig,
    link: TesterLink<S, D, R>,
    clock: C,
    state: HarnessState,
    report: RunReport,
    current: Option<(MatrixPoint, TesterConfig)>,
}

impl<S, D, R, C> Harness<S, D, R, C>
where
    S: Port,
    D: Port<Error = S::Error>,
    R: Port<Error = S::Error>,
    C: ClockBlock,
{
    /// Build a harness. Nothing touches the ports until the first `init`.
    pub fn new(config: HarnessConfig, strobe: S, data: D, response: R, clock: C) -> Self {
        let link = TesterLink::new(strobe, data, response).with_verdict_timeout(config.verdict_timeout());
        Self {
            config,
            link,
            clock,
            state: HarnessState::new(config.bit_depth(), config.mclk_frequencies().len()),
            report: RunReport::new(),
            current: None,
        }
    }

    /// Configuration the harness runs with.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Live state.
    pub fn state(&self) -> &HarnessState {
        &self.state
    }

    /// Rounds recorded so far.
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Consume the harness, keeping the report.
    pub fn into_report(self) -> RunReport {
        self.report
    }

    /// Release the ports and the clock block.
    pub fn into_parts(self) -> (S, D, R, C) {
        let (strobe, data, response) = self.link.into_parts();
        (strobe, data, response, self.clock)
    }

    fn tester_config(&self, point: MatrixPoint) -> TesterConfig {
        TesterConfig {
            mclk_hz: self
                .config
                .mclk_frequencies()
                .get(point.mclk_index)
                .copied()
                .unwrap_or_default(),
            ratio: point.ratio().get(),
            num_in: self.config.num_in(),
            num_out: self.config.num_out(),
            bit_depth: self.config.bit_depth().bits(),
            i2s_justified: point.mode.is_i2s_justified(),
        }
    }

    /// Collect the verdict on the round just streamed and record it.
    fn close_round(&mut self) -> Result<(), HarnessError<S::Error, C::Error>> {
        let verdict = self.link.await_verdict()?;
        debug!("tester verdict: code {} residual {}", verdict.code, verdict.residual);

        let error = self.state.fold_verdict(verdict.failed());
        if error {
            error!("Error: test fail");
        }

        if let Some((point, config)) = self.current.take() {
            let round = self.state.round();
            self.report.record(RoundRecord {
                point,
                config,
                verdict,
                mismatches: round.mismatches,
                first_mismatch: round.first_mismatch,
                error,
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> InitStatus {
        let outcome = self.report.finish(self.state.num_restarts());
        info!(
            "matrix exhausted: {} rounds, {} failed, {} restarts, exit {}",
            self.report.rounds().len(),
            self.report.failed_rounds().count(),
            self.state.num_restarts(),
            outcome.exit_code()
        );
        InitStatus::Exhausted
    }

    /// Reset per-round state, configure the driver and tester, start the bit clock.
    fn open_round(
        &mut self,
        point: MatrixPoint,
        i2s: &mut I2sConfig,
    ) -> Result<(), HarnessError<S::Error, C::Error>> {
        self.state.reset_round();
        let ratio = point.ratio();
        i2s.mode = point.mode;
        i2s.mclk_bclk_ratio = ratio.get();

        let tester = self.tester_config(point);
        info!(
            "round: mclk {} Hz ratio {} mode {:?} in {} out {} bits {}",
            tester.mclk_hz,
            tester.ratio,
            point.mode,
            tester.num_in,
            tester.num_out,
            tester.bit_depth
        );
        self.link.broadcast_config(&tester)?;
        configure_bit_clock(&mut self.clock, ratio).map_err(HarnessError::Clock)?;
        self.current = Some((point, tester));
        Ok(())
    }
}

impl<S, D, R, C> I2sCallbacks for Harness<S, D, R, C>
where
    S: Port,
    D: Port<Error = S::Error>,
    R: Port<Error = S::Error>,
    C: ClockBlock,
{
    type Error = HarnessError<S::Error, C::Error>;

    fn init(&mut self, i2s: &mut I2sConfig) -> Result<InitStatus, Self::Error> {
        if self.state.matrix().is_exhausted() {
            return Ok(InitStatus::Exhausted);
        }
        // Only a round the tester was configured for has a verdict pending.
        if self.current.is_some() {
            self.close_round()?;
        }

        let checkpoint = self.state.matrix().clone();
        let point = match self.state.matrix_mut().advance() {
            Step::Next(point) => point,
            Step::Exhausted => return Ok(self.finish()),
        };

        match self.open_round(point, i2s) {
            Ok(()) => Ok(InitStatus::Configured),
            Err(e) => {
                // Retry the same cell on the next init.
                *self.state.matrix_mut() = checkpoint;
                Err(e)
            }
        }
    }

    fn restart_check(&mut self) -> RestartDecision {
        self.state.restart_check()
    }

    fn send(&mut self, samples: &mut [i32]) {
        self.state.produce_transmit_frame(samples);
    }

    fn receive(&mut self, samples: &[i32]) {
        self.state.consume_receive_frame(samples);
    }
}
