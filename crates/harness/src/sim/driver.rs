//! Loopback driver: plays the I2S master against the simulated tester,
//! invoking the callbacks in the order a real driver does.

use platform::{I2sCallbacks, I2sConfig, InitStatus, RestartDecision};

use crate::config::CHANNELS_PER_LINE;

use super::SimTester;

/// Frames a round may run before the driver gives up on a restart.
const DEFAULT_FRAME_LIMIT: u32 = 64;

/// Callback counts over a loopback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStats {
    /// Rounds started (`init` returned `Configured`).
    pub rounds: u32,
    /// Frames clocked.
    pub frames: u32,
    /// `send` calls.
    pub sends: u32,
    /// `receive` calls.
    pub receives: u32,
}

/// Why a loopback run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError<E> {
    /// `init` failed.
    Init(E),
    /// The application never asked for a restart.
    RoundTooLong {
        /// Frames clocked in the stuck round.
        frames: u32,
    },
}

impl<E: core::fmt::Debug> core::fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init callback failed: {e:?}"),
            Self::RoundTooLong { frames } => {
                write!(f, "no restart requested after {frames} frames")
            }
        }
    }
}

impl<E: core::fmt::Debug> std::error::Error for DriverError<E> {}

/// I2S master stand-in that moves frames between the callbacks and a
/// [`SimTester`].
#[derive(Debug, Clone)]
pub struct LoopbackDriver {
    tester: SimTester,
    in_channels: usize,
    out_channels: usize,
    frame_limit: u32,
}

impl LoopbackDriver {
    /// Driver with `num_in` input and `num_out` output data lines.
    pub fn new(tester: SimTester, num_in: u8, num_out: u8) -> Self {
        Self {
            tester,
            in_channels: usize::from(num_in).saturating_mul(CHANNELS_PER_LINE),
            out_channels: usize::from(num_out).saturating_mul(CHANNELS_PER_LINE),
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }

    /// Abort a round after `frames` frames without a restart.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u32) -> Self {
        self.frame_limit = frames;
        self
    }

    /// Run rounds until `app` reports the matrix exhausted.
    ///
    /// Per frame: `send` if there are output channels, `receive` if there
    /// are input channels, then `restart_check`. A restart goes back to
    /// `init`.
    pub fn run<A: I2sCallbacks>(&mut self, app: &mut A) -> Result<DriverStats, DriverError<A::Error>> {
        let mut stats = DriverStats::default();
        let mut tx = vec![0i32; self.out_channels];
        let mut rx = vec![0i32; self.in_channels];

        loop {
            let mut config = I2sConfig::default();
            match app.init(&mut config).map_err(DriverError::Init)? {
                InitStatus::Exhausted => return Ok(stats),
                InitStatus::Configured => {}
            }
            stats.rounds = stats.rounds.saturating_add(1);
            self.tester.begin_stream(&config);

            let mut frames = 0u32;
            loop {
                if !tx.is_empty() {
                    app.send(&mut tx);
                    self.tester.capture(&tx);
                    stats.sends = stats.sends.saturating_add(1);
                }
                if !rx.is_empty() {
                    self.tester.playback(&mut rx);
                    app.receive(&rx);
                    stats.receives = stats.receives.saturating_add(1);
                }
                frames = frames.saturating_add(1);
                stats.frames = stats.frames.saturating_add(1);

                if app.restart_check() == RestartDecision::Restart {
                    break;
                }
                if frames >= self.frame_limit {
                    return Err(DriverError::RoundTooLong { frames });
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    /// Application that runs `rounds` rounds of `frames` frames and records
    /// what it was asked for.
    struct Counter {
        rounds: u32,
        frames: u32,
        frame: u32,
        inits: u32,
        widths: Vec<(usize, usize)>,
    }

    impl I2sCallbacks for Counter {
        type Error = ();

        fn init(&mut self, _config: &mut I2sConfig) -> Result<InitStatus, ()> {
            self.inits += 1;
            self.frame = 0;
            if self.inits > self.rounds {
                Ok(InitStatus::Exhausted)
            } else {
                Ok(InitStatus::Configured)
            }
        }

        fn restart_check(&mut self) -> RestartDecision {
            self.frame += 1;
            if self.frame == self.frames {
                RestartDecision::Restart
            } else {
                RestartDecision::Continue
            }
        }

        fn send(&mut self, samples: &mut [i32]) {
            self.widths.push((samples.len(), 0));
        }

        fn receive(&mut self, samples: &[i32]) {
            self.widths.push((0, samples.len()));
        }
    }

    fn counter(rounds: u32, frames: u32) -> Counter {
        Counter {
            rounds,
            frames,
            frame: 0,
            inits: 0,
            widths: Vec::new(),
        }
    }

    #[test]
    fn runs_until_exhausted() {
        let mut app = counter(3, 4);
        let stats = LoopbackDriver::new(SimTester::new(), 2, 1).run(&mut app).unwrap();
        assert_eq!(
            stats,
            DriverStats {
                rounds: 3,
                frames: 12,
                sends: 12,
                receives: 12
            }
        );
        assert_eq!(app.inits, 4);
        assert_eq!(app.widths[0], (2, 0));
        assert_eq!(app.widths[1], (0, 4));
    }

    #[test]
    fn skips_direction_without_lines() {
        let mut app = counter(1, 4);
        let stats = LoopbackDriver::new(SimTester::new(), 0, 4).run(&mut app).unwrap();
        assert_eq!(stats.sends, 4);
        assert_eq!(stats.receives, 0);
        assert!(app.widths.iter().all(|&(tx, rx)| tx == 8 && rx == 0));
    }

    #[test]
    fn stuck_round_is_reported() {
        let mut app = counter(1, u32::MAX);
        let err = LoopbackDriver::new(SimTester::new(), 1, 1)
            .with_frame_limit(10)
            .run(&mut app)
            .unwrap_err();
        assert_eq!(err, DriverError::RoundTooLong { frames: 10 });
    }

    #[test]
    fn init_error_stops_the_run() {
        struct Failing;
        impl I2sCallbacks for Failing {
            type Error = &'static str;
            fn init(&mut self, _config: &mut I2sConfig) -> Result<InitStatus, Self::Error> {
                Err("tester gone")
            }
            fn restart_check(&mut self) -> RestartDecision {
                RestartDecision::Continue
            }
            fn send(&mut self, _samples: &mut [i32]) {}
            fn receive(&mut self, _samples: &[i32]) {}
        }

        let err = LoopbackDriver::new(SimTester::new(), 1, 1)
            .run(&mut Failing)
            .unwrap_err();
        assert_eq!(err, DriverError::Init("tester gone"));
        assert_eq!(err.to_string(), "init callback failed: \"tester gone\"");
    }
}
