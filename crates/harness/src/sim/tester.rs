//! Simulated tester: the peer at the far end of the strobe, data and
//! response lines.
//!
//! It decodes each broadcast, captures what the driver transmits, plays the
//! receive tables back, and raises a verdict once the round is checked.
//! Faults can be injected per round to exercise the harness's failure paths.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use platform::{BitDepth, ClockBlock, ClockSource, I2sConfig, I2sMode, Port};

use crate::config::{CHANNELS_PER_LINE, FRAMES_PER_ROUND};
use crate::handshake::{TesterConfig, CONFIG_WORDS};
use crate::samples::{table_sample, RX_DATA, TX_DATA};

/// Misbehaviour injected into one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip bit 0 of channel 0 on every sample the driver receives.
    CorruptReceive {
        /// Zero-based round index.
        round: usize,
    },
    /// Flip bit 0 of channel 0 on every sample the tester captures.
    CorruptTransmit {
        /// Zero-based round index.
        round: usize,
    },
    /// Set the first bit above the sample width on every received sample.
    /// Invisible on the bus, so the harness must not flag it.
    NoiseAboveDepth {
        /// Zero-based round index.
        round: usize,
    },
    /// Report failure whatever the round looked like.
    FailVerdict {
        /// Zero-based round index.
        round: usize,
    },
}

impl Fault {
    fn round(self) -> usize {
        match self {
            Self::CorruptReceive { round }
            | Self::CorruptTransmit { round }
            | Self::NoiseAboveDepth { round }
            | Self::FailVerdict { round } => round,
        }
    }
}

/// Handshake rule the harness broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A configuration word arrived while `round` still awaited its verdict.
    BroadcastBeforeVerdict {
        /// Round still awaiting its verdict.
        round: usize,
    },
    /// The driver streamed with no configuration broadcast.
    StreamWithoutConfig,
}

/// What the tester observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesterEvent {
    /// Seven words decoded into a round configuration.
    ConfigReceived {
        /// Zero-based round index.
        round: usize,
        /// Decoded broadcast.
        config: TesterConfig,
    },
    /// The driver started clocking the round.
    StreamStarted {
        /// Zero-based round index.
        round: usize,
    },
    /// Response line raised with a verdict.
    VerdictOffered {
        /// Zero-based round index.
        round: usize,
        /// Whether the round failed.
        failed: bool,
    },
    /// Strobe pulse seen while the verdict was up.
    Acknowledged {
        /// Zero-based round index.
        round: usize,
    },
}

/// Everything the tester learnt about one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimRound {
    /// Decoded broadcast.
    pub config: TesterConfig,
    /// Mode the driver was configured with.
    pub mode: Option<I2sMode>,
    /// Ratio the driver was configured with.
    pub driver_ratio: Option<u32>,
    /// Clock block state when the driver started.
    pub clock_enabled: bool,
    /// Clock source when the driver started.
    pub clock_source: Option<ClockSource>,
    /// Clock divider when the driver started.
    pub clock_divide: Option<u8>,
    /// Frames the tester captured from the driver.
    pub tx_frames: u32,
    /// Frames the tester played into the driver.
    pub rx_frames: u32,
    /// Captured samples that did not match the transmit table.
    pub tx_errors: u32,
    /// Verdict, once offered.
    pub failed: Option<bool>,
}

impl SimRound {
    fn new(config: TesterConfig) -> Self {
        Self {
            config,
            mode: None,
            driver_ratio: None,
            clock_enabled: false,
            clock_source: None,
            clock_divide: None,
            tx_frames: 0,
            rx_frames: 0,
            tx_errors: 0,
            failed: None,
        }
    }

    fn depth(&self) -> BitDepth {
        BitDepth::try_new(self.config.bit_depth).unwrap_or_default()
    }

    fn clock_ok(&self) -> bool {
        let divide = u8::try_from(self.config.ratio >> 1).ok();
        self.clock_enabled
            && self.clock_source == Some(ClockSource::MasterClockPin)
            && divide.is_some()
            && self.clock_divide == divide
    }

    fn mode_ok(&self) -> bool {
        let expected = if self.config.i2s_justified {
            I2sMode::I2s
        } else {
            I2sMode::LeftJustified
        };
        self.mode == Some(expected) && self.driver_ratio == Some(self.config.ratio)
    }

    fn frames_ok(&self) -> bool {
        let tx = self.config.num_out == 0 || self.tx_frames == FRAMES_PER_ROUND;
        let rx = self.config.num_in == 0 || self.rx_frames == FRAMES_PER_ROUND;
        tx && rx
    }
}

/// Error from a simulated port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPortError {
    /// Operation not supported in this line's direction.
    WrongDirection,
}

impl core::fmt::Display for SimPortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WrongDirection => write!(f, "operation not supported in this line direction"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Collecting configuration words.
    Listening,
    /// Round configured; driver streaming.
    Streaming,
    /// Verdict on the response line, waiting for the acknowledge.
    Armed,
    /// Acknowledged; response line shows the verdict until the next word.
    Acked,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClockState {
    enabled: bool,
    source: Option<ClockSource>,
    divide: Option<u8>,
}

#[derive(Debug)]
struct Core {
    phase: Phase,
    words: [u32; CONFIG_WORDS],
    word_count: usize,
    data: u32,
    strobe: u32,
    clock: ClockState,
    verdict_delay: u32,
    pending_delay: u32,
    faults: Vec<Fault>,
    rounds: Vec<SimRound>,
    events: Vec<TesterEvent>,
    violations: Vec<Violation>,
}

impl Core {
    fn new() -> Self {
        Self {
            phase: Phase::Listening,
            words: [0; CONFIG_WORDS],
            word_count: 0,
            data: 0,
            strobe: 0,
            clock: ClockState::default(),
            verdict_delay: 0,
            pending_delay: 0,
            faults: Vec::new(),
            rounds: Vec::new(),
            events: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn round_index(&self) -> usize {
        self.rounds.len().saturating_sub(1)
    }

    fn has_fault(&self, fault: impl Fn(&Fault) -> bool) -> bool {
        let round = self.round_index();
        self.faults.iter().any(|f| f.round() == round && fault(f))
    }

    fn on_strobe(&mut self, value: u32) {
        let level = value & 1;
        let rising = level == 1 && self.strobe == 0;
        self.strobe = level;
        if !rising {
            return;
        }

        match self.phase {
            Phase::Armed => {
                self.phase = Phase::Acked;
                let round = self.round_index();
                self.events.push(TesterEvent::Acknowledged { round });
            }
            Phase::Streaming => {
                let round = self.round_index();
                self.violations.push(Violation::BroadcastBeforeVerdict { round });
                if let Some(r) = self.rounds.last_mut() {
                    r.failed = Some(true);
                }
                self.phase = Phase::Listening;
                self.latch_word();
            }
            Phase::Listening | Phase::Acked => {
                self.phase = Phase::Listening;
                self.latch_word();
            }
        }
    }

    fn latch_word(&mut self) {
        if let Some(slot) = self.words.get_mut(self.word_count) {
            *slot = self.data;
            self.word_count = self.word_count.saturating_add(1);
        }
        if self.word_count == CONFIG_WORDS {
            self.word_count = 0;
            let config = TesterConfig::from_words(&self.words);
            self.rounds.push(SimRound::new(config));
            let round = self.round_index();
            self.events.push(TesterEvent::ConfigReceived { round, config });
            self.phase = Phase::Streaming;
            self.pending_delay = self.verdict_delay;
        }
    }

    fn read_response(&mut self) -> u32 {
        match self.phase {
            Phase::Listening => 0,
            Phase::Streaming => {
                if self.pending_delay > 0 {
                    self.pending_delay = self.pending_delay.saturating_sub(1);
                    return 0;
                }
                let failed = self.evaluate();
                let round = self.round_index();
                self.events.push(TesterEvent::VerdictOffered { round, failed });
                self.phase = Phase::Armed;
                1
            }
            Phase::Armed => 1,
            Phase::Acked => {
                let failed = self.rounds.last().and_then(|r| r.failed).unwrap_or(true);
                u32::from(failed)
            }
        }
    }

    fn evaluate(&mut self) -> bool {
        let forced = self.has_fault(|f| matches!(f, Fault::FailVerdict { .. }));
        let Some(round) = self.rounds.last_mut() else {
            return true;
        };
        let failed = round.failed.unwrap_or(false)
            || forced
            || round.tx_errors > 0
            || !round.clock_ok()
            || !round.mode_ok()
            || !round.frames_ok();
        round.failed = Some(failed);
        failed
    }

    fn begin_stream(&mut self, config: &I2sConfig) {
        if self.phase != Phase::Streaming {
            self.violations.push(Violation::StreamWithoutConfig);
            return;
        }
        let clock = self.clock;
        let round = self.round_index();
        if let Some(r) = self.rounds.last_mut() {
            r.mode = Some(config.mode);
            r.driver_ratio = Some(config.mclk_bclk_ratio);
            r.clock_enabled = clock.enabled;
            r.clock_source = clock.source;
            r.clock_divide = clock.divide;
        }
        self.events.push(TesterEvent::StreamStarted { round });
    }

    fn capture(&mut self, frame: &[i32]) {
        let corrupt = self.has_fault(|f| matches!(f, Fault::CorruptTransmit { .. }));
        let Some(round) = self.rounds.last_mut() else {
            return;
        };
        let depth = round.depth();
        let index = usize::try_from(round.tx_frames).unwrap_or(0);
        let width = usize::from(round.config.num_out).saturating_mul(CHANNELS_PER_LINE);
        if frame.len() != width {
            round.tx_errors = round.tx_errors.saturating_add(1);
        }
        for (channel, &sample) in frame.iter().enumerate() {
            let sample = if corrupt && channel == 0 { sample ^ 1 } else { sample };
            let expected = table_sample(&TX_DATA, channel, index).unwrap_or(0);
            if !depth.same_on_wire(sample, expected) {
                round.tx_errors = round.tx_errors.saturating_add(1);
            }
        }
        round.tx_frames = round.tx_frames.saturating_add(1);
    }

    fn playback(&mut self, frame: &mut [i32]) {
        let corrupt = self.has_fault(|f| matches!(f, Fault::CorruptReceive { .. }));
        let noise = self.has_fault(|f| matches!(f, Fault::NoiseAboveDepth { .. }));
        let Some(round) = self.rounds.last_mut() else {
            frame.fill(0);
            return;
        };
        let bits = u32::from(round.depth().bits());
        let index = usize::try_from(round.rx_frames).unwrap_or(0);
        for (channel, slot) in frame.iter_mut().enumerate() {
            let mut sample = table_sample(&RX_DATA, channel, index).unwrap_or(0);
            if corrupt && channel == 0 {
                sample ^= 1;
            }
            if noise {
                sample ^= 1i32.checked_shl(bits).unwrap_or(0);
            }
            *slot = sample;
        }
        round.rx_frames = round.rx_frames.saturating_add(1);
    }
}

/// Simulated tester device.
///
/// Cloning yields another handle on the same device.
#[derive(Debug, Clone)]
pub struct SimTester {
    core: Arc<Mutex<Core>>,
}

impl Default for SimTester {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTester {
    /// A tester that answers as soon as it is polled.
    pub fn new() -> Self {
        Self {
            core: Arc::new(Mutex::new(Core::new())),
        }
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep the response line low for `reads` polls before each verdict.
    #[must_use]
    pub fn with_verdict_delay(self, reads: u32) -> Self {
        self.core().verdict_delay = reads;
        self
    }

    /// Schedule a fault.
    pub fn inject(&self, fault: Fault) {
        self.core().faults.push(fault);
    }

    /// Strobe, data and response lines as harness-side ports.
    pub fn ports(&self) -> (SimStrobe, SimData, SimResponse) {
        (
            SimStrobe { tester: self.clone() },
            SimData { tester: self.clone() },
            SimResponse { tester: self.clone() },
        )
    }

    /// The bit-clock block the tester watches.
    pub fn clock_block(&self) -> SimClockBlock {
        SimClockBlock { tester: self.clone() }
    }

    /// The driver started clocking with `config`.
    pub fn begin_stream(&self, config: &I2sConfig) {
        self.core().begin_stream(config);
    }

    /// Capture one frame the driver transmitted.
    pub fn capture(&self, frame: &[i32]) {
        self.core().capture(frame);
    }

    /// Produce one frame for the driver to receive.
    pub fn playback(&self, frame: &mut [i32]) {
        self.core().playback(frame);
    }

    /// Rounds seen so far.
    pub fn rounds(&self) -> Vec<SimRound> {
        self.core().rounds.clone()
    }

    /// Events in arrival order.
    pub fn events(&self) -> Vec<TesterEvent> {
        self.core().events.clone()
    }

    /// Handshake violations.
    pub fn violations(&self) -> Vec<Violation> {
        self.core().violations.clone()
    }
}

/// Strobe line, harness → tester.
#[derive(Debug, Clone)]
pub struct SimStrobe {
    tester: SimTester,
}

impl Port for SimStrobe {
    type Error = SimPortError;

    fn write(&mut self, value: u32) -> Result<(), Self::Error> {
        self.tester.core().on_strobe(value);
        Ok(())
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        Ok(self.tester.core().strobe)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Data lines, harness → tester. Sixteen bits wide.
#[derive(Debug, Clone)]
pub struct SimData {
    tester: SimTester,
}

impl Port for SimData {
    type Error = SimPortError;

    fn write(&mut self, value: u32) -> Result<(), Self::Error> {
        self.tester.core().data = value & 0xFFFF;
        Ok(())
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        Ok(self.tester.core().data)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Response line, tester → harness.
#[derive(Debug, Clone)]
pub struct SimResponse {
    tester: SimTester,
}

impl Port for SimResponse {
    type Error = SimPortError;

    fn write(&mut self, _value: u32) -> Result<(), Self::Error> {
        Err(SimPortError::WrongDirection)
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        Ok(self.tester.core().read_response())
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Bit-clock block whose settings the tester checks.
#[derive(Debug, Clone)]
pub struct SimClockBlock {
    tester: SimTester,
}

impl ClockBlock for SimClockBlock {
    type Error = core::convert::Infallible;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.tester.core().clock.enabled = true;
        Ok(())
    }

    fn set_source(&mut self, source: ClockSource) -> Result<(), Self::Error> {
        self.tester.core().clock.source = Some(source);
        Ok(())
    }

    fn set_divide(&mut self, divide: u8) -> Result<(), Self::Error> {
        self.tester.core().clock.divide = Some(divide);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn broadcast(strobe: &mut SimStrobe, data: &mut SimData, config: &TesterConfig) {
        strobe.write(0).unwrap();
        for w in config.words() {
            data.write(w).unwrap();
            data.sync().unwrap();
            strobe.pulse().unwrap();
            strobe.sync().unwrap();
        }
    }

    fn config() -> TesterConfig {
        TesterConfig {
            mclk_hz: 24_576_000,
            ratio: 2,
            num_in: 1,
            num_out: 1,
            bit_depth: 32,
            i2s_justified: true,
        }
    }

    fn stream_clean_round(tester: &SimTester) {
        let mut clk = tester.clock_block();
        clk.enable().unwrap();
        clk.set_source(ClockSource::MasterClockPin).unwrap();
        clk.set_divide(1).unwrap();
        tester.begin_stream(&I2sConfig {
            mode: I2sMode::I2s,
            mclk_bclk_ratio: 2,
        });
        for k in 0..4 {
            tester.capture(&[TX_DATA[0][k], TX_DATA[1][k]]);
            let mut rx = [0; 2];
            tester.playback(&mut rx);
            assert_eq!(rx, [RX_DATA[0][k], RX_DATA[1][k]]);
        }
    }

    #[test]
    fn decodes_broadcast() {
        let tester = SimTester::new();
        let (mut strobe, mut data, _) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        assert_eq!(tester.rounds().len(), 1);
        assert_eq!(tester.rounds()[0].config, config());
        assert_eq!(
            tester.events(),
            vec![TesterEvent::ConfigReceived {
                round: 0,
                config: config()
            }]
        );
    }

    #[test]
    fn clean_round_passes_and_releases_line() {
        let tester = SimTester::new().with_verdict_delay(2);
        let (mut strobe, mut data, mut response) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        stream_clean_round(&tester);

        assert_eq!(response.read().unwrap(), 0);
        assert_eq!(response.read().unwrap(), 0);
        assert_eq!(response.read().unwrap(), 1);
        strobe.pulse().unwrap();
        assert_eq!(response.read().unwrap(), 0);
        assert_eq!(tester.rounds()[0].failed, Some(false));
        assert!(tester.violations().is_empty());
    }

    #[test]
    fn wrong_divider_fails_round() {
        let tester = SimTester::new();
        let (mut strobe, mut data, mut response) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        stream_clean_round(&tester);
        // Reconfiguring after the stream started does not count.
        tester.clock_block().set_divide(4).unwrap();
        assert_eq!(response.read().unwrap(), 1);
        assert_eq!(tester.rounds()[0].failed, Some(false));

        let tester = SimTester::new();
        let (mut strobe, mut data, mut response) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        tester.clock_block().set_divide(4).unwrap();
        tester.begin_stream(&I2sConfig::default());
        assert_eq!(response.read().unwrap(), 1);
        strobe.pulse().unwrap();
        assert_eq!(response.read().unwrap(), 1);
        assert_eq!(tester.rounds()[0].failed, Some(true));
    }

    #[test]
    fn corrupted_transmit_is_caught() {
        let tester = SimTester::new();
        tester.inject(Fault::CorruptTransmit { round: 0 });
        let (mut strobe, mut data, mut response) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        stream_clean_round(&tester);
        response.read().unwrap();
        assert_eq!(tester.rounds()[0].tx_errors, 4);
        assert_eq!(tester.rounds()[0].failed, Some(true));
    }

    #[test]
    fn noise_above_depth_only_touches_narrow_words() {
        let tester = SimTester::new();
        tester.inject(Fault::NoiseAboveDepth { round: 0 });
        let (mut strobe, mut data, _) = tester.ports();
        broadcast(
            &mut strobe,
            &mut data,
            &TesterConfig {
                bit_depth: 16,
                ..config()
            },
        );
        let mut rx = [0; 2];
        tester.playback(&mut rx);
        assert_eq!(rx, [1 ^ 0x1_0000, 101 ^ 0x1_0000]);
    }

    #[test]
    fn broadcast_before_verdict_is_a_violation() {
        let tester = SimTester::new();
        let (mut strobe, mut data, _) = tester.ports();
        broadcast(&mut strobe, &mut data, &config());
        broadcast(&mut strobe, &mut data, &config());
        assert_eq!(
            tester.violations(),
            vec![Violation::BroadcastBeforeVerdict { round: 0 }]
        );
        assert_eq!(tester.rounds()[0].failed, Some(true));
        assert_eq!(tester.rounds().len(), 2);
    }

    #[test]
    fn stream_without_config_is_a_violation() {
        let tester = SimTester::new();
        tester.begin_stream(&I2sConfig::default());
        assert_eq!(tester.violations(), vec![Violation::StreamWithoutConfig]);
    }

    #[test]
    fn response_line_rejects_writes() {
        let tester = SimTester::new();
        let (_, _, mut response) = tester.ports();
        assert_eq!(response.write(1), Err(SimPortError::WrongDirection));
    }
}
