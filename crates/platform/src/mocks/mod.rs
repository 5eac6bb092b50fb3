//! Mock implementations for testing
//!
//! This module provides recording implementations of the platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{ClockBlock, ClockSource, Port};

/// Which handshake line a mock port stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortId {
    /// Strobe line (harness → tester)
    Strobe,
    /// Parallel data lines (harness → tester)
    Data,
    /// Response line (tester → harness)
    Response,
}

/// One recorded port operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    /// `write(value)`
    Write(PortId, u32),
    /// `sync()`
    Sync(PortId),
    /// `read()` and the value it returned
    Read(PortId, u32),
}

/// Operation log that several mock ports can share, so tests can assert the
/// interleaving across lines.
#[derive(Debug, Clone, Default)]
pub struct PortLog(Arc<Mutex<Vec<PortEvent>>>);

impl PortLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: PortEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<PortEvent> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Values written to `id`, in order.
    pub fn writes_to(&self, id: PortId) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PortEvent::Write(p, v) if p == id => Some(v),
                _ => None,
            })
            .collect()
    }
}

/// Mock port: records writes and syncs, answers reads from a script.
pub struct MockPort {
    id: PortId,
    log: PortLog,
    script: VecDeque<u32>,
    idle: u32,
    level: u32,
}

impl MockPort {
    /// Create a mock port with its own log. Reads return 0 once the script is empty.
    pub fn new(id: PortId) -> Self {
        Self::with_log(id, PortLog::new())
    }

    /// Create a mock port recording into a shared log.
    pub fn with_log(id: PortId, log: PortLog) -> Self {
        Self {
            id,
            log,
            script: VecDeque::new(),
            idle: 0,
            level: 0,
        }
    }

    /// Queue values for successive reads.
    pub fn script_reads(&mut self, values: &[u32]) {
        self.script.extend(values.iter().copied());
    }

    /// Value returned once the script runs out.
    pub fn set_idle(&mut self, value: u32) {
        self.idle = value;
    }

    /// Last value written.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The log this port records into.
    pub fn log(&self) -> &PortLog {
        &self.log
    }
}

impl Port for MockPort {
    type Error = core::convert::Infallible;

    fn write(&mut self, value: u32) -> Result<(), Self::Error> {
        self.level = value;
        self.log.push(PortEvent::Write(self.id, value));
        Ok(())
    }

    fn read(&mut self) -> Result<u32, Self::Error> {
        let value = self.script.pop_front().unwrap_or(self.idle);
        self.log.push(PortEvent::Read(self.id, value));
        Ok(value)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        self.log.push(PortEvent::Sync(self.id));
        Ok(())
    }
}

/// Mock clock block: remembers its configuration.
#[derive(Debug, Clone, Default)]
pub struct MockClockBlock {
    /// Whether [`ClockBlock::enable`] has been called
    pub enabled: bool,
    /// Source from the last [`ClockBlock::set_source`]
    pub source: Option<ClockSource>,
    /// Divider from the last [`ClockBlock::set_divide`]
    pub divide: Option<u8>,
    /// Number of `set_divide` calls
    pub reconfigurations: usize,
}

impl MockClockBlock {
    /// Create a disabled, unconfigured clock block.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClockBlock for MockClockBlock {
    type Error = core::convert::Infallible;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.enabled = true;
        Ok(())
    }

    fn set_source(&mut self, source: ClockSource) -> Result<(), Self::Error> {
        self.source = Some(source);
        Ok(())
    }

    fn set_divide(&mut self, divide: u8) -> Result<(), Self::Error> {
        self.divide = Some(divide);
        self.reconfigurations = self.reconfigurations.saturating_add(1);
        Ok(())
    }
}
