//! Host-side stand-ins for the hardware around the harness.
//!
//! [`SimTester`] plays the tester device: it decodes configuration
//! broadcasts, watches the bit clock, checks what the driver transmits,
//! feeds it known receive data and answers with a verdict. [`LoopbackDriver`]
//! plays the I2S master: it invokes any [`I2sCallbacks`](platform::I2sCallbacks)
//! implementation the way the real driver does and moves samples between the
//! callbacks and the tester.
//!
//! Together they let a full conformance run execute without a tile.

mod driver;
mod tester;

pub use driver::{DriverError, DriverStats, LoopbackDriver};
pub use tester::{
    Fault, SimClockBlock, SimData, SimPortError, SimResponse, SimRound, SimStrobe, SimTester,
    TesterEvent, Violation,
};
