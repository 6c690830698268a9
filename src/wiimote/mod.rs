//! WiiMote protocol support
//!
//! This module provides the complete controller protocol:
//! - Report framing and classification
//! - Extension data de-obfuscation
//! - Memory access protocol and transaction sequencing
//! - Sensor decoding, calibration and orientation fusion
//! - The event-driven driver itself

pub mod constants;
pub mod decrypt;
pub mod driver;
pub mod memory;
pub mod report;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use driver::{DriverError, Wiimote};
pub use report::{DecodeError, DecodedReport, OutgoingReport};
pub use state::DriverState;
pub use types::*;
