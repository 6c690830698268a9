//! wiimote-rs: WiiMote protocol driver
//!
//! This library turns the fixed-size report stream of a WiiMote-family
//! motion controller into typed sensor state and events, and typed commands
//! back into outgoing reports. The physical link stays behind the
//! [`transport::Transport`] trait.

pub mod config;
pub mod transport;
pub mod wiimote;

// Re-export commonly used items
pub use config::Config;
pub use transport::{MockTransport, Transport, TransportError, TransportKind};
pub use wiimote::{DriverError, DriverState, Wiimote, WiimoteEvent};
