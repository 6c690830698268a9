//! Transport abstraction for the physical link
//!
//! This module provides the boundary to whatever carries the report stream
//! (Bluetooth HID socket, hidraw handle, ...). The driver hands every
//! outgoing report to a `Transport`; incoming frames reach the driver through
//! `Wiimote::handle_frame`, driven by the host's read loop.

pub mod mock;

pub use mock::MockTransport;

use thiserror::Error;

use crate::wiimote::report::OutgoingReport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport write failed: {0}")]
    Write(String),

    #[error("link is closed")]
    Closed,
}

/// Framing flavor of the link, deciding how much of a report goes on the wire
///
/// Descriptor-based transports (HID) must always transmit the full 22-byte
/// report; streaming socket transports reject padding and take only the
/// meaningful prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Descriptor,
    Stream,
}

/// Unified interface for writing reports to the device
pub trait Transport {
    /// Framing flavor of this link
    fn kind(&self) -> TransportKind;

    /// Put one report on the wire, truncated per `kind`
    fn write(&mut self, report: &OutgoingReport) -> Result<(), TransportError>;
}

impl OutgoingReport {
    /// The bytes a transport of the given kind actually transmits
    pub fn wire_bytes(&self, kind: TransportKind) -> &[u8] {
        match kind {
            TransportKind::Descriptor => self.full(),
            TransportKind::Stream => self.meaningful(),
        }
    }
}
