//! Mock transport for tests and the demo binary
//!
//! Records everything the driver would put on the wire instead of touching a
//! real link.

use crate::transport::{Transport, TransportError, TransportKind};
use crate::wiimote::report::OutgoingReport;

/// Recording transport
#[derive(Debug, Clone)]
pub struct MockTransport {
    kind: TransportKind,
    writes: Vec<Vec<u8>>,
    fail_writes: bool,
}

impl MockTransport {
    /// Descriptor-framed mock (full 22-byte writes)
    pub fn new() -> Self {
        Self::with_kind(TransportKind::Descriptor)
    }

    /// Stream-framed mock (meaningful-prefix writes)
    pub fn stream() -> Self {
        Self::with_kind(TransportKind::Stream)
    }

    fn with_kind(kind: TransportKind) -> Self {
        Self {
            kind,
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    /// Everything written so far, as it would appear on the wire
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Leading command byte of every write, in order
    pub fn commands(&self) -> Vec<u8> {
        self.writes.iter().filter_map(|w| w.first().copied()).collect()
    }

    /// Forget recorded writes
    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn write(&mut self, report: &OutgoingReport) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Write("mock failure".to_string()));
        }
        self.writes.push(report.wire_bytes(self.kind).to_vec());
        Ok(())
    }
}
