//! Report codec
//!
//! This module frames and parses the fixed-size 22-byte report layouts:
//! - Classification of incoming frames by their leading type byte
//! - Bit-exact field extraction into owned, bounds-checked payload arrays
//! - Assembly of outgoing command reports (rumble rides along every one)
//!
//! Payloads are copied out of the caller's frame; nothing here keeps a
//! reference into transport-owned memory.

use thiserror::Error;

use crate::wiimote::constants::*;
use crate::wiimote::decrypt::decrypt_buffer;
use crate::wiimote::memory::MemoryReply;
use crate::wiimote::types::ReportMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown report type 0x{0:02x}")]
    UnknownReportType(u8),

    #[error("report 0x{report:02x} truncated to {len} bytes")]
    Truncated { report: u8, len: usize },
}

/// A classified incoming report
///
/// Every known frame layout maps to exactly one variant; the driver matches
/// this exhaustively, so adding a layout is a compile-time checked change.
/// Embedded extension payloads are already de-obfuscated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedReport {
    /// Status report (0x20)
    Status {
        buttons: u16,
        led_mask: u8,
        battery_raw: u8,
        extension_present: bool,
    },
    /// Memory read reply (0x21)
    MemoryData(MemoryReply),
    /// Buttons only (0x30)
    Buttons { buttons: u16 },
    /// Buttons and acceleration (0x31)
    ButtonsAccel { buttons: u16, accel: [u8; 3] },
    /// Buttons, acceleration and IR in extended mode (0x33)
    ButtonsAccelIr {
        buttons: u16,
        accel: [u8; 3],
        ir: [u8; 12],
    },
    /// Buttons, acceleration and extension data (0x35)
    ButtonsAccelExt {
        buttons: u16,
        accel: [u8; 3],
        extension: [u8; 16],
    },
    /// Buttons, acceleration, IR in basic mode and extension data (0x37)
    ButtonsAccelIrExt {
        buttons: u16,
        accel: [u8; 3],
        ir: [u8; 10],
        extension: [u8; 6],
    },
}

/// Classify and parse one incoming frame
///
/// Total over arbitrary byte input: an unknown leading byte or a frame
/// shorter than its layout yields a non-fatal error and the caller drops the
/// frame.
pub fn decode(frame: &[u8]) -> Result<DecodedReport, DecodeError> {
    let report = *frame.first().ok_or(DecodeError::Truncated {
        report: 0x00,
        len: 0,
    })?;

    let need = |len: usize| -> Result<(), DecodeError> {
        if frame.len() < len {
            Err(DecodeError::Truncated {
                report,
                len: frame.len(),
            })
        } else {
            Ok(())
        }
    };

    match report {
        REPORT_STATUS => {
            need(7)?;
            Ok(DecodedReport::Status {
                buttons: buttons_at(frame, 1),
                led_mask: frame[3] >> 4,
                battery_raw: frame[6],
                extension_present: (frame[3] & 0x02) != 0,
            })
        }
        REPORT_READ_MEMORY => {
            need(6)?;
            let size = frame[3] >> 4;
            let payload_len = size as usize + 1;
            need(6 + payload_len)?;
            let mut data = [0u8; 16];
            data[..payload_len].copy_from_slice(&frame[6..6 + payload_len]);
            Ok(DecodedReport::MemoryData(MemoryReply {
                buttons: buttons_at(frame, 1),
                error: frame[3] & 0x0f,
                size,
                address: u16::from_be_bytes([frame[4], frame[5]]),
                data,
            }))
        }
        REPORT_BUTTONS => {
            need(3)?;
            Ok(DecodedReport::Buttons {
                buttons: buttons_at(frame, 1),
            })
        }
        REPORT_BUTTONS_ACCEL => {
            need(6)?;
            Ok(DecodedReport::ButtonsAccel {
                buttons: buttons_at(frame, 1),
                accel: accel_at(frame, 3),
            })
        }
        REPORT_BUTTONS_ACCEL_IR => {
            need(18)?;
            let mut ir = [0u8; 12];
            ir.copy_from_slice(&frame[6..18]);
            Ok(DecodedReport::ButtonsAccelIr {
                buttons: buttons_at(frame, 1),
                accel: accel_at(frame, 3),
                ir,
            })
        }
        REPORT_BUTTONS_ACCEL_EXT => {
            need(REPORT_SIZE)?;
            let mut extension = [0u8; 16];
            extension.copy_from_slice(&frame[6..22]);
            decrypt_buffer(&mut extension);
            Ok(DecodedReport::ButtonsAccelExt {
                buttons: buttons_at(frame, 1),
                accel: accel_at(frame, 3),
                extension,
            })
        }
        REPORT_BUTTONS_ACCEL_IR_EXT => {
            need(REPORT_SIZE)?;
            let mut ir = [0u8; 10];
            ir.copy_from_slice(&frame[6..16]);
            let mut extension = [0u8; 6];
            extension.copy_from_slice(&frame[16..22]);
            decrypt_buffer(&mut extension);
            Ok(DecodedReport::ButtonsAccelIrExt {
                buttons: buttons_at(frame, 1),
                accel: accel_at(frame, 3),
                ir,
                extension,
            })
        }
        other => Err(DecodeError::UnknownReportType(other)),
    }
}

fn buttons_at(frame: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([frame[offset], frame[offset + 1]])
}

fn accel_at(frame: &[u8], offset: usize) -> [u8; 3] {
    [frame[offset], frame[offset + 1], frame[offset + 2]]
}

// ============================================================================
// Outgoing reports
// ============================================================================

/// An assembled outgoing report
///
/// Always a full, zero-padded 22-byte buffer plus the meaningful prefix
/// length. Whether the transport sends the full buffer or only the prefix is
/// the Transport Port's call (descriptor vs. stream framing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingReport {
    buf: [u8; REPORT_SIZE],
    len: usize,
}

impl OutgoingReport {
    fn new(len: usize) -> Self {
        Self {
            buf: [0u8; REPORT_SIZE],
            len,
        }
    }

    /// The command opcode (leading byte)
    pub fn command(&self) -> u8 {
        self.buf[0]
    }

    /// Full zero-padded buffer
    pub fn full(&self) -> &[u8; REPORT_SIZE] {
        &self.buf
    }

    /// Meaningful prefix of the buffer
    pub fn meaningful(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Length of the meaningful prefix
    pub fn meaningful_len(&self) -> usize {
        self.len
    }
}

fn rumble_bit(rumble: bool) -> u8 {
    if rumble {
        0x01
    } else {
        0x00
    }
}

/// Request a status report (0x15)
pub fn status_request(rumble: bool) -> OutgoingReport {
    let mut report = OutgoingReport::new(2);
    report.buf[0] = CMD_STATUS;
    report.buf[1] = rumble_bit(rumble);
    report
}

/// Set the player LEDs (0x11); only the low nibble of `mask` is used
pub fn set_leds(mask: u8, rumble: bool) -> OutgoingReport {
    let mut report = OutgoingReport::new(2);
    report.buf[0] = CMD_LEDS;
    report.buf[1] = ((mask & 0x0f) << 4) | rumble_bit(rumble);
    report
}

/// Set the data report mode (0x12)
pub fn set_report_mode(mode: ReportMode, continuous: bool, rumble: bool) -> OutgoingReport {
    let mut report = OutgoingReport::new(3);
    report.buf[0] = CMD_REPORT_MODE;
    report.buf[1] = (if continuous { 0x04 } else { 0x00 }) | rumble_bit(rumble);
    report.buf[2] = mode.to_byte();
    report
}

/// Enable or disable the IR camera pixel clock (0x13)
pub fn ir_clock_enable(enable: bool, rumble: bool) -> OutgoingReport {
    ir_enable(CMD_IR, enable, rumble)
}

/// Enable or disable the IR camera chip (0x1a)
pub fn ir_chip_enable(enable: bool, rumble: bool) -> OutgoingReport {
    ir_enable(CMD_IR2, enable, rumble)
}

fn ir_enable(command: u8, enable: bool, rumble: bool) -> OutgoingReport {
    let mut report = OutgoingReport::new(2);
    report.buf[0] = command;
    report.buf[1] = (if enable { 0x04 } else { 0x00 }) | rumble_bit(rumble);
    report
}

pub(crate) fn raw(buf: [u8; REPORT_SIZE], len: usize) -> OutgoingReport {
    OutgoingReport { buf, len }
}
