//! Integration tests for report classification and command encoding

use wiimote_rs::wiimote::constants::*;
use wiimote_rs::wiimote::decrypt::decrypt_buffer;
use wiimote_rs::wiimote::memory;
use wiimote_rs::wiimote::report::{self, DecodeError, DecodedReport};
use wiimote_rs::TransportKind;

fn frame(bytes: &[u8]) -> [u8; REPORT_SIZE] {
    let mut frame = [0u8; REPORT_SIZE];
    frame[..bytes.len()].copy_from_slice(bytes);
    frame
}

#[test]
fn test_decrypt_golden_vector() {
    // hand-computed from b = ((b ^ 0x17) + 0x17) & 0xff, including the
    // 8-bit wraparound case (0xe9)
    let mut data = [0x00, 0x17, 0xff, 0x80, 0xe9];
    decrypt_buffer(&mut data);
    assert_eq!(data, [0x2e, 0x17, 0xff, 0xae, 0x15]);
}

#[test]
fn test_unknown_report_type_is_non_fatal_error() {
    let err = report::decode(&frame(&[0x99])).unwrap_err();
    assert_eq!(err, DecodeError::UnknownReportType(0x99));
}

#[test]
fn test_truncated_frames_are_rejected() {
    assert!(matches!(
        report::decode(&[]),
        Err(DecodeError::Truncated { len: 0, .. })
    ));
    assert!(matches!(
        report::decode(&[REPORT_BUTTONS_ACCEL, 0x00, 0x00]),
        Err(DecodeError::Truncated { .. })
    ));
    assert!(matches!(
        report::decode(&[REPORT_STATUS, 0x00, 0x00, 0x02]),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn test_status_report_decode() {
    let decoded = report::decode(&frame(&[0x20, 0x01, 0x08, 0x32, 0x00, 0x00, 0xaa])).unwrap();
    assert_eq!(
        decoded,
        DecodedReport::Status {
            buttons: 0x0801,
            led_mask: 0x03,
            battery_raw: 0xaa,
            extension_present: true,
        }
    );
}

#[test]
fn test_memory_reply_decode() {
    let decoded = report::decode(&frame(&[
        0x21, 0x00, 0x00, 0x10, 0x00, 0xfe, 0xfe, 0xfe,
    ]))
    .unwrap();
    match decoded {
        DecodedReport::MemoryData(reply) => {
            assert_eq!(reply.size, 1);
            assert_eq!(reply.error, 0);
            assert_eq!(reply.address, 0x00fe);
            assert_eq!(&reply.data[..2], &[0xfe, 0xfe]);
        }
        other => panic!("expected a memory reply, got {:?}", other),
    }
}

#[test]
fn test_embedded_extension_bytes_are_decrypted() {
    // plaintext 0x00 obfuscates to 0xfe on the wire
    let mut raw = frame(&[REPORT_BUTTONS_ACCEL_EXT, 0x00, 0x00, 0x80, 0x80, 0x80]);
    for byte in raw[6..22].iter_mut() {
        *byte = 0xfe;
    }
    let decoded = report::decode(&raw).unwrap();
    match decoded {
        DecodedReport::ButtonsAccelExt { extension, .. } => {
            assert_eq!(extension, [0x00; 16]);
        }
        other => panic!("expected buttons+accel+extension, got {:?}", other),
    }
}

#[test]
fn test_set_leds_encoding() {
    let outgoing = report::set_leds(0b1010, false);
    assert_eq!(outgoing.meaningful(), &[CMD_LEDS, 0xa0]);

    let outgoing = report::set_leds(0b1010, true);
    assert_eq!(outgoing.meaningful(), &[CMD_LEDS, 0xa1]);
}

#[test]
fn test_report_mode_encoding() {
    use wiimote_rs::wiimote::types::ReportMode;

    let outgoing = report::set_report_mode(ReportMode::ButtonsAccelIr, true, false);
    assert_eq!(outgoing.meaningful(), &[CMD_REPORT_MODE, 0x04, 0x33]);

    let outgoing = report::set_report_mode(ReportMode::Buttons, false, true);
    assert_eq!(outgoing.meaningful(), &[CMD_REPORT_MODE, 0x01, 0x30]);
}

#[test]
fn test_read_memory_encoding() {
    let outgoing = memory::read_memory(REG_EXTENSION_TYPE, 2, false);
    assert_eq!(
        outgoing.meaningful(),
        &[CMD_READ_MEMORY, 0x04, 0xa4, 0x00, 0xfe, 0x00, 0x02]
    );

    // the rumble flag shares the top address byte
    let outgoing = memory::read_memory(REG_CALIBRATION, 7, true);
    assert_eq!(
        outgoing.meaningful(),
        &[CMD_READ_MEMORY, 0x01, 0x00, 0x00, 0x16, 0x00, 0x07]
    );
}

#[test]
fn test_write_memory_encoding() {
    let outgoing = memory::write_memory(REG_IR, &[0x08], false).unwrap();
    assert_eq!(
        outgoing.meaningful(),
        &[CMD_WRITE_MEMORY, 0x04, 0xb0, 0x00, 0x30, 0x01, 0x08]
    );

    // oversized payloads are refused
    assert!(memory::write_memory(REG_IR, &[0u8; 17], false).is_none());
    assert!(memory::write_memory(REG_IR, &[], false).is_none());
}

#[test]
fn test_wire_truncation_per_transport_kind() {
    let outgoing = report::status_request(false);
    assert_eq!(outgoing.wire_bytes(TransportKind::Stream).len(), 2);
    assert_eq!(outgoing.wire_bytes(TransportKind::Descriptor).len(), REPORT_SIZE);

    // padding past the meaningful prefix stays zeroed
    let full = outgoing.wire_bytes(TransportKind::Descriptor);
    assert!(full[2..].iter().all(|&b| b == 0));
}
