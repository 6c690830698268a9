//! Integration tests for command output and the shared rumble bit

use wiimote_rs::wiimote::constants::*;
use wiimote_rs::wiimote::types::{IrMode, ReportMode};
use wiimote_rs::{Config, MockTransport, TransportError, Wiimote};

fn driver() -> Wiimote<MockTransport> {
    Wiimote::new(MockTransport::new(), &Config::default())
}

#[test]
fn test_bring_up_sequence() {
    let mut wiimote = driver();
    wiimote.handle_connect().unwrap();

    let commands = wiimote.transport().commands();
    // status, calibration read, IR enable sequence, report mode, LEDs
    assert_eq!(
        commands,
        vec![
            CMD_STATUS,
            CMD_READ_MEMORY,
            CMD_IR,
            CMD_IR2,
            CMD_WRITE_MEMORY,
            CMD_WRITE_MEMORY,
            CMD_WRITE_MEMORY,
            CMD_WRITE_MEMORY,
            CMD_REPORT_MODE,
            CMD_LEDS,
        ]
    );
}

#[test]
fn test_rumble_bit_rides_every_command() {
    let mut wiimote = driver();
    wiimote.set_rumble(true).unwrap();
    wiimote.set_leds(0b1010).unwrap();

    let writes = wiimote.transport().writes();
    // the status request carrying the rumble change
    assert_eq!(writes[0][0], CMD_STATUS);
    assert_eq!(writes[0][1] & 0x01, 0x01);
    // an unrelated command still carries the bit, plus the LED nibble
    assert_eq!(writes[1][0], CMD_LEDS);
    assert_eq!(writes[1][1], 0xa1);

    // and it stays clear once rumble is off
    wiimote.set_rumble(false).unwrap();
    wiimote.set_leds(0b1010).unwrap();
    let writes = wiimote.transport().writes();
    assert_eq!(writes[3][1], 0xa0);
}

#[test]
fn test_report_mode_drives_ir_mode() {
    let mut wiimote = driver();

    wiimote.set_report_mode(ReportMode::ButtonsAccelIr, false).unwrap();
    assert_eq!(wiimote.state().ir_mode, IrMode::Extended);

    wiimote.set_report_mode(ReportMode::ButtonsAccelIrExt, false).unwrap();
    assert_eq!(wiimote.state().ir_mode, IrMode::Basic);

    wiimote.transport_mut().clear();
    wiimote.set_report_mode(ReportMode::ButtonsAccel, false).unwrap();
    assert_eq!(wiimote.state().ir_mode, IrMode::Off);

    // disabling IR sends only the two enable commands with the bit clear
    let writes = wiimote.transport().writes();
    assert_eq!(writes[0][0], CMD_IR);
    assert_eq!(writes[0][1] & 0x04, 0x00);
    assert_eq!(writes[1][0], CMD_IR2);
    assert_eq!(writes[2][0], CMD_REPORT_MODE);
    assert_eq!(writes[2][2], 0x31);
}

#[test]
fn test_ir_enable_sequence_writes_registers() {
    let mut wiimote = driver();
    wiimote.set_report_mode(ReportMode::ButtonsAccelIr, false).unwrap();

    let writes = wiimote.transport().writes();
    let register_writes: Vec<_> = writes.iter().filter(|w| w[0] == CMD_WRITE_MEMORY).collect();
    assert_eq!(register_writes.len(), 4);

    // camera enable register, both sensitivity blocks, mode register
    assert_eq!(&register_writes[0][1..7], &[0x04, 0xb0, 0x00, 0x30, 0x01, 0x08]);
    assert_eq!(register_writes[1][5], 9);
    assert_eq!(&register_writes[1][6..15], &IR_SENSITIVITY_BLOCK_1);
    assert_eq!(register_writes[2][5], 2);
    assert_eq!(&register_writes[2][6..8], &IR_SENSITIVITY_BLOCK_2);
    assert_eq!(&register_writes[3][1..7], &[0x04, 0xb0, 0x00, 0x33, 0x01, 0x03]);
}

#[test]
fn test_stream_transport_gets_meaningful_prefix() {
    let mut wiimote = Wiimote::new(MockTransport::stream(), &Config::default());
    wiimote.send_status_request().unwrap();
    wiimote.set_leds(0x01).unwrap();

    let writes = wiimote.transport().writes();
    assert_eq!(writes[0].len(), 2);
    assert_eq!(writes[1].len(), 2);
}

#[test]
fn test_descriptor_transport_gets_full_reports() {
    let mut wiimote = driver();
    wiimote.send_status_request().unwrap();
    assert_eq!(wiimote.transport().writes()[0].len(), REPORT_SIZE);
}

#[test]
fn test_transport_write_failure_surfaces() {
    let mut wiimote = driver();
    wiimote.transport_mut().fail_writes(true);

    let err = wiimote.set_leds(0x01).unwrap_err();
    assert!(matches!(
        err,
        wiimote_rs::DriverError::Transport(TransportError::Write(_))
    ));
}
