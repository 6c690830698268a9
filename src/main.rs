//! WiiMote driver demo
//!
//! Runs the driver against the mock transport with a short scripted session:
//! bring-up, calibration, button/accel frames and a full extension
//! negotiation, then prints every event the driver published.
//!
//! No hardware is touched; wire a real Bluetooth HID link by implementing
//! the `Transport` trait and feeding its frames to `Wiimote::handle_frame`.

use wiimote_rs::wiimote::constants::REPORT_SIZE;
use wiimote_rs::wiimote::types::ReportMode;
use wiimote_rs::{Config, MockTransport, Wiimote};

/// Inverse of the controller-side obfuscation, for scripting device replies
fn obfuscate(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = byte.wrapping_sub(0x17) ^ 0x17;
    }
}

fn frame(bytes: &[u8]) -> [u8; REPORT_SIZE] {
    let mut frame = [0u8; REPORT_SIZE];
    frame[..bytes.len()].copy_from_slice(bytes);
    frame
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== WiiMote driver demo ===");
    println!();
    println!("This demo will:");
    println!("1. Bring the driver up over a mock transport");
    println!("2. Replay a scripted session (calibration, buttons, accel)");
    println!("3. Negotiate a Nunchuk extension");
    println!("4. Print every event the driver published");
    println!();

    let config = match Config::load_default() {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Falling back to built-in defaults: {}", err);
            Config::default()
        }
    };

    let mut wiimote = Wiimote::new(MockTransport::new(), &config);
    let events = wiimote.events();

    wiimote.handle_connect()?;

    // accelerometer calibration reply: zero g at 0x80, one g at 0xa0
    wiimote.handle_frame(&frame(&[
        0x21, 0x00, 0x00, 0x60, 0x00, 0x16, 0x80, 0x80, 0x80, 0x00, 0xa0, 0xa0, 0xa0,
    ]))?;

    // press and release 'A' while resting at one g on the Z axis
    wiimote.handle_frame(&frame(&[0x31, 0x00, 0x08, 0x80, 0x80, 0xa0]))?;
    wiimote.handle_frame(&frame(&[0x31, 0x00, 0x00, 0x80, 0x80, 0xa0]))?;

    // status: extension inserted, battery at 0xaa
    wiimote.handle_frame(&frame(&[0x20, 0x00, 0x00, 0x12, 0x00, 0x00, 0xaa]))?;

    // extension type reply: Nunchuk
    wiimote.handle_frame(&frame(&[0x21, 0x00, 0x00, 0x10, 0x00, 0xfe, 0xfe, 0xfe]))?;

    // extension calibration reply (obfuscated on the wire)
    let mut calibration = [
        0x80, 0x80, 0x80, 0x00, 0xb0, 0xb0, 0xb0, 0x00, 0xe0, 0x20, 0x80, 0xe0, 0x20, 0x80,
        0x00, 0x00,
    ];
    obfuscate(&mut calibration);
    let mut reply = frame(&[0x21, 0x00, 0x00, 0xf0, 0x00, 0x20]);
    reply[6..22].copy_from_slice(&calibration);
    wiimote.handle_frame(&reply)?;

    // switch to a combined layout now that the nunchuk is calibrated
    wiimote.set_report_mode(ReportMode::ButtonsAccelExt, false)?;

    // one nunchuk data frame: stick pushed right, Z pressed
    let mut nunchuk = [0u8; 16];
    nunchuk[0] = 0xc0;
    nunchuk[1] = 0x80;
    nunchuk[2] = 0x80;
    nunchuk[3] = 0x80;
    nunchuk[4] = 0xb0;
    nunchuk[5] = 0x02; // active-low: Z down, C up
    obfuscate(&mut nunchuk);
    let mut data = frame(&[0x35, 0x00, 0x00, 0x80, 0x80, 0xa0]);
    data[6..22].copy_from_slice(&nunchuk);
    wiimote.handle_frame(&data)?;

    println!("Events:");
    while let Ok(event) = events.try_recv() {
        println!("  {:?}", event);
    }
    println!();

    let state = wiimote.state();
    println!("Final state:");
    println!("  Extension: {:?}", state.extension);
    println!("  Battery: {}%", state.battery);
    println!("  Pitch: {:.1}, Roll: {:.1}", state.acc.pitch, state.acc.roll);
    println!("  Nunchuk stick: ({:.2}, {:.2})", state.nunchuk_joy.pos.0, state.nunchuk_joy.pos.1);
    println!(
        "  Reports written to the wire: {}",
        wiimote.transport().writes().len()
    );

    Ok(())
}
