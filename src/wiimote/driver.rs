//! WiiMote driver
//!
//! This module owns one controller link end to end:
//! - Frame dispatch into the sensor decoders
//! - The extension negotiation state machine
//! - Command methods (LEDs, rumble, report mode, IR, calibration)
//! - Event publication to the application
//!
//! Everything runs on the host's frame-processing path; one frame is decoded
//! to completion before control returns, and nothing here blocks.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{Config, DriverSettings};
use crate::transport::{Transport, TransportError};
use crate::wiimote::constants::*;
use crate::wiimote::decrypt::decrypt_buffer;
use crate::wiimote::memory::{self, MemoryReply, PendingRead, ReadPurpose, TransactionQueue};
use crate::wiimote::report::{self, DecodedReport, OutgoingReport};
use crate::wiimote::state::{value_changed, AccelState, DriverState};
use crate::wiimote::types::{
    AccelCalibration, Axis, Button, Buttons, Extension, IrMode, JoystickCalibration,
    NunchukButtons, ReportMode, WiimoteEvent,
};

#[derive(Debug, Error)]
pub enum DriverError {
    /// A memory reply that does not belong to the pending read; dropped,
    /// never fatal
    #[error("malformed memory reply: {0}")]
    MalformedMemoryReply(&'static str),

    /// A transport-level write failure, surfaced to the caller of the
    /// triggering command and not retried here
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Driver for one WiiMote link
///
/// Create it when the link comes up, feed it every incoming frame, and read
/// decoded state through [`state`](Self::state) or the event channel.
pub struct Wiimote<T: Transport> {
    transport: T,
    state: DriverState,
    memory: TransactionQueue,
    settings: DriverSettings,
    events: Sender<WiimoteEvent>,
    receiver: Receiver<WiimoteEvent>,
}

impl<T: Transport> Wiimote<T> {
    /// Create a driver over an open transport
    pub fn new(transport: T, config: &Config) -> Self {
        let settings = config.driver.clone();
        let (events, receiver) = bounded(settings.event_capacity);
        Self {
            transport,
            state: DriverState::default(),
            memory: TransactionQueue::new(),
            settings,
            events,
            receiver,
        }
    }

    /// Current decoded state
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// A receiver for the driver's event stream
    pub fn events(&self) -> Receiver<WiimoteEvent> {
        self.receiver.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Bring the controller up after the link connected
    pub fn handle_connect(&mut self) -> Result<(), DriverError> {
        info!("Link established, starting bring-up");
        emit(&self.events, WiimoteEvent::Connected);

        self.send_status_request()?;
        self.calibrate()?;
        self.set_report_mode(self.settings.report_mode, self.settings.continuous)?;
        self.set_leds(self.settings.led_mask)?;

        Ok(())
    }

    /// Tear down after the link closed
    pub fn handle_disconnect(&mut self) {
        info!("Link closed");
        self.memory.clear();
        emit(&self.events, WiimoteEvent::Disconnected);
    }

    /// Process one incoming frame to completion
    ///
    /// Frames that fail to decode are logged and dropped (the stream
    /// continues); only transport write failures triggered by the frame
    /// propagate.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<(), DriverError> {
        let decoded = match report::decode(frame) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!("Dropping frame: {}", err);
                return Ok(());
            }
        };

        match decoded {
            DecodedReport::Buttons { buttons } => {
                self.update_buttons(buttons);
            }
            DecodedReport::ButtonsAccel { buttons, accel } => {
                self.update_buttons(buttons);
                self.update_accel(accel);
            }
            DecodedReport::ButtonsAccelIr {
                buttons,
                accel,
                ir,
            } => {
                self.update_buttons(buttons);
                self.update_accel(accel);
                self.update_ir(&ir);
            }
            DecodedReport::ButtonsAccelExt {
                buttons,
                accel,
                extension,
            } => {
                self.update_buttons(buttons);
                self.update_accel(accel);
                self.update_extension(&extension);
            }
            DecodedReport::ButtonsAccelIrExt {
                buttons,
                accel,
                ir,
                extension,
            } => {
                self.update_buttons(buttons);
                self.update_accel(accel);
                self.update_ir(&ir);
                self.update_extension(&extension);
            }
            DecodedReport::MemoryData(reply) => {
                self.update_buttons(reply.buttons);
                match self.handle_memory_reply(&reply) {
                    Ok(()) => {}
                    Err(DriverError::MalformedMemoryReply(reason)) => {
                        debug!("Dropping memory reply: {}", reason);
                    }
                    Err(err) => return Err(err),
                }
            }
            DecodedReport::Status {
                buttons,
                led_mask,
                battery_raw,
                extension_present,
            } => {
                self.update_buttons(buttons);
                self.handle_status(led_mask, battery_raw, extension_present)?;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Set the player LEDs (low nibble of `mask`)
    pub fn set_leds(&mut self, mask: u8) -> Result<(), DriverError> {
        self.state.led_mask = mask & 0x0f;
        self.send(report::set_leds(self.state.led_mask, self.state.rumble))
    }

    /// Switch the rumble motor on or off
    ///
    /// The rumble flag has no command of its own; it rides along bit 0 of
    /// every outgoing report. A status request delivers it immediately.
    pub fn set_rumble(&mut self, on: bool) -> Result<(), DriverError> {
        self.state.rumble = on;
        self.send_status_request()
    }

    /// Set the data report mode; the implied IR mode is applied first
    pub fn set_report_mode(
        &mut self,
        mode: ReportMode,
        continuous: bool,
    ) -> Result<(), DriverError> {
        self.state.report_mode = mode;
        self.set_ir_mode(mode.ir_mode())?;
        self.send(report::set_report_mode(mode, continuous, self.state.rumble))
    }

    /// Enable or disable the IR camera
    ///
    /// Enabling runs the documented sequence: pixel clock on, chip on, camera
    /// enable register, both sensitivity blocks, mode register.
    pub fn set_ir_mode(&mut self, mode: IrMode) -> Result<(), DriverError> {
        self.state.ir_mode = mode;

        if mode != IrMode::Off {
            self.send(report::ir_clock_enable(true, self.state.rumble))?;
            self.send(report::ir_chip_enable(true, self.state.rumble))?;

            self.write_memory_byte(REG_IR, 0x08)?;
            self.write_memory(REG_IR_SENSITIVITY_1, &IR_SENSITIVITY_BLOCK_1)?;
            self.write_memory(REG_IR_SENSITIVITY_2, &IR_SENSITIVITY_BLOCK_2)?;
            self.write_memory_byte(REG_IR_MODE, mode as u8)?;
        } else {
            self.send(report::ir_clock_enable(false, self.state.rumble))?;
            self.send(report::ir_chip_enable(false, self.state.rumble))?;
        }

        Ok(())
    }

    /// Re-issue the accelerometer calibration read
    pub fn calibrate(&mut self) -> Result<(), DriverError> {
        self.queue_read(REG_CALIBRATION, 7, ReadPurpose::Calibration)
    }

    /// Ask the controller for a status report
    pub fn send_status_request(&mut self) -> Result<(), DriverError> {
        self.send(report::status_request(self.state.rumble))
    }

    fn write_memory(&mut self, address: u32, payload: &[u8]) -> Result<(), DriverError> {
        match memory::write_memory(address, payload, self.state.rumble) {
            Some(outgoing) => self.send(outgoing),
            None => {
                warn!("Memory write to 0x{:06x} exceeds 16 bytes, ignored", address);
                Ok(())
            }
        }
    }

    fn write_memory_byte(&mut self, address: u32, byte: u8) -> Result<(), DriverError> {
        self.send(memory::write_memory_byte(address, byte, self.state.rumble))
    }

    /// Queue a memory read; transmitted immediately if the wire is free
    fn queue_read(
        &mut self,
        address: u32,
        size: u16,
        purpose: ReadPurpose,
    ) -> Result<(), DriverError> {
        let read = PendingRead {
            address,
            size,
            purpose,
        };
        if let Some(next) = self.memory.enqueue(read) {
            self.send(memory::read_memory(next.address, next.size, self.state.rumble))?;
        }
        Ok(())
    }

    fn send(&mut self, outgoing: OutgoingReport) -> Result<(), DriverError> {
        self.transport.write(&outgoing)?;
        Ok(())
    }

    // ========================================================================
    // Status and memory replies
    // ========================================================================

    fn handle_status(
        &mut self,
        led_mask: u8,
        battery_raw: u8,
        extension_present: bool,
    ) -> Result<(), DriverError> {
        self.state.battery = battery_raw / 2;
        self.state.led_mask = led_mask;
        emit(
            &self.events,
            WiimoteEvent::StatusUpdated {
                battery: self.state.battery,
                led_mask: self.state.led_mask,
            },
        );

        if extension_present
            && matches!(
                self.state.extension,
                Extension::None | Extension::PartiallyInserted
            )
        {
            // fire-and-forget init write, then enumerate the type
            debug!("Extension present, starting negotiation");
            self.write_memory_byte(REG_EXTENSION_INIT, 0x00)?;
            self.queue_read(REG_EXTENSION_TYPE, 2, ReadPurpose::ExtensionType)?;
        } else if !extension_present && self.state.extension != Extension::None {
            info!("Extension removed");
            self.state.extension = Extension::None;
            self.state.clear_extension_inputs();
            emit(&self.events, WiimoteEvent::ExtensionChanged(Extension::None));
        }

        Ok(())
    }

    fn handle_memory_reply(&mut self, reply: &MemoryReply) -> Result<(), DriverError> {
        if reply.error & 0x08 != 0 {
            return Err(DriverError::MalformedMemoryReply("invalid read address"));
        }
        if reply.error & 0x07 != 0 {
            return Err(DriverError::MalformedMemoryReply(
                "read from a write-only register",
            ));
        }

        let pending = match self.memory.current() {
            Some(pending) => pending,
            None => return Err(DriverError::MalformedMemoryReply("no read outstanding")),
        };
        if reply.address != pending.address_lo() {
            return Err(DriverError::MalformedMemoryReply(
                "address does not match the pending read",
            ));
        }
        if reply.size != pending.expected_reply_size() {
            return Err(DriverError::MalformedMemoryReply(
                "size does not match the pending read",
            ));
        }

        let _ = self.memory.complete();
        match pending.purpose {
            ReadPurpose::Calibration => self.read_calibration(reply),
            ReadPurpose::ExtensionType => self.read_extension_type(reply)?,
            ReadPurpose::ExtensionCalibration => self.read_extension_calibration(reply)?,
        }

        if let Some(next) = self.memory.next_to_transmit() {
            self.send(memory::read_memory(next.address, next.size, self.state.rumble))?;
        }

        Ok(())
    }

    fn read_calibration(&mut self, reply: &MemoryReply) {
        let d = &reply.data;
        self.state.acc.calib = AccelCalibration {
            x0: d[0],
            y0: d[1],
            z0: d[2],
            xg: d[4],
            yg: d[5],
            zg: d[6],
        };
        info!("Accelerometer calibration received");
    }

    fn read_extension_type(&mut self, reply: &MemoryReply) -> Result<(), DriverError> {
        let id = u16::from_le_bytes([reply.data[0], reply.data[1]]);

        match Extension::from_wire_id(id) {
            Some(Extension::Nunchuk) if self.state.extension != Extension::Nunchuk => {
                info!("Nunchuk registered");
                self.queue_read(
                    REG_EXTENSION_CALIBRATION,
                    16,
                    ReadPurpose::ExtensionCalibration,
                )?;
                self.state.extension = Extension::Nunchuk;
                emit(
                    &self.events,
                    WiimoteEvent::ExtensionChanged(Extension::Nunchuk),
                );
            }
            Some(Extension::Classic) if self.state.extension != Extension::Classic => {
                info!("Classic controller registered");
                self.queue_read(
                    REG_EXTENSION_CALIBRATION,
                    16,
                    ReadPurpose::ExtensionCalibration,
                )?;
                self.state.extension = Extension::Classic;
                emit(
                    &self.events,
                    WiimoteEvent::ExtensionChanged(Extension::Classic),
                );
            }
            Some(Extension::PartiallyInserted)
                if self.state.extension != Extension::PartiallyInserted =>
            {
                // the slot may settle; poke it again
                warn!("Extension partially inserted");
                self.state.extension = Extension::PartiallyInserted;
                emit(
                    &self.events,
                    WiimoteEvent::ExtensionChanged(Extension::PartiallyInserted),
                );
                self.send_status_request()?;
            }
            _ => {
                debug!("Unknown or unchanged extension type 0x{:04x}", id);
            }
        }

        Ok(())
    }

    fn read_extension_calibration(&mut self, reply: &MemoryReply) -> Result<(), DriverError> {
        let mut data = reply.data;
        decrypt_buffer(&mut data);

        match self.state.extension {
            Extension::Nunchuk => {
                self.state.nunchuk_acc.calib = AccelCalibration {
                    x0: data[0],
                    y0: data[1],
                    z0: data[2],
                    xg: data[4],
                    yg: data[5],
                    zg: data[6],
                };
                self.state.nunchuk_joy.calib = JoystickCalibration {
                    max_x: data[8],
                    min_x: data[9],
                    mid_x: data[10],
                    max_y: data[11],
                    min_y: data[12],
                    mid_y: data[13],
                };
                info!("Nunchuk calibration received");
            }
            Extension::Classic => {
                // TODO: map the classic controller calibration block once its
                // payload decoding lands
                debug!("Classic controller calibration ignored");
            }
            _ => {}
        }

        // some firmwares only start extension reports once the mode is
        // re-armed after calibration
        self.set_report_mode(self.state.report_mode, self.settings.continuous)
    }

    // ========================================================================
    // Sensor decoders
    // ========================================================================

    fn update_buttons(&mut self, mask: u16) {
        let next = Buttons::from_mask(mask);
        let prev = self.state.buttons;
        self.state.buttons = next;

        button_edge(&self.events, Button::One, prev.one, next.one);
        button_edge(&self.events, Button::Two, prev.two, next.two);
        button_edge(&self.events, Button::A, prev.a, next.a);
        button_edge(&self.events, Button::B, prev.b, next.b);
        button_edge(&self.events, Button::Minus, prev.minus, next.minus);
        button_edge(&self.events, Button::Plus, prev.plus, next.plus);
        button_edge(&self.events, Button::Home, prev.home, next.home);
        button_edge(&self.events, Button::Left, prev.left, next.left);
        button_edge(&self.events, Button::Right, prev.right, next.right);
        button_edge(&self.events, Button::Up, prev.up, next.up);
        button_edge(&self.events, Button::Down, prev.down, next.down);
    }

    fn update_accel(&mut self, raw: [u8; 3]) {
        update_accel_common(
            &self.events,
            &mut self.state.acc,
            (raw[0], raw[1], raw[2]),
            &PRIMARY_ACCEL_AXES,
        );
    }

    fn update_ir(&mut self, ir: &[u8]) {
        let mut dots = self.state.ir_dots;

        match self.state.ir_mode {
            IrMode::Basic => {
                if ir.len() < 5 {
                    return;
                }
                dots[0].found = !(ir[0] == 0xff && ir[1] == 0xff);
                dots[1].found = !(ir[3] == 0xff && ir[4] == 0xff);
                if dots[1].found {
                    dots[1].raw_x = ir[3] as u16 | ((ir[2] as u16) & 0x03) << 8;
                    dots[1].raw_y = ir[4] as u16 | ((ir[2] as u16 >> 2) & 0x03) << 8;
                }
                dots[0].size = 0;
                dots[1].size = 0;
            }
            IrMode::Extended => {
                if ir.len() < 6 {
                    return;
                }
                dots[0].found = !(ir[0] == 0xff && ir[1] == 0xff && ir[2] == 0xff);
                dots[1].found = !(ir[3] == 0xff && ir[4] == 0xff && ir[5] == 0xff);
                if dots[0].found {
                    dots[0].size = ir[2] & 0x0f;
                }
                if dots[1].found {
                    dots[1].raw_x = ir[3] as u16 | ((ir[5] as u16 >> 4) & 0x03) << 8;
                    dots[1].raw_y = ir[4] as u16 | ((ir[5] as u16 >> 6) & 0x03) << 8;
                    dots[1].size = ir[5] & 0x0f;
                }
            }
            // Full mode is unimplemented; nothing to decode when off
            IrMode::Off | IrMode::Full => return,
        }

        // dot 0 shares its high-order bits in byte 2 across both modes
        if dots[0].found {
            dots[0].raw_x = ir[0] as u16 | ((ir[2] as u16 >> 4) & 0x03) << 8;
            dots[0].raw_y = ir[1] as u16 | ((ir[2] as u16 >> 6) & 0x03) << 8;
            dots[0].x = 1.0 - dots[0].raw_x as f32 / IR_MAX_X as f32;
            dots[0].y = dots[0].raw_y as f32 / IR_MAX_Y as f32;
        }
        if dots[1].found {
            dots[1].x = 1.0 - dots[1].raw_x as f32 / IR_MAX_X as f32;
            dots[1].y = dots[1].raw_y as f32 / IR_MAX_Y as f32;
        }

        // pointer: midpoint of the found dots, single dot as-is, held when
        // nothing is tracked (stale dot data never enters the midpoint)
        let pointer = match (dots[0].found, dots[1].found) {
            (true, true) => Some((
                (dots[0].x + dots[1].x) / 2.0,
                (dots[0].y + dots[1].y) / 2.0,
            )),
            (true, false) => Some((dots[0].x, dots[0].y)),
            (false, true) => Some((dots[1].x, dots[1].y)),
            (false, false) => None,
        };
        if let Some((x, y)) = pointer {
            publish_axis(
                &self.events,
                Axis::PointerX,
                &mut self.state.ir_pointer.0,
                x,
            );
            publish_axis(
                &self.events,
                Axis::PointerY,
                &mut self.state.ir_pointer.1,
                y,
            );
        }

        self.state.ir_dots = dots;
    }

    fn update_extension(&mut self, data: &[u8]) {
        match self.state.extension {
            Extension::Nunchuk => self.update_nunchuk(data),
            Extension::Classic => {
                // recognized but undecoded; see DESIGN.md
            }
            Extension::None | Extension::PartiallyInserted => {}
        }
    }

    fn update_nunchuk(&mut self, data: &[u8]) {
        if data.len() < 6 {
            return;
        }

        // C/Z are active-low
        let next = NunchukButtons {
            c: data[5] & BTN_NUNCHUK_C == 0,
            z: data[5] & BTN_NUNCHUK_Z == 0,
        };
        let prev = self.state.nunchuk_buttons;
        self.state.nunchuk_buttons = next;
        button_edge(&self.events, Button::NunchukC, prev.c, next.c);
        button_edge(&self.events, Button::NunchukZ, prev.z, next.z);

        update_accel_common(
            &self.events,
            &mut self.state.nunchuk_acc,
            (data[2], data[3], data[4]),
            &NUNCHUK_ACCEL_AXES,
        );

        let (x, y) = self.state.nunchuk_joy.normalize((data[0], data[1]));
        publish_axis(
            &self.events,
            Axis::NunchukJoyX,
            &mut self.state.nunchuk_joy.pos.0,
            x,
        );
        publish_axis(
            &self.events,
            Axis::NunchukJoyY,
            &mut self.state.nunchuk_joy.pos.1,
            y,
        );
    }
}

// ============================================================================
// Publication helpers
// ============================================================================

struct AccelAxes {
    acc: [Axis; 3],
    orient: [Axis; 3],
    pitch: Axis,
    roll: Axis,
}

const PRIMARY_ACCEL_AXES: AccelAxes = AccelAxes {
    acc: [Axis::AccX, Axis::AccY, Axis::AccZ],
    orient: [Axis::OrientX, Axis::OrientY, Axis::OrientZ],
    pitch: Axis::Pitch,
    roll: Axis::Roll,
};

const NUNCHUK_ACCEL_AXES: AccelAxes = AccelAxes {
    acc: [Axis::NunchukAccX, Axis::NunchukAccY, Axis::NunchukAccZ],
    orient: [
        Axis::NunchukOrientX,
        Axis::NunchukOrientY,
        Axis::NunchukOrientZ,
    ],
    pitch: Axis::NunchukPitch,
    roll: Axis::NunchukRoll,
};

fn update_accel_common(
    events: &Sender<WiimoteEvent>,
    acc: &mut AccelState,
    raw: (u8, u8, u8),
    axes: &AccelAxes,
) {
    let fresh = acc.normalize(raw);
    publish_axis(events, axes.acc[0], &mut acc.accel.0, fresh.0);
    publish_axis(events, axes.acc[1], &mut acc.accel.1, fresh.1);
    publish_axis(events, axes.acc[2], &mut acc.accel.2, fresh.2);

    // orientation only moves on a sustained near-1g signal
    if let Some(sample) = acc.orientation_step(fresh) {
        publish_axis(events, axes.orient[0], &mut acc.orient.0, sample.orient.0);
        publish_axis(events, axes.orient[1], &mut acc.orient.1, sample.orient.1);
        publish_axis(events, axes.orient[2], &mut acc.orient.2, sample.orient.2);
        publish_axis(events, axes.pitch, &mut acc.pitch, sample.pitch);
        publish_axis(events, axes.roll, &mut acc.roll, sample.roll);
    }
}

/// Store and publish an axis value if it moved past the chatter threshold
fn publish_axis(events: &Sender<WiimoteEvent>, axis: Axis, slot: &mut f32, value: f32) {
    if value_changed(*slot, value) {
        *slot = value;
        emit(events, WiimoteEvent::AxisChanged { axis, value });
    }
}

/// Publish exactly one event per button transition
fn button_edge(events: &Sender<WiimoteEvent>, button: Button, was: bool, is: bool) {
    if was != is {
        let event = if is {
            WiimoteEvent::ButtonPressed(button)
        } else {
            WiimoteEvent::ButtonReleased(button)
        };
        emit(events, event);
    }
}

fn emit(events: &Sender<WiimoteEvent>, event: WiimoteEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => warn!("Event channel full, dropping {:?}", event),
        Err(TrySendError::Disconnected(_)) => {}
    }
}
