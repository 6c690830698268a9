//! WiiMote type definitions
//!
//! This module defines the basic data types used throughout the wiimote module,
//! including report/IR modes, extension identity, button sets, calibration data
//! and the events published to the application.

use serde::{Deserialize, Serialize};

use crate::wiimote::constants::*;

/// Data report mode requested from the controller
///
/// Exactly one mode is active at a time and governs how the next incoming
/// data frame is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Buttons only (0x30)
    Buttons,
    /// Buttons and acceleration (0x31)
    ButtonsAccel,
    /// Buttons, acceleration and IR in extended mode (0x33)
    ButtonsAccelIr,
    /// Buttons, acceleration and extension data (0x35)
    ButtonsAccelExt,
    /// Buttons, acceleration, IR in basic mode and extension data (0x37)
    ButtonsAccelIrExt,
}

impl ReportMode {
    /// On-wire mode byte
    pub fn to_byte(self) -> u8 {
        match self {
            ReportMode::Buttons => REPORT_BUTTONS,
            ReportMode::ButtonsAccel => REPORT_BUTTONS_ACCEL,
            ReportMode::ButtonsAccelIr => REPORT_BUTTONS_ACCEL_IR,
            ReportMode::ButtonsAccelExt => REPORT_BUTTONS_ACCEL_EXT,
            ReportMode::ButtonsAccelIrExt => REPORT_BUTTONS_ACCEL_IR_EXT,
        }
    }

    /// The IR mode implied by this report mode
    ///
    /// Every report mode maps to exactly one IR mode; switching the report
    /// mode re-issues the IR enable/disable sequence accordingly.
    pub fn ir_mode(self) -> IrMode {
        match self {
            ReportMode::ButtonsAccelIr => IrMode::Extended,
            ReportMode::ButtonsAccelIrExt => IrMode::Basic,
            _ => IrMode::Off,
        }
    }
}

impl Default for ReportMode {
    fn default() -> Self {
        ReportMode::Buttons
    }
}

/// IR camera mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrMode {
    Off = 0x00,
    Basic = 0x01,
    Extended = 0x03,
    /// Full-resolution mode, unimplemented
    Full = 0x05,
}

impl Default for IrMode {
    fn default() -> Self {
        IrMode::Off
    }
}

/// Identity of the peripheral attached to the extension port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// Extension slot is empty
    None,
    /// An extension is attached but did not enumerate cleanly
    PartiallyInserted,
    /// Nunchuk (joystick + accelerometer + C/Z buttons)
    Nunchuk,
    /// Classic controller (recognized, data decoding unimplemented)
    Classic,
}

impl Extension {
    /// Map a 16-bit type id read from `REG_EXTENSION_TYPE`
    pub fn from_wire_id(id: u16) -> Option<Self> {
        match id {
            EXT_ID_NONE => Some(Extension::None),
            EXT_ID_NUNCHUK => Some(Extension::Nunchuk),
            EXT_ID_CLASSIC => Some(Extension::Classic),
            EXT_ID_PARTIAL => Some(Extension::PartiallyInserted),
            _ => None,
        }
    }
}

impl Default for Extension {
    fn default() -> Self {
        Extension::None
    }
}

/// Named wiimote and extension buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    One,
    Two,
    A,
    B,
    Minus,
    Plus,
    Home,
    Left,
    Right,
    Up,
    Down,
    NunchukC,
    NunchukZ,
}

/// Wiimote button states, decoded from the 16-bit mask at report offset 1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub one: bool,
    pub two: bool,
    pub a: bool,
    pub b: bool,
    pub minus: bool,
    pub plus: bool,
    pub home: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Buttons {
    /// Decode the 16-bit little-endian button mask
    pub fn from_mask(mask: u16) -> Self {
        Self {
            one: mask & BTN_ONE != 0,
            two: mask & BTN_TWO != 0,
            a: mask & BTN_A != 0,
            b: mask & BTN_B != 0,
            minus: mask & BTN_MINUS != 0,
            plus: mask & BTN_PLUS != 0,
            home: mask & BTN_HOME != 0,
            left: mask & BTN_LEFT != 0,
            right: mask & BTN_RIGHT != 0,
            up: mask & BTN_UP != 0,
            down: mask & BTN_DOWN != 0,
        }
    }
}

/// Nunchuk button states (C/Z are active-low on the wire)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NunchukButtons {
    pub c: bool,
    pub z: bool,
}

/// Continuous output value published by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    AccX,
    AccY,
    AccZ,
    OrientX,
    OrientY,
    OrientZ,
    Pitch,
    Roll,
    PointerX,
    PointerY,
    NunchukAccX,
    NunchukAccY,
    NunchukAccZ,
    NunchukOrientX,
    NunchukOrientY,
    NunchukOrientZ,
    NunchukPitch,
    NunchukRoll,
    NunchukJoyX,
    NunchukJoyY,
}

/// Event published to the application over the driver's event channel
///
/// Button events fire exactly once per transition; axis events are gated by
/// the 0.01 change threshold (see `state::value_changed`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WiimoteEvent {
    ButtonPressed(Button),
    ButtonReleased(Button),
    AxisChanged { axis: Axis, value: f32 },
    ExtensionChanged(Extension),
    StatusUpdated { battery: u8, led_mask: u8 },
    Connected,
    Disconnected,
}

/// Per-axis accelerometer calibration: raw byte at rest (zero g) and raw
/// byte at exactly one g
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelCalibration {
    pub x0: u8,
    pub y0: u8,
    pub z0: u8,
    pub xg: u8,
    pub yg: u8,
    pub zg: u8,
}

/// Joystick calibration: raw min / center / max per axis
///
/// `max_x == 0` / `max_y == 0` mean the calibration block has not been read
/// yet; normalization is skipped for that axis until it arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoystickCalibration {
    pub min_x: u8,
    pub mid_x: u8,
    pub max_x: u8,
    pub min_y: u8,
    pub mid_y: u8,
    pub max_y: u8,
}

/// One tracked IR dot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IrDot {
    /// The dot was found in the current frame
    pub found: bool,
    /// Raw sensor coordinates (10-bit basic, up to 12-bit extended)
    pub raw_x: u16,
    pub raw_y: u16,
    /// Dot size, extended mode only
    pub size: u8,
    /// Normalized position; X is mirrored to match pointer handedness
    pub x: f32,
    pub y: f32,
}
