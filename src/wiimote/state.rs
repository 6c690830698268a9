//! Driver-owned sensor state
//!
//! One `DriverState` per physical link, mutated only on the frame-processing
//! path or by command methods. Also hosts the accelerometer normalization and
//! the near-1g orientation fusion.

use crate::wiimote::types::{
    AccelCalibration, Buttons, Extension, IrDot, IrMode, JoystickCalibration, NunchukButtons,
    ReportMode,
};

/// Change threshold gating axis republication
///
/// This is an anti-chatter contract, not an optimization: downstream
/// listeners see at most one event per 0.01 of travel.
pub fn value_changed(old: f32, new: f32) -> bool {
    (new - old).abs() >= 0.01
}

/// Band half-width around 1g (of squared magnitude) accepted for orientation
const NEAR_G_EPSILON: f32 = 0.2;

const RAD_TO_DEG: f32 = 57.2957795;

/// Orientation derived from a near-1g acceleration sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    /// Unit gravity vector
    pub orient: (f32, f32, f32),
    /// Degrees
    pub pitch: f32,
    pub roll: f32,
}

/// Accelerometer state: calibration plus the published axis values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelState {
    pub calib: AccelCalibration,
    /// Published normalized acceleration (g per axis)
    pub accel: (f32, f32, f32),
    /// Published unit gravity vector
    pub orient: (f32, f32, f32),
    /// Published angles, degrees
    pub pitch: f32,
    pub roll: f32,
    pub near_g_streak: u8,
}

impl AccelState {
    /// Normalize a raw sample against the calibration
    ///
    /// `(raw - zero_g) / (one_g - zero_g)` per axis; an axis whose
    /// calibration has not arrived yet (`one_g == zero_g`) reads 0.0.
    pub fn normalize(&self, raw: (u8, u8, u8)) -> (f32, f32, f32) {
        (
            normalize_axis(raw.0, self.calib.x0, self.calib.xg),
            normalize_axis(raw.1, self.calib.y0, self.calib.yg),
            normalize_axis(raw.2, self.calib.z0, self.calib.zg),
        )
    }

    /// Feed one normalized sample into the orientation fusion
    ///
    /// The squared magnitude must sit within the 1g band for two consecutive
    /// samples before an orientation is produced; a single transient outside
    /// the band resets the streak. While gated, the previous orientation
    /// holds.
    pub fn orientation_step(&mut self, accel: (f32, f32, f32)) -> Option<OrientationSample> {
        let (x, y, z) = accel;
        let square_len = x * x + y * y + z * z;
        if !(1.0 - NEAR_G_EPSILON..=1.0 + NEAR_G_EPSILON).contains(&square_len) {
            self.near_g_streak = 0;
            return None;
        }
        self.near_g_streak = self.near_g_streak.saturating_add(1);
        if self.near_g_streak < 2 {
            return None;
        }

        let inv_len = 1.0 / square_len.sqrt();
        let orient = (x * inv_len, y * inv_len, z * inv_len);

        // asin covers only the front hemisphere; the Z sign picks the quadrant
        let mut pitch = -orient.1.asin() * RAD_TO_DEG;
        let mut roll = orient.0.asin() * RAD_TO_DEG;
        if orient.2 < 0.0 {
            pitch = if orient.1 < 0.0 {
                180.0 - pitch
            } else {
                -180.0 - pitch
            };
            roll = if orient.0 < 0.0 {
                -180.0 - roll
            } else {
                180.0 - roll
            };
        }

        Some(OrientationSample {
            orient,
            pitch,
            roll,
        })
    }
}

fn normalize_axis(raw: u8, zero_g: u8, one_g: u8) -> f32 {
    if one_g == zero_g {
        return 0.0;
    }
    (raw as f32 - zero_g as f32) / (one_g as f32 - zero_g as f32)
}

/// Extension joystick state: calibration plus the published position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoystickState {
    pub calib: JoystickCalibration,
    /// Published normalized position, roughly -1.0 to 1.0 per axis
    pub pos: (f32, f32),
}

impl JoystickState {
    /// Normalize a raw axis pair; axes without calibration keep their
    /// previous value
    pub fn normalize(&self, raw: (u8, u8)) -> (f32, f32) {
        let x = if self.calib.max_x != 0 {
            2.0 * (raw.0 as f32 - self.calib.mid_x as f32)
                / (self.calib.max_x as f32 - self.calib.min_x as f32)
        } else {
            self.pos.0
        };
        let y = if self.calib.max_y != 0 {
            2.0 * (raw.1 as f32 - self.calib.mid_y as f32)
                / (self.calib.max_y as f32 - self.calib.min_y as f32)
        } else {
            self.pos.1
        };
        (x, y)
    }
}

/// Complete sensor and output state of one controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverState {
    pub report_mode: ReportMode,
    pub ir_mode: IrMode,
    pub extension: Extension,
    /// Player LED mask, low nibble
    pub led_mask: u8,
    pub rumble: bool,
    /// Battery level, roughly 0..100
    pub battery: u8,
    pub buttons: Buttons,
    pub nunchuk_buttons: NunchukButtons,
    pub acc: AccelState,
    pub nunchuk_acc: AccelState,
    pub nunchuk_joy: JoystickState,
    pub ir_dots: [IrDot; 2],
    /// Pointer position: midpoint of the found IR dots
    pub ir_pointer: (f32, f32),
}

impl DriverState {
    /// Clear extension inputs after removal; calibration is retained so a
    /// re-insert of the same peripheral starts from known values (it is
    /// still re-read for correctness)
    pub fn clear_extension_inputs(&mut self) {
        self.nunchuk_buttons = NunchukButtons::default();
        let nunchuk_calib = self.nunchuk_acc.calib;
        self.nunchuk_acc = AccelState {
            calib: nunchuk_calib,
            ..AccelState::default()
        };
        self.nunchuk_joy.pos = (0.0, 0.0);
    }
}
