//! Wall-centring for straight-line driving
//!
//! [`LaneKeeper`] holds the filter state of one `drive_forward` call and
//! turns one control tick's sensor snapshot into a pair of wheel commands.
//! It has no I/O of its own.

use crate::config::{
    CENTER_ALPHA, CENTER_MM_DEFAULT, CORNER_THRESH, DE_BAD_THRESH, DE_MAX, E_BAD_THRESH, FRONT_WALL_THRESH, KD_SIDE,
    KENC, KP_SIDE, MIN_FWD_SPEED, MOTOR_R_GAIN, SLOW_SCALE_BAD, SLOW_SCALE_CORNER, SLOW_SCALE_TRACKED, SPEED_MAX,
    SPEED_MIN, TOF_ALPHA, TOF_ALPHA_CORNER,
};
use crate::encoder::WheelTicks;
use crate::range::Reading;

/// Signed speed command for both wheels, already clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelCommand {
    pub left: i16,
    pub right: i16,
}

impl WheelCommand {
    /// Clamp raw commands into the motor range
    pub fn clamped(left: i32, right: i32) -> Self {
        Self {
            left: left.clamp(SPEED_MIN, SPEED_MAX) as i16,
            right: right.clamp(SPEED_MIN, SPEED_MAX) as i16,
        }
    }
}

fn low_pass(previous: f32, current: f32, alpha: f32) -> f32 {
    previous + alpha * (current - previous)
}

pub struct LaneKeeper {
    base_speed: i32,
    left_filtered: f32,
    right_filtered: f32,
    left_prev: f32,
    right_prev: f32,
    /// Believed distance from a side sensor to the corridor centre line
    center_mm: f32,
    prev_error: f32,
    initialized: bool,
    corner: bool,
}

impl LaneKeeper {
    pub fn new(base_speed: i32) -> Self {
        Self {
            base_speed,
            left_filtered: 0.0,
            right_filtered: 0.0,
            left_prev: 0.0,
            right_prev: 0.0,
            center_mm: CENTER_MM_DEFAULT,
            prev_error: 0.0,
            initialized: false,
            corner: false,
        }
    }

    pub fn center_mm(&self) -> f32 {
        self.center_mm
    }

    /// Whether the last update saw a corner
    pub fn at_corner(&self) -> bool {
        self.corner
    }

    /// Run one control tick
    pub fn update(&mut self, left: Reading, right: Reading, front: Reading, ticks: WheelTicks) -> WheelCommand {
        let left_mm = left.mm().map(f32::from);
        let right_mm = right.mm().map(f32::from);
        let left_valid = left_mm.is_some();
        let right_valid = right_mm.is_some();
        let front_close = front.mm().is_some_and(|mm| f32::from(mm) <= FRONT_WALL_THRESH);

        // A side reading that jumps marks a corner
        let jumped = |raw: Option<f32>, prev: f32| raw.is_some_and(|mm| libm::fabsf(mm - prev) > CORNER_THRESH);
        let corner = self.initialized && (jumped(left_mm, self.left_prev) || jumped(right_mm, self.right_prev));
        self.corner = corner;
        if let Some(mm) = left_mm {
            self.left_prev = mm;
        }
        if let Some(mm) = right_mm {
            self.right_prev = mm;
        }

        if !self.initialized {
            if let Some(mm) = left_mm {
                self.left_filtered = mm;
            }
            if let Some(mm) = right_mm {
                self.right_filtered = mm;
            }
            self.initialized = true;
        } else {
            let alpha = if corner { TOF_ALPHA_CORNER } else { TOF_ALPHA };
            if let Some(mm) = left_mm {
                self.left_filtered = low_pass(self.left_filtered, mm, alpha);
            }
            if let Some(mm) = right_mm {
                self.right_filtered = low_pass(self.right_filtered, mm, alpha);
            }
        }

        let both_sides = left_valid && right_valid;
        let any_side = left_valid || right_valid;
        let error = if front_close && any_side {
            if left_valid {
                self.left_filtered - self.center_mm
            } else {
                self.center_mm - self.right_filtered
            }
        } else if both_sides {
            self.center_mm = low_pass(
                self.center_mm,
                (self.left_filtered + self.right_filtered) * 0.5,
                CENTER_ALPHA,
            );
            self.left_filtered - self.right_filtered
        } else if left_valid {
            self.left_filtered - self.center_mm
        } else if right_valid {
            self.center_mm - self.right_filtered
        } else {
            0.0
        };

        let derivative = (error - self.prev_error).clamp(-DE_MAX, DE_MAX);
        self.prev_error = error;

        let slow_scale = if corner || (front_close && any_side) {
            SLOW_SCALE_CORNER
        } else if libm::fabsf(error) > E_BAD_THRESH || libm::fabsf(derivative) > DE_BAD_THRESH {
            SLOW_SCALE_BAD
        } else if both_sides {
            let settled = 1.0 - (libm::fabsf(error) / E_BAD_THRESH).clamp(0.0, 1.0);
            SLOW_SCALE_TRACKED + (1.0 - SLOW_SCALE_TRACKED) * settled
        } else {
            1.0
        };
        let forward = ((self.base_speed as f32 * slow_scale) as i32).max(MIN_FWD_SPEED) as f32;

        let (kp, kd) = if corner {
            (KP_SIDE * 0.5, KD_SIDE * 0.5)
        } else {
            (KP_SIDE, KD_SIDE)
        };
        let encoder_term = KENC * ticks.difference() as f32;
        let side_term = if any_side { kp * error + kd * derivative } else { 0.0 };
        let correction = encoder_term + side_term;

        WheelCommand::clamped(
            (forward - correction) as i32,
            ((forward + correction) * MOTOR_R_GAIN) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: Reading = Reading::Invalid;

    fn ticks(left: i32, right: i32) -> WheelTicks {
        WheelTicks { left, right }
    }

    fn command(left: i16, right: i16) -> WheelCommand {
        WheelCommand { left, right }
    }

    #[test]
    fn centred_robot_drives_at_full_speed() {
        let mut lane = LaneKeeper::new(175);
        let cmd = lane.update(Reading::Valid(100), Reading::Valid(100), OPEN, ticks(0, 0));
        assert_eq!(cmd, command(175, 192));
    }

    #[test]
    fn robot_near_left_wall_steers_right_and_slows() {
        let mut lane = LaneKeeper::new(175);
        let cmd = lane.update(Reading::Valid(80), Reading::Valid(120), OPEN, ticks(0, 0));
        // error -40, derivative clamped to -15, speed floored at 140
        assert_eq!(cmd, command(225, 60));
    }

    #[test]
    fn side_jump_is_a_corner() {
        let mut lane = LaneKeeper::new(175);
        lane.update(Reading::Valid(100), Reading::Valid(100), OPEN, ticks(0, 0));
        assert!(!lane.at_corner());

        let cmd = lane.update(Reading::Valid(130), Reading::Valid(100), OPEN, ticks(0, 0));
        assert!(lane.at_corner());
        assert_eq!(cmd, command(128, 167));
    }

    #[test]
    fn without_walls_only_the_encoders_steer() {
        let mut lane = LaneKeeper::new(175);
        let cmd = lane.update(OPEN, OPEN, OPEN, ticks(10, 4));
        assert_eq!(cmd, command(169, 199));
    }

    #[test]
    fn single_wall_with_front_wall_ahead() {
        let mut lane = LaneKeeper::new(175);
        let cmd = lane.update(Reading::Valid(70), OPEN, Reading::Valid(60), ticks(0, 0));
        assert_eq!(cmd, command(215, 71));
    }

    #[test]
    fn corridor_width_adapts_slowly() {
        let mut lane = LaneKeeper::new(175);
        lane.update(Reading::Valid(90), Reading::Valid(90), OPEN, ticks(0, 0));
        assert!((lane.center_mm() - 99.5).abs() < 1e-4);

        for _ in 0..200 {
            lane.update(Reading::Valid(90), Reading::Valid(90), OPEN, ticks(0, 0));
        }
        assert!((lane.center_mm() - 90.0).abs() < 0.1);
    }

    #[test]
    fn commands_stay_in_motor_range() {
        let mut lane = LaneKeeper::new(225);
        let cmd = lane.update(OPEN, OPEN, OPEN, ticks(1000, 0));
        assert_eq!(cmd, command(-255, 255));

        let cmd = lane.update(Reading::Valid(150), Reading::Valid(1), OPEN, ticks(-1000, 0));
        assert_eq!(cmd, command(255, -255));
    }
}
