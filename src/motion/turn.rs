//! Per-tick turn arithmetic

use crate::config::{
    BASE_CURVE_SPEED, KP_YAW, MIN_CURVE_SPEED, PIVOT_GAIN, PIVOT_MIN_SPEED, PIVOT_SLOWDOWN_DEG, RUNAWAY_FACTOR,
    TICKS_PER_TURN, TURN_BASE_SPEED,
};
use crate::orientation::wrap_degrees;

/// Signed angle from `yaw` to `desired`, shortest way round
pub fn heading_error(desired: f32, yaw: f32) -> f32 {
    wrap_degrees(desired - yaw)
}

/// Wheel speed of a pivot with `error` degrees still to go
pub fn pivot_speed(error: f32) -> i32 {
    let remaining = libm::fabsf(error);
    let speed = ((PIVOT_GAIN * remaining) as i32).clamp(PIVOT_MIN_SPEED, TURN_BASE_SPEED);
    if remaining < PIVOT_SLOWDOWN_DEG {
        ((speed as f32 * remaining / PIVOT_SLOWDOWN_DEG) as i32).clamp(PIVOT_MIN_SPEED, speed)
    } else {
        speed
    }
}

/// Inner wheel speed of a curve with `error` degrees still to go
pub fn curve_inner_speed(error: f32) -> i32 {
    ((BASE_CURVE_SPEED as f32 - libm::fabsf(KP_YAW * error)) as i32).clamp(MIN_CURVE_SPEED, BASE_CURVE_SPEED)
}

/// Wheel tick divergence a pivot of `target_deg` should take
pub fn expected_turn_ticks(target_deg: f32) -> i32 {
    (TICKS_PER_TURN as f32 * (libm::fabsf(target_deg) / 90.0)) as i32
}

/// Divergence past which a pivot is treated as stalled or slipping
pub fn runaway_limit(expected_ticks: i32) -> i32 {
    (expected_ticks as f32 * RUNAWAY_FACTOR) as i32
}
