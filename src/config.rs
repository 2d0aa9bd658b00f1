//! Run configuration and tuning constants
//!
//! The numeric gains and thresholds below were tuned on the robot and the
//! control loops depend on their exact values. Change them only together
//! with a test drive.
//!
//! [`RunConfig`] carries the choices a user makes between runs (speed
//! profile, turn strategy, goal cell). It is owned by the run controller
//! and passed by reference into the explorer and the motion controller.

// ---------------------------------------------------------------------------
// Maze geometry
// ---------------------------------------------------------------------------

/// Maze width in cells
pub const MAZE_WIDTH: usize = 16;
/// Maze height in cells
pub const MAZE_HEIGHT: usize = 16;

// ---------------------------------------------------------------------------
// Control loop timing and odometry
// ---------------------------------------------------------------------------

/// Control period of every motion loop
pub const LOOP_DT_MS: u64 = 1;
/// Encoder ticks for one cell at the medium profile
pub const TICKS_PER_CELL: i32 = 440;
/// Ticks taken off a cell at the fast profile (the robot coasts further)
pub const TICK_FAST: i32 = 30;
/// Wheel tick divergence expected for a 90° pivot
pub const TICKS_PER_TURN: i32 = 125;

// ---------------------------------------------------------------------------
// Motor command range and base speeds
// ---------------------------------------------------------------------------

pub const SPEED_MEDIUM: i32 = 175;
pub const SPEED_FAST: i32 = 225;
pub const SPEED_MIN: i32 = -255;
pub const SPEED_MAX: i32 = 255;

/// Ceiling of the pivot turn speed
pub const TURN_BASE_SPEED: i32 = 150;

/// Right motor runs slower than the left for the same command
pub const MOTOR_R_GAIN: f32 = 1.10;

// ---------------------------------------------------------------------------
// Range sensors
// ---------------------------------------------------------------------------

/// Largest distance (mm) a range sensor reports as valid
pub const SENSOR_FRONT_LIMIT: u8 = 150;
/// Both side readings at or below this start a run (hand wave)
pub const SENSOR_SIDE_LIMIT: u8 = 45;
/// Pause between samples of an averaged reading
pub const RANGE_AVERAGE_INTERVAL_MS: u64 = 5;
/// Samples per averaged reading used at run start
pub const RANGE_AVERAGE_SAMPLES: u8 = 3;

// ---------------------------------------------------------------------------
// Straight-line drive
// ---------------------------------------------------------------------------

/// Forward command floor to avoid stalling
pub const MIN_FWD_SPEED: i32 = 140;
/// Low-pass smoothing of side readings
pub const TOF_ALPHA: f32 = 0.5;
/// Low-pass smoothing of side readings while passing a corner
pub const TOF_ALPHA_CORNER: f32 = 0.2;
/// Proportional gain on lateral error (per mm)
pub const KP_SIDE: f32 = 1.0;
/// Derivative gain on lateral error (per mm per tick)
pub const KD_SIDE: f32 = 3.0;
/// Encoder balance gain (per tick of difference)
pub const KENC: f32 = 1.0;
/// Lateral error considered large (mm)
pub const E_BAD_THRESH: f32 = 12.0;
/// Lateral error rate considered large (mm per tick)
pub const DE_BAD_THRESH: f32 = 20.0;
/// Initial side distance to the corridor centre line (mm)
pub const CENTER_MM_DEFAULT: f32 = 100.0;
/// Adaptation rate of the believed corridor half-width
pub const CENTER_ALPHA: f32 = 0.05;
/// A valid front reading at or below this means a wall is imminent (mm)
pub const FRONT_WALL_THRESH: f32 = 80.0;
/// Side reading jump that marks a corner (mm)
pub const CORNER_THRESH: f32 = 20.0;
/// Clamp of the lateral error derivative (mm per tick)
pub const DE_MAX: f32 = 15.0;
/// Speed scale while cornering or approaching a front wall
pub const SLOW_SCALE_CORNER: f32 = 0.5;
/// Speed scale while the lateral error is large
pub const SLOW_SCALE_BAD: f32 = 0.55;
/// Lowest speed scale of the blend while both walls are tracked
pub const SLOW_SCALE_TRACKED: f32 = 0.85;
/// No front-wall stop during the first part of a drive
pub const FRONT_STOP_COOLDOWN_MS: u64 = 500;
/// Front-wall stopping distance at the medium profile (mm)
pub const FRONT_STOP_MEDIUM_MM: u8 = 90;
/// Front-wall stopping distance at the fast profile (mm)
pub const FRONT_STOP_FAST_MM: u8 = 150;

// ---------------------------------------------------------------------------
// Pivot turn
// ---------------------------------------------------------------------------

/// Requested turns smaller than this are ignored (degrees)
pub const MIN_TURN_DEG: f32 = 0.1;
/// Pivot completes when the heading error drops below this (degrees)
pub const PIVOT_EPSILON_DEG: f32 = 0.1;
/// Pivot speed per degree of heading error
pub const PIVOT_GAIN: f32 = 2.0;
/// Pivot speed floor
pub const PIVOT_MIN_SPEED: i32 = 100;
/// Below this heading error the pivot speed is scaled down (degrees)
pub const PIVOT_SLOWDOWN_DEG: f32 = 45.0;
/// Right wheel boost during a pivot
pub const PIVOT_RIGHT_GAIN: f32 = 1.2;
/// Abort a pivot when wheel divergence exceeds this multiple of the expected ticks
pub const RUNAWAY_FACTOR: f32 = 1.2;

// ---------------------------------------------------------------------------
// Curve turn
// ---------------------------------------------------------------------------

/// Inner wheel reduction per degree of heading error
pub const KP_YAW: f32 = 15.0;
/// Outer wheel speed during a curve
pub const BASE_CURVE_SPEED: i32 = 200;
/// Inner wheel speed floor
pub const MIN_CURVE_SPEED: i32 = 50;
/// Curve completes when the heading error drops below this (degrees)
pub const YAW_TOLERANCE: f32 = 0.5;

/// Duration of the open-loop diagonal nudge
pub const DIAGONAL_NUDGE_MS: u64 = 400;

// ---------------------------------------------------------------------------
// Gyroscope
// ---------------------------------------------------------------------------

/// Stationary samples averaged into the bias offset
pub const GYRO_CALIBRATION_SAMPLES: u16 = 1000;
/// Pause between calibration samples
pub const GYRO_CALIBRATION_INTERVAL_MS: u64 = 2;
/// Raw counts per degree/second (±250 °/s full scale)
pub const GYRO_LSB_PER_DPS: f32 = 131.0;

/// Speed profile selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedProfile {
    #[default]
    Medium,
    Fast,
}

impl SpeedProfile {
    /// Cycle to the next profile
    pub fn next(self) -> Self {
        match self {
            SpeedProfile::Medium => SpeedProfile::Fast,
            SpeedProfile::Fast => SpeedProfile::Medium,
        }
    }
}

/// How 90° turns are performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnStrategy {
    /// In place, wheels in opposite directions
    #[default]
    Pivot,
    /// Arc with both wheels forward
    Curve,
    /// Open-loop forward nudge
    Diagonal,
}

impl TurnStrategy {
    /// Cycle to the next strategy
    pub fn next(self) -> Self {
        match self {
            TurnStrategy::Pivot => TurnStrategy::Curve,
            TurnStrategy::Curve => TurnStrategy::Diagonal,
            TurnStrategy::Diagonal => TurnStrategy::Pivot,
        }
    }
}

/// Choices made between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunConfig {
    pub speed: SpeedProfile,
    pub turn: TurnStrategy,
    /// User goal cell; `None` targets the maze centre
    pub goal: Option<(i16, i16)>,
}

impl RunConfig {
    /// Forward base speed of the selected profile
    pub fn base_speed(&self) -> i32 {
        match self.speed {
            SpeedProfile::Medium => SPEED_MEDIUM,
            SpeedProfile::Fast => SPEED_FAST,
        }
    }

    /// Encoder ticks per cell of the selected profile
    pub fn ticks_per_cell(&self) -> i32 {
        match self.speed {
            SpeedProfile::Medium => TICKS_PER_CELL,
            SpeedProfile::Fast => (TICKS_PER_CELL - TICK_FAST).max(0),
        }
    }

    /// Front distance at which a straight drive stops early
    pub fn front_stop_mm(&self) -> u8 {
        match self.speed {
            SpeedProfile::Medium => FRONT_STOP_MEDIUM_MM,
            SpeedProfile::Fast => FRONT_STOP_FAST_MM,
        }
    }
}
