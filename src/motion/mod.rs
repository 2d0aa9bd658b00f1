//! Closed-loop motion: straight cells and turns
//!
//! Every loop runs at a fixed period on the injected [`ControlTimer`] and
//! ends on its own exit condition. There is no way to cancel a manoeuvre
//! from outside; the run controller only acts between manoeuvres. Each exit
//! leaves both wheels braked.

pub mod straight;
pub mod turn;

pub use straight::{LaneKeeper, WheelCommand};

use crate::config::{
    RunConfig, TurnStrategy, BASE_CURVE_SPEED, DIAGONAL_NUDGE_MS, FRONT_STOP_COOLDOWN_MS, LOOP_DT_MS, MIN_TURN_DEG,
    MOTOR_R_GAIN, PIVOT_EPSILON_DEG, PIVOT_RIGHT_GAIN, YAW_TOLERANCE,
};
use crate::encoder::EncoderCounter;
use crate::explorer::Locomotion;
use crate::maze::Rotation;
use crate::orientation::{wrap_degrees, OrientationTracker};
use crate::range::{RangeSensors, Reading, SensorId, WallReadings};
use crate::traits::{ControlTimer, Motor, MotorError, RangeFinder, RateGyro, SensorError};

/// How a straight drive ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveOutcome {
    /// The encoders covered the requested distance
    TargetReached,
    /// Stopped early in front of a wall
    FrontWall,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnOutcome {
    Reached,
    /// Aborted by the stall guard
    Runaway,
    /// Nothing to turn
    Skipped,
}

pub struct MotionController<'a, M, F, G, T> {
    left: M,
    right: M,
    ranges: RangeSensors<F>,
    orientation: OrientationTracker<G>,
    encoders: &'a EncoderCounter,
    timer: T,
}

impl<'a, M, F, G, T> MotionController<'a, M, F, G, T>
where
    M: Motor,
    F: RangeFinder,
    G: RateGyro,
    T: ControlTimer,
{
    pub fn new(
        left: M,
        right: M,
        ranges: RangeSensors<F>,
        orientation: OrientationTracker<G>,
        encoders: &'a EncoderCounter,
        timer: T,
    ) -> Self {
        Self {
            left,
            right,
            ranges,
            orientation,
            encoders,
            timer,
        }
    }

    fn command(&mut self, cmd: WheelCommand) -> Result<(), MotorError> {
        self.left.set_speed(cmd.left)?;
        self.right.set_speed(cmd.right)
    }

    /// Brake both wheels and zero the encoders
    pub fn reset_motion(&mut self) -> Result<(), MotorError> {
        self.left.brake()?;
        self.right.brake()?;
        self.encoders.reset_all();
        Ok(())
    }

    /// Drive `cells` cells straight ahead, centring between the walls
    pub async fn drive_forward(&mut self, cells: u8, config: &RunConfig) -> Result<DriveOutcome, MotorError> {
        if cells == 0 {
            return Ok(DriveOutcome::TargetReached);
        }

        let target = config.ticks_per_cell() * cells as i32;
        let stop_mm = config.front_stop_mm();
        let mut lane = LaneKeeper::new(config.base_speed());

        self.encoders.reset_all();
        let cooldown_end = self.timer.now_ms() + FRONT_STOP_COOLDOWN_MS;

        loop {
            self.timer.wait_ms(LOOP_DT_MS).await;

            let ticks = self.encoders.ticks();
            let left = self.ranges.read_range(SensorId::Left).await;
            let right = self.ranges.read_range(SensorId::Right).await;
            let front = self.ranges.read_range(SensorId::Front).await;

            let cmd = lane.update(left, right, front, ticks);
            self.command(cmd)?;

            if ticks.average() >= target {
                self.reset_motion()?;
                return Ok(DriveOutcome::TargetReached);
            }

            if self.timer.now_ms() > cooldown_end {
                if let Reading::Valid(mm) = front {
                    if mm <= stop_mm {
                        debug!("Front wall at {} mm after {} ticks", mm, ticks.average());
                        self.reset_motion()?;
                        return Ok(DriveOutcome::FrontWall);
                    }
                }
            }
        }
    }

    /// Turn in place by `target_deg`, positive to the left
    pub async fn turn_pivot(&mut self, target_deg: f32) -> Result<TurnOutcome, MotorError> {
        if libm::fabsf(target_deg) < MIN_TURN_DEG {
            return Ok(TurnOutcome::Skipped);
        }

        self.reset_motion()?;
        let desired = wrap_degrees(self.update_yaw().await + target_deg);
        let direction = if target_deg > 0.0 { 1 } else { -1 };
        let limit = turn::runaway_limit(turn::expected_turn_ticks(target_deg));
        self.encoders.reset_all();

        loop {
            self.timer.wait_ms(LOOP_DT_MS).await;

            let error = turn::heading_error(desired, self.update_yaw().await);
            if libm::fabsf(error) < PIVOT_EPSILON_DEG {
                self.reset_motion()?;
                return Ok(TurnOutcome::Reached);
            }

            let speed = turn::pivot_speed(error);
            self.command(WheelCommand::clamped(
                -direction * speed,
                direction * (speed as f32 * PIVOT_RIGHT_GAIN) as i32,
            ))?;

            let divergence = self.encoders.ticks().difference().abs() / 2;
            if divergence > limit {
                warn!("Pivot runaway: {} ticks against a limit of {}", divergence, limit);
                self.reset_motion()?;
                return Ok(TurnOutcome::Runaway);
            }
        }
    }

    /// Turn by `target_deg` on an arc, both wheels forward
    pub async fn turn_curve(&mut self, target_deg: f32) -> Result<TurnOutcome, MotorError> {
        if libm::fabsf(target_deg) < MIN_TURN_DEG {
            return Ok(TurnOutcome::Skipped);
        }

        self.reset_motion()?;
        let desired = wrap_degrees(self.update_yaw().await + target_deg);
        let outer = BASE_CURVE_SPEED;

        loop {
            self.timer.wait_ms(LOOP_DT_MS).await;

            let error = turn::heading_error(desired, self.update_yaw().await);
            if libm::fabsf(error) < YAW_TOLERANCE {
                self.reset_motion()?;
                return Ok(TurnOutcome::Reached);
            }

            let inner = turn::curve_inner_speed(error);
            let cmd = if target_deg > 0.0 {
                WheelCommand::clamped(inner, (outer as f32 * MOTOR_R_GAIN) as i32)
            } else {
                WheelCommand::clamped(outer, (inner as f32 * MOTOR_R_GAIN) as i32)
            };
            self.command(cmd)?;
        }
    }

    /// Fixed open-loop nudge forward, no feedback
    pub async fn turn_diagonal(&mut self, config: &RunConfig) -> Result<TurnOutcome, MotorError> {
        self.reset_motion()?;
        let speed = config.base_speed();
        self.command(WheelCommand::clamped(speed, (speed as f32 * MOTOR_R_GAIN) as i32))?;
        self.timer.wait_ms(DIAGONAL_NUDGE_MS).await;
        self.reset_motion()?;
        Ok(TurnOutcome::Reached)
    }

    /// Quarter turn with the configured strategy
    pub async fn turn90(&mut self, left: bool, config: &RunConfig) -> Result<TurnOutcome, MotorError> {
        let angle = if left { 90.0 } else { -90.0 };
        match config.turn {
            TurnStrategy::Pivot => self.turn_pivot(angle).await,
            TurnStrategy::Curve => self.turn_curve(angle).await,
            TurnStrategy::Diagonal => self.turn_diagonal(config).await,
        }
    }

    /// Half turn, always a pivot
    pub async fn turn180(&mut self) -> Result<TurnOutcome, MotorError> {
        self.turn_pivot(180.0).await
    }

    pub async fn read_walls(&mut self) -> WallReadings {
        self.ranges.read_walls().await
    }

    pub async fn read_walls_averaged(&mut self, samples: u8) -> WallReadings {
        self.ranges.read_walls_averaged(samples, &mut self.timer).await
    }

    pub async fn start_gesture_detected(&mut self) -> bool {
        self.ranges.start_gesture_detected(&mut self.timer).await
    }

    /// Measure the gyro bias; the robot must stand still
    pub async fn calibrate_gyro(&mut self) -> Result<f32, SensorError> {
        self.orientation.calibrate(&mut self.timer).await
    }

    async fn update_yaw(&mut self) -> f32 {
        let now = self.timer.now_ms();
        self.orientation.update(now).await
    }

    pub fn yaw(&self) -> f32 {
        self.orientation.yaw()
    }

    pub fn timer(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<M, F, G, T> Locomotion for MotionController<'_, M, F, G, T>
where
    M: Motor,
    F: RangeFinder,
    G: RateGyro,
    T: ControlTimer,
{
    async fn rotate(&mut self, rotation: Rotation, config: &RunConfig) -> Result<TurnOutcome, MotorError> {
        match rotation {
            Rotation::None => Ok(TurnOutcome::Skipped),
            Rotation::Right => self.turn90(false, config).await,
            Rotation::Left => self.turn90(true, config).await,
            Rotation::Reverse => self.turn180().await,
        }
    }

    async fn advance(&mut self, cells: u8, config: &RunConfig) -> Result<DriveOutcome, MotorError> {
        self.drive_forward(cells, config).await
    }

    fn halt(&mut self) -> Result<(), MotorError> {
        self.reset_motion()
    }
}
