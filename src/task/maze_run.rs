//! Maze Run Task
//!
//! Owns everything that moves the robot: the motor driver, the three range
//! sensors and the gyroscope on the shared I2C bus, the motion controller and
//! the explorer with its maze. It brings the hardware up once, calibrates the
//! gyro while the robot stands still and then serves run commands.
//!
//! # Run procedure
//! 1. Wait for the start gesture (a hand close to both side sensors)
//! 2. Reset the maze, observe the start cell with averaged readings
//! 3. Repeat: observe walls, recompute distances, step one cell
//! 4. Brake at the goal, when blocked, or when a stop was requested
//!
//! A speed run keeps the learned maze and drives the best known path from
//! the start cell without looking at the walls again.

use crate::device::motor::DriveMotor;
use crate::device::mpu6050::Mpu6050;
use crate::device::timer::EmbassyTimer;
use crate::device::vl6180x::Vl6180x;
use crate::system::event::{self, Events, RunResult};
use crate::system::resources::{I2cBusShared, Irqs, MotorDriverResources, SensorResources, I2C_FREQUENCY_HZ};
use crate::system::run_command::{self, Command};
use crate::task::encoder::ENCODERS;
use defmt::{debug, info, warn};
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, Async, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use micromouse::config::RANGE_AVERAGE_SAMPLES;
use micromouse::traits::{MotorError, SensorError};
use micromouse::{Explorer, MotionController, OrientationTracker, RangeSensors, RunConfig, Step};

/// New addresses of the range sensors, in wake-up order
const LEFT_ADDRESS: u8 = 0x30;
const FRONT_ADDRESS: u8 = 0x31;
const RIGHT_ADDRESS: u8 = 0x33;

/// Settle time after pulling every XSHUT low
const SHUTDOWN_MS: u64 = 10;
/// Boot time of a VL6180X after its XSHUT goes high
const BOOT_MS: u64 = 50;
/// Poll period while waiting for the start gesture
const GESTURE_POLL_MS: u64 = 50;
/// Motor PWM frequency
const PWM_FREQUENCY_HZ: u32 = 10_000;

type SharedI2c<'a> = I2cDevice<'a, NoopRawMutex, I2c<'static, I2C0, Async>>;
type Controller<'a> = MotionController<'static, DriveMotor, Vl6180x<SharedI2c<'a>>, Mpu6050<SharedI2c<'a>>, EmbassyTimer>;

#[embassy_executor::task]
pub async fn maze_run(s: SensorResources, m: MotorDriverResources) {
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let bus: I2cBusShared = Mutex::new(I2c::new_async(s.i2c, s.scl, s.sda, Irqs, i2c_config));

    // Held for the lifetime of the task; a low XSHUT powers the sensor down
    let mut xshut = [
        Output::new(s.xshut_left, Level::Low),
        Output::new(s.xshut_front, Level::Low),
        Output::new(s.xshut_right, Level::Low),
    ];

    let Some((left, right, _standby)) = motors(m) else {
        event::send(Events::InitializationFailed).await;
        return;
    };

    let ranges = match range_sensors(&bus, &mut xshut).await {
        Ok(ranges) => ranges,
        Err(e) => {
            warn!("Range sensor bring-up failed: {:?}", e);
            event::send(Events::InitializationFailed).await;
            return;
        }
    };

    let mut gyro = Mpu6050::new(I2cDevice::new(&bus));
    if let Err(e) = gyro.init().await {
        warn!("Gyroscope bring-up failed: {:?}", e);
        event::send(Events::InitializationFailed).await;
        return;
    }

    let mut motion = MotionController::new(
        left,
        right,
        ranges,
        OrientationTracker::new(gyro),
        &ENCODERS,
        EmbassyTimer,
    );

    info!("Calibrating gyro, keep the robot still");
    if let Err(e) = motion.calibrate_gyro().await {
        warn!("Gyro calibration failed: {:?}", e);
        event::send(Events::InitializationFailed).await;
        return;
    }
    event::send(Events::Initialized).await;

    let mut explorer = Explorer::new();
    loop {
        let command = run_command::wait().await;
        event::send(Events::RunStarted).await;

        let outcome = match command {
            Command::Explore(config) => explore(&mut explorer, &mut motion, &config).await,
            Command::SpeedRun(config) => speed_run(&mut explorer, &mut motion, &config).await,
        };
        let result = outcome.unwrap_or_else(|e| {
            warn!("Run aborted: {:?}", e);
            RunResult::MotorFault
        });

        if motion.reset_motion().is_err() {
            warn!("Brake after the run failed");
        }
        event::send(Events::RunFinished(result)).await;
    }
}

/// Both TB6612FNG channels with the driver out of standby
///
/// The standby pin is returned so it stays driven high.
fn motors(r: MotorDriverResources) -> Option<(DriveMotor, DriveMotor, Output<'static>)> {
    // Calculate minimum divider needed to keep period under 16-bit limit (65535)
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
    let divider = ((clock_freq_hz / PWM_FREQUENCY_HZ) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (PWM_FREQUENCY_HZ * divider as u32)) as u16 - 1;

    let mut pwm_config = pwm::Config::default();
    pwm_config.divider = divider.into();
    pwm_config.top = period;

    // motor A, the left wheel
    let left_fwd = Output::new(r.left_forward_pin, Level::Low);
    let left_bckw = Output::new(r.left_backward_pin, Level::Low);
    let (left_pwm, _) = pwm::Pwm::new_output_a(r.left_slice, r.left_pwm_pin, pwm_config.clone()).split();

    // motor B, the right wheel
    let right_fwd = Output::new(r.right_forward_pin, Level::Low);
    let right_bckw = Output::new(r.right_backward_pin, Level::Low);
    let (_, right_pwm) = pwm::Pwm::new_output_b(r.right_slice, r.right_pwm_pin, pwm_config).split();

    let (Some(left_pwm), Some(right_pwm)) = (left_pwm, right_pwm) else {
        warn!("Motor PWM channels unavailable");
        return None;
    };

    let left = tb6612fng::Motor::new(left_fwd, left_bckw, left_pwm).ok();
    let right = tb6612fng::Motor::new(right_fwd, right_bckw, right_pwm).ok();
    let (Some(left), Some(right)) = (left, right) else {
        warn!("Motor driver setup failed");
        return None;
    };

    let standby = Output::new(r.standby_pin, Level::High);
    Some((DriveMotor::new(left), DriveMotor::new(right), standby))
}

/// Wakes the range sensors one by one and moves each off the default address
///
/// `xshut` is ordered left, front, right.
async fn range_sensors<'a>(
    bus: &'a I2cBusShared,
    xshut: &mut [Output<'static>; 3],
) -> Result<RangeSensors<Vl6180x<SharedI2c<'a>>>, SensorError> {
    for pin in xshut.iter_mut() {
        pin.set_low();
    }
    Timer::after_millis(SHUTDOWN_MS).await;

    let [left_pin, front_pin, right_pin] = xshut;
    let left = wake_range_sensor(bus, left_pin, LEFT_ADDRESS).await?;
    let front = wake_range_sensor(bus, front_pin, FRONT_ADDRESS).await?;
    let right = wake_range_sensor(bus, right_pin, RIGHT_ADDRESS).await?;

    info!("Range sensors up");
    Ok(RangeSensors::new(front, left, right))
}

async fn wake_range_sensor<'a>(
    bus: &'a I2cBusShared,
    xshut: &mut Output<'static>,
    address: u8,
) -> Result<Vl6180x<SharedI2c<'a>>, SensorError> {
    xshut.set_high();
    Timer::after_millis(BOOT_MS).await;

    let mut sensor = Vl6180x::new(I2cDevice::new(bus));
    sensor.init().await?;
    sensor.set_address(address).await?;
    Ok(sensor)
}

/// Waits for the start gesture; `false` when a stop request came first
async fn wait_for_start(motion: &mut Controller<'_>) -> bool {
    info!("Waiting for the start gesture");
    loop {
        if run_command::stop_requested() {
            return false;
        }
        if motion.start_gesture_detected().await {
            return true;
        }
        Timer::after_millis(GESTURE_POLL_MS).await;
    }
}

async fn explore(
    explorer: &mut Explorer,
    motion: &mut Controller<'_>,
    config: &RunConfig,
) -> Result<RunResult, MotorError> {
    if !wait_for_start(motion).await {
        return Ok(RunResult::Stopped);
    }

    explorer.begin_run(config);
    let walls = motion.read_walls_averaged(RANGE_AVERAGE_SAMPLES).await;
    explorer.observe_walls(walls);
    explorer.recompute_distances();

    loop {
        if run_command::stop_requested() {
            return Ok(RunResult::Stopped);
        }

        let walls = motion.read_walls().await;
        explorer.observe_walls(walls);
        explorer.recompute_distances();

        match explorer.step_explore(motion, config).await? {
            Step::Moved(pose) => debug!("At ({}, {})", pose.x, pose.y),
            Step::Stalled => warn!("Turn stalled, planning again"),
            Step::AtGoal => return Ok(RunResult::AtGoal),
            Step::Blocked => return Ok(RunResult::Blocked),
        }
    }
}

async fn speed_run(
    explorer: &mut Explorer,
    motion: &mut Controller<'_>,
    config: &RunConfig,
) -> Result<RunResult, MotorError> {
    if !wait_for_start(motion).await {
        return Ok(RunResult::Stopped);
    }

    explorer.restart_from_origin();
    explorer.recompute_distances();

    Ok(match explorer.run_best_path(motion, config).await? {
        Step::AtGoal | Step::Moved(_) => RunResult::AtGoal,
        Step::Blocked => RunResult::Blocked,
        Step::Stalled => RunResult::Stalled,
    })
}
