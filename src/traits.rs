//! Hardware seams of the core
//!
//! The firmware implements these for the RP2350 peripherals; the tests
//! implement them for a simulated robot. Nothing in the core touches a
//! register directly.

/// Motor output failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// The driver rejected the command (pin or PWM fault)
    HardwareFault,
}

/// Sensor bus failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C transfer failed
    Bus,
    /// Not a single usable sample was obtained
    NoSamples,
}

/// One driven wheel
///
/// Speeds are signed commands in `[-255, 255]`; the sign selects the
/// direction and zero lets the wheel coast.
pub trait Motor {
    /// Set signed speed
    fn set_speed(&mut self, speed: i16) -> Result<(), MotorError>;

    /// Short the motor terminals for an active stop
    fn brake(&mut self) -> Result<(), MotorError>;
}

/// Single-point distance sensor
pub trait RangeFinder {
    /// Take one single-shot measurement in millimetres
    async fn read_raw(&mut self) -> Result<u8, SensorError>;
}

/// Single-axis (yaw) angular-rate sensor
pub trait RateGyro {
    /// Read one raw rate sample, sensor counts
    async fn read_raw_rate(&mut self) -> Result<i16, SensorError>;
}

/// Monotonic clock plus a way to wait on it
///
/// Control loops call [`ControlTimer::wait_ms`] once per period. On the
/// robot this yields to the executor; in tests it advances simulated time.
pub trait ControlTimer {
    /// Milliseconds since start, never wraps during a run
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds
    async fn wait_ms(&mut self, ms: u64);
}
