//! Heading tracking from a single-axis rate gyro
//!
//! The heading is relative to where the robot stood at calibration, not an
//! absolute compass bearing. It is integrated from the bias-corrected Z-axis
//! rate and kept wrapped into [-180°, +180°]. Positive angles are counter
//! clockwise (left turns).
//!
//! Calibration assumes the robot is perfectly still for its whole duration;
//! motion during calibration is not detected and skews the bias.

use crate::config::{GYRO_CALIBRATION_INTERVAL_MS, GYRO_CALIBRATION_SAMPLES, GYRO_LSB_PER_DPS};
use crate::traits::{ControlTimer, RateGyro, SensorError};

/// Wrap an angle in degrees into [-180, 180]
pub fn wrap_degrees(angle: f32) -> f32 {
    if (-180.0..=180.0).contains(&angle) {
        return angle;
    }
    let mut wrapped = libm::fmodf(angle + 180.0, 360.0);
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    wrapped - 180.0
}

/// Integrated yaw of the robot
pub struct OrientationTracker<G> {
    gyro: G,
    yaw: f32,
    /// Stationary bias in raw counts
    offset: f32,
    last_update_ms: Option<u64>,
}

impl<G: RateGyro> OrientationTracker<G> {
    /// Uncalibrated tracker at heading zero
    pub fn new(gyro: G) -> Self {
        Self {
            gyro,
            yaw: 0.0,
            offset: 0.0,
            last_update_ms: None,
        }
    }

    /// Average stationary samples into the bias offset
    ///
    /// Returns the offset in raw counts. Failed samples are left out of the
    /// average; if none succeeds the previous offset is kept.
    pub async fn calibrate<T: ControlTimer>(&mut self, timer: &mut T) -> Result<f32, SensorError> {
        let mut sum: i64 = 0;
        let mut taken: u32 = 0;

        for _ in 0..GYRO_CALIBRATION_SAMPLES {
            match self.gyro.read_raw_rate().await {
                Ok(raw) => {
                    sum += raw as i64;
                    taken += 1;
                }
                Err(e) => warn!("Gyro calibration sample failed: {:?}", e),
            }
            timer.wait_ms(GYRO_CALIBRATION_INTERVAL_MS).await;
        }

        if taken == 0 {
            return Err(SensorError::NoSamples);
        }

        self.offset = sum as f32 / taken as f32;
        self.last_update_ms = Some(timer.now_ms());
        info!("Gyro bias {} counts from {} samples", self.offset, taken);
        Ok(self.offset)
    }

    /// Integrate one rate sample up to `now_ms` and return the new heading
    ///
    /// A failed read leaves the heading and the integration start untouched,
    /// so the next good sample covers the whole gap.
    pub async fn update(&mut self, now_ms: u64) -> f32 {
        let raw = match self.gyro.read_raw_rate().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Gyro read failed: {:?}", e);
                return self.yaw;
            }
        };

        let last = self.last_update_ms.unwrap_or(now_ms);
        let dt = now_ms.saturating_sub(last) as f32 / 1000.0;
        self.last_update_ms = Some(now_ms);

        let rate_dps = (raw as f32 - self.offset) / GYRO_LSB_PER_DPS;
        self.yaw = wrap_degrees(self.yaw + rate_dps * dt);
        self.yaw
    }

    /// Current heading in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Bias offset in raw counts
    pub fn offset(&self) -> f32 {
        self.offset
    }
}
