//! Front, left and right distance sensors behind one façade

use crate::config::{RANGE_AVERAGE_INTERVAL_MS, RANGE_AVERAGE_SAMPLES, SENSOR_FRONT_LIMIT, SENSOR_SIDE_LIMIT};
use crate::traits::{ControlTimer, RangeFinder};

/// Which sensor to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorId {
    Front,
    Left,
    Right,
}

/// One distance measurement
///
/// `Invalid` means "no information" and must never be read as a distance of
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Millimetres, in `1..=150`
    Valid(u8),
    Invalid,
}

impl Reading {
    /// Classify a raw sample
    pub fn from_raw(raw: u8) -> Self {
        if raw > 0 && raw <= SENSOR_FRONT_LIMIT {
            Reading::Valid(raw)
        } else {
            Reading::Invalid
        }
    }

    pub fn mm(self) -> Option<u8> {
        match self {
            Reading::Valid(mm) => Some(mm),
            Reading::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Reading::Valid(_))
    }
}

/// Wall presence around the robot, relative to its heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallReadings {
    pub front: bool,
    pub right: bool,
    pub left: bool,
}

pub struct RangeSensors<F> {
    front: F,
    left: F,
    right: F,
}

impl<F: RangeFinder> RangeSensors<F> {
    pub fn new(front: F, left: F, right: F) -> Self {
        Self { front, left, right }
    }

    fn sensor(&mut self, id: SensorId) -> &mut F {
        match id {
            SensorId::Front => &mut self.front,
            SensorId::Left => &mut self.left,
            SensorId::Right => &mut self.right,
        }
    }

    /// One single-shot reading; a bus fault reads as `Invalid`
    pub async fn read_range(&mut self, id: SensorId) -> Reading {
        match self.sensor(id).read_raw().await {
            Ok(raw) => Reading::from_raw(raw),
            Err(e) => {
                warn!("{:?} range read failed: {:?}", id, e);
                Reading::Invalid
            }
        }
    }

    /// Mean of the valid samples among `n` reads, 5 ms apart
    pub async fn read_average<T: ControlTimer>(&mut self, id: SensorId, n: u8, timer: &mut T) -> Reading {
        let mut sum: u16 = 0;
        let mut valid: u16 = 0;

        for _ in 0..n {
            if let Reading::Valid(mm) = self.read_range(id).await {
                sum += mm as u16;
                valid += 1;
            }
            timer.wait_ms(RANGE_AVERAGE_INTERVAL_MS).await;
        }

        if valid == 0 {
            Reading::Invalid
        } else {
            Reading::from_raw((sum / valid) as u8)
        }
    }

    /// Wall presence from one reading per sensor
    pub async fn read_walls(&mut self) -> WallReadings {
        WallReadings {
            front: self.read_range(SensorId::Front).await.is_valid(),
            right: self.read_range(SensorId::Right).await.is_valid(),
            left: self.read_range(SensorId::Left).await.is_valid(),
        }
    }

    /// Wall presence from `n` averaged readings per sensor
    pub async fn read_walls_averaged<T: ControlTimer>(&mut self, n: u8, timer: &mut T) -> WallReadings {
        WallReadings {
            front: self.read_average(SensorId::Front, n, timer).await.is_valid(),
            right: self.read_average(SensorId::Right, n, timer).await.is_valid(),
            left: self.read_average(SensorId::Left, n, timer).await.is_valid(),
        }
    }

    /// Both side sensors covered at close range: the hand wave that starts a run
    pub async fn start_gesture_detected<T: ControlTimer>(&mut self, timer: &mut T) -> bool {
        let close = |r: Reading| matches!(r, Reading::Valid(mm) if mm <= SENSOR_SIDE_LIMIT);
        let left = self.read_average(SensorId::Left, RANGE_AVERAGE_SAMPLES, timer).await;
        let right = self.read_average(SensorId::Right, RANGE_AVERAGE_SAMPLES, timer).await;
        close(left) && close(right)
    }
}
