//! Simulated robot for unit tests
//!
//! Time only moves when a control loop waits on [`SimTimer`]; every
//! simulated millisecond the plant turns the last motor commands into
//! encoder edges and a yaw rate. The gains are chosen per test so that the
//! loops see well-behaved dynamics.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::config::MOTOR_R_GAIN;
use crate::encoder::{EncoderCounter, Wheel};
use crate::range::SensorId;
use crate::traits::{ControlTimer, Motor, MotorError, RangeFinder, RateGyro, SensorError};

/// Timer that only advances when waited on
#[derive(Debug, Default)]
pub struct FixedTimer {
    now: u64,
}

impl FixedTimer {
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl ControlTimer for FixedTimer {
    fn now_ms(&self) -> u64 {
        self.now
    }

    async fn wait_ms(&mut self, ms: u64) {
        self.now += ms;
    }
}

/// Gyro returning a fixed raw rate, optionally failing
pub struct ScriptedGyro {
    raw: i16,
    fail_at: Option<usize>,
    always_fail: bool,
    reads: usize,
}

impl ScriptedGyro {
    pub fn constant(raw: i16) -> Self {
        Self {
            raw,
            fail_at: None,
            always_fail: false,
            reads: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::constant(0)
        }
    }

    /// Fails on the read with the given zero-based index only
    pub fn with_gap(raw: i16, fail_at: usize) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..Self::constant(raw)
        }
    }
}

impl RateGyro for ScriptedGyro {
    async fn read_raw_rate(&mut self) -> Result<i16, SensorError> {
        let index = self.reads;
        self.reads += 1;
        if self.always_fail || self.fail_at == Some(index) {
            Err(SensorError::Bus)
        } else {
            Ok(self.raw)
        }
    }
}

/// Range finder replaying a list of results, repeating the last one
pub struct ScriptedRange {
    samples: Vec<Result<u8, SensorError>>,
    next: usize,
}

impl ScriptedRange {
    pub fn new(samples: &[Result<u8, SensorError>]) -> Self {
        Self {
            samples: samples.to_vec(),
            next: 0,
        }
    }

    pub fn constant(raw: u8) -> Self {
        Self::new(&[Ok(raw)])
    }
}

impl RangeFinder for ScriptedRange {
    async fn read_raw(&mut self) -> Result<u8, SensorError> {
        let index = self.next.min(self.samples.len() - 1);
        self.next += 1;
        self.samples[index]
    }
}

/// What one simulated range sensor reports
#[derive(Debug, Clone, Copy)]
pub enum RangeModel {
    /// Out of range: the sensor's overflow code
    Open,
    Fixed(u8),
    /// A wall ahead, closing in as the robot drives
    Approach { start_mm: f32, mm_per_tick: f32 },
    Fault,
}

pub struct Plant {
    now: u64,
    max_ms: u64,
    /// Encoder ticks per ms per unit of effective wheel speed
    pub tick_gain: f32,
    /// Degrees per ms per unit of effective right-minus-left speed
    pub yaw_gain: f32,
    /// Raw gyro counts added to every sample
    pub gyro_bias: f32,
    pub front: RangeModel,
    pub left: RangeModel,
    pub right: RangeModel,
    command: [i16; 2],
    travel: [f32; 2],
    emitted: [i32; 2],
    /// Every command issued, in order
    pub commands: Vec<(Wheel, i16)>,
    pub brakes: usize,
    encoders: &'static EncoderCounter,
}

impl Plant {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Mean distance travelled by both wheels in ticks
    pub fn odometer(&self) -> f32 {
        (self.travel[0] + self.travel[1]) / 2.0
    }

    fn effective_speed(&self, wheel: Wheel) -> f32 {
        match wheel {
            Wheel::Left => self.command[0] as f32,
            Wheel::Right => self.command[1] as f32 / MOTOR_R_GAIN,
        }
    }

    fn yaw_rate_dps(&self) -> f32 {
        self.yaw_gain * (self.effective_speed(Wheel::Right) - self.effective_speed(Wheel::Left)) * 1000.0
    }

    fn step(&mut self) {
        self.now += 1;
        assert!(self.now <= self.max_ms, "simulation ran past {} ms", self.max_ms);

        for (i, wheel) in [Wheel::Left, Wheel::Right].into_iter().enumerate() {
            self.travel[i] += self.tick_gain * self.effective_speed(wheel);
            while self.travel[i] - self.emitted[i] as f32 >= 1.0 {
                self.encoders.on_rising_edge(wheel, true);
                self.emitted[i] += 1;
            }
            while self.travel[i] - self.emitted[i] as f32 <= -1.0 {
                self.encoders.on_rising_edge(wheel, false);
                self.emitted[i] -= 1;
            }
        }
    }

    fn range(&self, id: SensorId) -> Result<u8, SensorError> {
        let model = match id {
            SensorId::Front => self.front,
            SensorId::Left => self.left,
            SensorId::Right => self.right,
        };
        match model {
            RangeModel::Open => Ok(0xB4),
            RangeModel::Fixed(mm) => Ok(mm),
            RangeModel::Approach { start_mm, mm_per_tick } => {
                let mm = start_mm - self.odometer() * mm_per_tick;
                Ok(mm.clamp(1.0, 255.0) as u8)
            }
            RangeModel::Fault => Err(SensorError::Bus),
        }
    }
}

pub type SharedPlant = Rc<RefCell<Plant>>;

/// Fresh plant with open surroundings and no motion gains
pub fn plant() -> SharedPlant {
    Rc::new(RefCell::new(Plant {
        now: 0,
        max_ms: 60_000,
        tick_gain: 0.0,
        yaw_gain: 0.0,
        gyro_bias: 0.0,
        front: RangeModel::Open,
        left: RangeModel::Open,
        right: RangeModel::Open,
        command: [0; 2],
        travel: [0.0; 2],
        emitted: [0; 2],
        commands: Vec::new(),
        brakes: 0,
        encoders: Box::leak(Box::new(EncoderCounter::new())),
    }))
}

pub fn encoders(plant: &SharedPlant) -> &'static EncoderCounter {
    plant.borrow().encoders
}

pub struct SimMotor {
    plant: SharedPlant,
    wheel: Wheel,
}

impl SimMotor {
    pub fn new(plant: &SharedPlant, wheel: Wheel) -> Self {
        Self {
            plant: plant.clone(),
            wheel,
        }
    }

    fn index(&self) -> usize {
        match self.wheel {
            Wheel::Left => 0,
            Wheel::Right => 1,
        }
    }
}

impl Motor for SimMotor {
    fn set_speed(&mut self, speed: i16) -> Result<(), MotorError> {
        let mut plant = self.plant.borrow_mut();
        plant.command[self.index()] = speed;
        plant.commands.push((self.wheel, speed));
        Ok(())
    }

    fn brake(&mut self) -> Result<(), MotorError> {
        let mut plant = self.plant.borrow_mut();
        plant.command[self.index()] = 0;
        plant.brakes += 1;
        Ok(())
    }
}

pub struct SimRange {
    plant: SharedPlant,
    id: SensorId,
}

impl SimRange {
    pub fn new(plant: &SharedPlant, id: SensorId) -> Self {
        Self {
            plant: plant.clone(),
            id,
        }
    }
}

impl RangeFinder for SimRange {
    async fn read_raw(&mut self) -> Result<u8, SensorError> {
        self.plant.borrow().range(self.id)
    }
}

pub struct SimGyro {
    plant: SharedPlant,
}

impl SimGyro {
    pub fn new(plant: &SharedPlant) -> Self {
        Self { plant: plant.clone() }
    }
}

impl RateGyro for SimGyro {
    async fn read_raw_rate(&mut self) -> Result<i16, SensorError> {
        let plant = self.plant.borrow();
        let raw = plant.yaw_rate_dps() * crate::config::GYRO_LSB_PER_DPS + plant.gyro_bias;
        Ok(libm::roundf(raw) as i16)
    }
}

pub struct SimTimer {
    plant: SharedPlant,
}

impl SimTimer {
    pub fn new(plant: &SharedPlant) -> Self {
        Self { plant: plant.clone() }
    }
}

impl ControlTimer for SimTimer {
    fn now_ms(&self) -> u64 {
        self.plant.borrow().now
    }

    async fn wait_ms(&mut self, ms: u64) {
        let mut plant = self.plant.borrow_mut();
        for _ in 0..ms {
            plant.step();
        }
    }
}
