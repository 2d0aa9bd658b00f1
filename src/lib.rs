//! Micromouse navigation and motion-control core
//!
//! Platform-agnostic half of the robot: everything here builds for the host
//! and is exercised by the unit tests, while the RP2350 firmware binary
//! (`src/main.rs`, `firmware` feature) plugs real peripherals into the traits
//! declared in [`traits`].
//!
//! # Modules
//!
//! - [`maze`]: grid model, wall bookkeeping and flood-fill distances
//! - [`explorer`]: move selection, exploration steps and best-path replay
//! - [`motion`]: straight-line driving and gyro-referenced turns
//! - [`orientation`]: yaw integration from a single-axis rate gyro
//! - [`encoder`]: interrupt-shared quadrature tick counters
//! - [`range`]: front/left/right distance sensor façade
//! - [`config`]: run configuration and the tuning constants
//! - [`traits`]: hardware seams (motors, sensors, timer)

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// Must stay first so the log macros are visible to every module below
#[macro_use]
mod fmt;

pub mod config;
pub mod encoder;
pub mod explorer;
pub mod maze;
pub mod motion;
pub mod orientation;
pub mod range;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{RunConfig, SpeedProfile, TurnStrategy};
pub use encoder::{EncoderCounter, Wheel};
pub use explorer::{Explorer, ExplorerState, Locomotion, Step};
pub use maze::{Direction, Maze, Pose, Rotation};
pub use motion::{DriveOutcome, MotionController, TurnOutcome};
pub use orientation::OrientationTracker;
pub use range::{RangeSensors, Reading, SensorId, WallReadings};
