//! System State Management
//!
//! Holds the robot's global state: the run configuration chosen with the
//! buttons and the phase the robot is in. The state is protected by a mutex
//! so button handling and the maze-run task see consistent values.
//!
//! The run configuration is only edited while no run is active; a run works
//! on the snapshot it was started with.
//!
//! # State Access Pattern
//! ```rust
//! let state = SYSTEM_STATE.lock().await;
//! // Read or modify state here
//! // Lock automatically released when state goes out of scope
//! ```

use defmt::Format;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use micromouse::{RunConfig, SpeedProfile, TurnStrategy};

/// Global system state protected by a mutex
///
/// Initialized to:
/// - Medium speed, pivot turns, centre goal
/// - Initializing phase
pub static SYSTEM_STATE: Mutex<CriticalSectionRawMutex, SystemState> = Mutex::new(SystemState {
    run_config: RunConfig {
        speed: SpeedProfile::Medium,
        turn: TurnStrategy::Pivot,
        goal: None,
    },
    phase: Phase::Initializing,
});

/// Robot system state
#[derive(Format)]
pub struct SystemState {
    /// Configuration the next run starts with
    pub run_config: RunConfig,
    /// What the robot is doing
    pub phase: Phase,
}

impl SystemState {
    /// Whether settings may change and a run may start
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Ready
    }
}

/// Robot phases
#[derive(Debug, Clone, Copy, PartialEq, Format)]
pub enum Phase {
    /// Sensor bring-up and gyro calibration
    Initializing,
    /// Waiting for a run command
    Ready,
    /// A run is in progress
    Running,
    /// Sensor bring-up failed; nothing will run
    Faulted,
}
