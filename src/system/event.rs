//! System Events
//!
//! Defines events and channels for inter-task communication.

use defmt::Format;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Multi-producer, single-consumer event channel with capacity of 10
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Events, 10> = Channel::new();

/// Sends an event to the system channel
pub async fn send(event: Events) {
    EVENT_CHANNEL.sender().send(event).await;
}

/// Receives the next event from the system channel
pub async fn wait() -> Events {
    EVENT_CHANNEL.receiver().receive().await
}

/// System-wide events
#[derive(Debug, Clone, Copy, Format)]
pub enum Events {
    /// Sensors are up and the gyro is calibrated
    Initialized,
    /// Initialization failed; the robot cannot run
    InitializationFailed,
    /// A run left the maze-run task's idle state
    RunStarted,
    /// A run ended
    RunFinished(RunResult),
    /// Button pressed
    ButtonPressed(ButtonId),
    /// Button hold started
    ButtonHoldStart(ButtonId),
    /// Button hold ended
    ButtonHoldEnd(ButtonId),
}

/// How a run ended
#[derive(Debug, Clone, Copy, Format, PartialEq)]
pub enum RunResult {
    /// The robot stands on a goal cell
    AtGoal,
    /// No route to the goal with the walls seen so far
    Blocked,
    /// Stopped on request between two moves
    Stopped,
    /// A replay turn hit the runaway guard
    Stalled,
    /// A motor output failed
    MotorFault,
}

/// Button identifiers
#[derive(Debug, Clone, Copy, Format, PartialEq)]
pub enum ButtonId {
    A,
    B,
    C,
    D,
}
