//! Run Command Module
//!
//! Signals from the orchestrator to the maze-run task. A run command carries
//! the configuration snapshot the run uses; a stop request is picked up by the
//! run between two moves.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use micromouse::RunConfig;

/// Signal for run commands
pub static RUN: Signal<CriticalSectionRawMutex, Command> = Signal::new();

/// Stop request for the active run
static STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Issues a new run command
pub fn update(command: Command) {
    RUN.signal(command);
}

/// Waits for the next run command
pub async fn wait() -> Command {
    RUN.wait().await
}

/// Asks the active run to stop after its current move
pub fn request_stop() {
    STOP.signal(());
}

/// Takes a pending stop request, if any
pub fn stop_requested() -> bool {
    STOP.try_take().is_some()
}

/// Drops a stop request left over from before a run
pub fn clear_stop() {
    STOP.reset();
}

/// Run commands
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Wait for the start gesture, then explore the maze cell by cell
    Explore(RunConfig),
    /// Replay the best known path from the start cell
    SpeedRun(RunConfig),
}
