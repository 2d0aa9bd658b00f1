//! Orchestrator Module
//!
//! Central coordinator of the firmware. It listens for system events, keeps
//! the robot phase in [`SYSTEM_STATE`] current and turns button input into
//! run commands.

use crate::system::button_actions;
use crate::system::event::{self, Events, RunResult};
use crate::system::run_command;
use crate::system::state::{Phase, SYSTEM_STATE};
use defmt::{info, warn};

/// Main orchestrator task
///
/// This task continuously listens for system events, processes them, and manages state changes.
#[embassy_executor::task]
pub async fn orchestrate() {
    info!("Orchestrator started");
    loop {
        let event = event::wait().await;
        if let Some(state_change) = process_event(event).await {
            handle_state_changes(state_change).await;
        }
    }
}

/// Applies an event to the system state
///
/// Returns the event again when it needs further handling.
async fn process_event(event: Events) -> Option<Events> {
    let mut state = SYSTEM_STATE.lock().await;

    match event {
        Events::Initialized => {
            state.phase = Phase::Ready;
            Some(event)
        }
        Events::InitializationFailed => {
            state.phase = Phase::Faulted;
            Some(event)
        }
        Events::RunStarted => Some(event),
        Events::RunFinished(_) => {
            if state.phase == Phase::Running {
                state.phase = Phase::Ready;
            }
            Some(event)
        }
        Events::ButtonPressed(_) | Events::ButtonHoldStart(_) | Events::ButtonHoldEnd(_) => {
            Some(event)
        }
    }
}

/// Handles state changes resulting from events
async fn handle_state_changes(event: Events) {
    match event {
        Events::Initialized => info!("Ready: A explores, B runs the best path"),
        Events::InitializationFailed => warn!("Sensor bring-up failed, runs disabled"),
        Events::RunStarted => info!("Run started"),
        Events::RunFinished(result) => {
            run_command::clear_stop();
            match result {
                RunResult::AtGoal => info!("Run finished at the goal"),
                RunResult::Blocked => warn!("Run finished: goal unreachable"),
                RunResult::Stopped => info!("Run stopped"),
                RunResult::Stalled => warn!("Speed run stalled in a turn"),
                RunResult::MotorFault => warn!("Run aborted by a motor fault"),
            }
        }
        Events::ButtonPressed(button_id) => {
            info!("Handling button {} press", button_id);
            button_actions::handle_button_action(
                button_id,
                button_actions::ButtonActionType::Press,
            )
            .await;
        }
        Events::ButtonHoldStart(button_id) => {
            info!("Handling button {} hold start", button_id);
            button_actions::handle_button_action(
                button_id,
                button_actions::ButtonActionType::HoldStart,
            )
            .await;
        }
        Events::ButtonHoldEnd(button_id) => {
            button_actions::handle_button_action(
                button_id,
                button_actions::ButtonActionType::HoldEnd,
            )
            .await;
        }
    }
}
