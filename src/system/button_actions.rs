//! Button Actions Module
//!
//! Maps remote control buttons to run commands and configuration changes.
//!
//! | Button | Press                 | Hold                     |
//! |--------|-----------------------|--------------------------|
//! | A      | explore               | stop after current move  |
//! | B      | speed run             |                          |
//! | C      | cycle speed profile   | step the goal cell       |
//! | D      | cycle turn strategy   | goal back to the centre  |
//!
//! Configuration and run buttons are ignored while a run is active.
use defmt::info;

use crate::system::event::ButtonId;
use crate::system::run_command;
use crate::system::state::{Phase, SYSTEM_STATE};
use micromouse::config::{MAZE_HEIGHT, MAZE_WIDTH};

/// Enum representing the types of button actions
#[derive(Debug, Clone, Copy)]
pub enum ButtonActionType {
    /// Represents a short, single press of a button
    Press,
    /// Represents the moment a button is held down
    HoldStart,
    /// Represents the moment a held button is released
    HoldEnd,
}

/// Handles button actions based on the button ID and action type
pub async fn handle_button_action(button_id: ButtonId, action_type: ButtonActionType) {
    let mut state = SYSTEM_STATE.lock().await;

    if let (ButtonId::A, ButtonActionType::HoldStart) = (button_id, action_type) {
        if state.phase == Phase::Running {
            info!("Stop requested");
            run_command::request_stop();
        }
        return;
    }

    if !state.is_idle() {
        return;
    }

    match (button_id, action_type) {
        (ButtonId::A, ButtonActionType::Press) => {
            state.phase = Phase::Running;
            run_command::update(run_command::Command::Explore(state.run_config));
        }
        (ButtonId::B, ButtonActionType::Press) => {
            state.phase = Phase::Running;
            run_command::update(run_command::Command::SpeedRun(state.run_config));
        }
        (ButtonId::C, ButtonActionType::Press) => {
            state.run_config.speed = state.run_config.speed.next();
            info!("Speed profile {}", state.run_config.speed);
        }
        (ButtonId::C, ButtonActionType::HoldStart) => {
            state.run_config.goal = next_goal(state.run_config.goal);
            match state.run_config.goal {
                Some((x, y)) => info!("Goal cell ({}, {})", x, y),
                None => info!("Goal reset to the centre"),
            }
        }
        (ButtonId::D, ButtonActionType::Press) => {
            state.run_config.turn = state.run_config.turn.next();
            info!("Turn strategy {}", state.run_config.turn);
        }
        (ButtonId::D, ButtonActionType::HoldStart) => {
            state.run_config.goal = None;
            info!("Goal reset to the centre");
        }
        _ => (), // No action for other combinations
    }
}

/// Walks the goal row by row from (0, 0); past the last cell it returns to the centre
fn next_goal(goal: Option<(i16, i16)>) -> Option<(i16, i16)> {
    let (width, height) = (MAZE_WIDTH as i16, MAZE_HEIGHT as i16);
    match goal {
        None => Some((0, 0)),
        Some((x, y)) if x + 1 < width => Some((x + 1, y)),
        Some((_, y)) if y + 1 < height => Some((0, y + 1)),
        Some(_) => None,
    }
}
