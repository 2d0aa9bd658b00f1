//! Core system components shared by the firmware tasks
pub mod button_actions;
pub mod event;
pub mod resources;
pub mod run_command;
pub mod state;
