//! Micromouse firmware entry point
//!
//! Initializes the RP2350 and spawns the robot tasks.

#![no_std]
#![no_main]

use crate::task::{
    encoder::{left_encoder, right_encoder},
    maze_run::maze_run,
    orchestrate::orchestrate,
    rc_control::{rc_button_a_handle, rc_button_b_handle, rc_button_c_handle, rc_button_d_handle},
};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use system::resources::{
    AssignedResources, LeftEncoderResources, MotorDriverResources, RCResourcesA, RCResourcesB,
    RCResourcesC, RCResourcesD, RightEncoderResources, SensorResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Runs the encoder tasks, preempting everything on the thread executor
static EXECUTOR_ENCODERS: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_ENCODERS.on_interrupt()
}

/// Board drivers
mod device;
/// System core modules
mod system;
/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // Every resource group goes to exactly one task
    let r = split_resources!(p);

    spawner.spawn(orchestrate()).unwrap();
    spawner.spawn(rc_button_a_handle(r.rc_a)).unwrap();
    spawner.spawn(rc_button_b_handle(r.rc_b)).unwrap();
    spawner.spawn(rc_button_c_handle(r.rc_c)).unwrap();
    spawner.spawn(rc_button_d_handle(r.rc_d)).unwrap();
    // Edge tasks must re-arm before the next edge even while maze_run is busy
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let encoder_spawner = EXECUTOR_ENCODERS.start(interrupt::SWI_IRQ_1);
    encoder_spawner.spawn(left_encoder(r.left_encoder)).unwrap();
    encoder_spawner.spawn(right_encoder(r.right_encoder)).unwrap();
    spawner.spawn(maze_run(r.sensors, r.motor_driver)).unwrap();
}
