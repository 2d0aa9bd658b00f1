//! Hardware Resource Management
//!
//! Allocates the RP2350 pins and peripherals to the tasks that own them.
//! Every group is moved into exactly one task, so no two tasks can touch the
//! same pin.
//!
//! # Resource Groups
//! - Motor Driver: TB6612FNG direction pins, PWM slices and standby
//! - Encoders: quadrature channel pairs of both wheels
//! - Range & Inertial Sensors: shared I2C bus plus the VL6180X shutdown pins
//! - RC Control: the four remote control buttons
//!
//! # Shared Resources
//! The three range sensors and the gyroscope share I2C0. They all live in
//! the maze-run task, which builds the bus mutex locally and hands out one
//! `I2cDevice` per chip.

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{Async, I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::{self, I2C0};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;

/// I2C0 behind a mutex, shared by the sensors of one task
pub type I2cBusShared = Mutex<NoopRawMutex, I2c<'static, I2C0, Async>>;

/// I2C fast mode
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

assign_resources! {
    /// Remote control buttons
    rc_a: RCResourcesA {
        btn_a: PIN_16,
    },
    rc_b: RCResourcesB {
        btn_b: PIN_17,
    },
    rc_c: RCResourcesC {
        btn_c: PIN_10,
    },
    rc_d: RCResourcesD {
        btn_d: PIN_11,
    },
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_22,
        // Motor A, the left wheel
        left_slice: PWM_SLICE6,
        left_pwm_pin: PIN_28,
        left_forward_pin: PIN_21,
        left_backward_pin: PIN_20,
        // Motor B, the right wheel
        right_slice: PWM_SLICE5,
        right_pwm_pin: PIN_27,
        right_forward_pin: PIN_19,
        right_backward_pin: PIN_18,
    },
    /// Left wheel quadrature channels, A triggers and B gives direction
    left_encoder: LeftEncoderResources {
        channel_a: PIN_6,
        channel_b: PIN_7,
    },
    /// Right wheel quadrature channels
    right_encoder: RightEncoderResources {
        channel_a: PIN_8,
        channel_b: PIN_9,
    },
    /// VL6180X range sensors and the gyroscope on I2C0
    sensors: SensorResources {
        i2c: I2C0,
        scl: PIN_13,
        sda: PIN_12,
        xshut_front: PIN_2,
        xshut_left: PIN_3,
        xshut_right: PIN_4,
    },
}

bind_interrupts!(pub struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
});
