//! Board drivers behind the core's hardware traits
pub mod motor;
pub mod mpu6050;
pub mod timer;
pub mod vl6180x;
