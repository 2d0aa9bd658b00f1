//! TB6612FNG channel as a core [`Motor`]
//!
//! The core speaks signed commands in `[-255, 255]`; the driver takes a
//! direction plus a duty cycle in percent.

use defmt::warn;
use embassy_rp::gpio::Output;
use embassy_rp::pwm::PwmOutput;
use micromouse::config::SPEED_MAX;
use micromouse::traits::{Motor, MotorError};
use tb6612fng::DriveCommand;

/// One H-bridge channel: two direction pins and its PWM output
pub type Channel = tb6612fng::Motor<Output<'static>, Output<'static>, PwmOutput<'static>>;

pub struct DriveMotor {
    channel: Channel,
}

impl DriveMotor {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

/// Signed command to driver command, duty scaled to percent
fn drive_command(speed: i16) -> DriveCommand {
    let magnitude = i32::from(speed).unsigned_abs().min(SPEED_MAX as u32);
    let percent = (magnitude * 100 / SPEED_MAX as u32) as u8;
    match speed {
        0 => DriveCommand::Stop,
        s if s > 0 => DriveCommand::Forward(percent),
        _ => DriveCommand::Backward(percent),
    }
}

impl Motor for DriveMotor {
    fn set_speed(&mut self, speed: i16) -> Result<(), MotorError> {
        self.channel.drive(drive_command(speed)).map_err(|_| {
            warn!("Motor command {} rejected", speed);
            MotorError::HardwareFault
        })
    }

    fn brake(&mut self) -> Result<(), MotorError> {
        self.channel
            .drive(DriveCommand::Brake)
            .map_err(|_| MotorError::HardwareFault)
    }
}
