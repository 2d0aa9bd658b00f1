//! VL6180X time-of-flight range sensor
//!
//! Minimal single-shot driver. All three sensors power up on the same
//! default address, so they are released from shutdown one at a time and
//! moved to their own address before the next one wakes up.

use defmt::{info, warn};
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use micromouse::traits::{RangeFinder, SensorError};

/// Address every VL6180X answers on after power-up
pub const DEFAULT_ADDRESS: u8 = 0x29;

const IDENTIFICATION_MODEL_ID: u16 = 0x000;
const MODEL_ID: u8 = 0xB4;
const SYSRANGE_START: u16 = 0x018;
const RESULT_RANGE_VAL: u16 = 0x062;
const I2C_SLAVE_DEVICE_ADDRESS: u16 = 0x212;

/// Range value reported when nothing is in view
const NO_TARGET: u8 = 255;
/// What a "nothing in view" sample is turned into, above every valid limit
const OUT_OF_RANGE_MM: u8 = 0xB4;
/// Single-shot conversion time
const CONVERSION_MS: u64 = 10;

/// Mandatory private register settings after power-up
const TUNING: [(u16, u8); 30] = [
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xfd),
    (0x00e3, 0x00),
    (0x00e4, 0x04),
    (0x00e5, 0x02),
    (0x00e6, 0x01),
    (0x00e7, 0x03),
    (0x00f5, 0x02),
    (0x00d9, 0x05),
    (0x00db, 0xce),
    (0x00dc, 0x03),
    (0x00dd, 0xf8),
    (0x009f, 0x00),
    (0x00a3, 0x3c),
    (0x00b7, 0x00),
    (0x00bb, 0x3c),
    (0x00b2, 0x09),
    (0x00ca, 0x09),
    (0x0198, 0x01),
    (0x01b0, 0x17),
    (0x01ad, 0x00),
    (0x00ff, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01a6, 0x1b),
    (0x01ac, 0x3e),
    (0x01a7, 0x1f),
    (0x0030, 0x00),
];

pub struct Vl6180x<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Vl6180x<I> {
    /// Driver for a sensor still on the default address
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Check the model id and load the tuning settings
    pub async fn init(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(IDENTIFICATION_MODEL_ID).await?;
        if id != MODEL_ID {
            warn!("VL6180X at {:#x}: unexpected model id {:#x}", self.address, id);
            return Err(SensorError::Bus);
        }
        for (register, value) in TUNING {
            self.write_register(register, value).await?;
        }
        Ok(())
    }

    /// Move the sensor to a new 7-bit address
    pub async fn set_address(&mut self, address: u8) -> Result<(), SensorError> {
        self.write_register(I2C_SLAVE_DEVICE_ADDRESS, address).await?;
        info!("VL6180X moved from {:#x} to {:#x}", self.address, address);
        self.address = address;
        Ok(())
    }

    async fn read_register(&mut self, register: u16) -> Result<u8, SensorError> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &register.to_be_bytes(), &mut value)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(value[0])
    }

    async fn write_register(&mut self, register: u16, value: u8) -> Result<(), SensorError> {
        let [high, low] = register.to_be_bytes();
        self.i2c
            .write(self.address, &[high, low, value])
            .await
            .map_err(|_| SensorError::Bus)
    }
}

impl<I: I2c> RangeFinder for Vl6180x<I> {
    async fn read_raw(&mut self) -> Result<u8, SensorError> {
        self.write_register(SYSRANGE_START, 0x01).await?;
        Timer::after_millis(CONVERSION_MS).await;
        let range = self.read_register(RESULT_RANGE_VAL).await?;
        Ok(if range == NO_TARGET { OUT_OF_RANGE_MM } else { range })
    }
}
