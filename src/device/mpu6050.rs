//! MPU-6050 class gyroscope, Z axis only

use defmt::{info, warn};
use embedded_hal_async::i2c::I2c;
use micromouse::traits::{RateGyro, SensorError};

/// Fixed I2C address (AD0 low)
pub const ADDRESS: u8 = 0x68;

const WHO_AM_I: u8 = 0x75;
const WHO_AM_I_VALUE: u8 = 0x68;
const PWR_MGMT_1: u8 = 0x6B;
const ACCEL_CONFIG: u8 = 0x1C;
const GYRO_CONFIG: u8 = 0x1B;
const GYRO_ZOUT_H: u8 = 0x47;

/// ±2 g
const ACCEL_RANGE_2G: u8 = 0x00;
/// ±250 °/s, 131 counts per °/s
const GYRO_RANGE_250DPS: u8 = 0x00;

pub struct Mpu6050<I> {
    i2c: I,
}

impl<I: I2c> Mpu6050<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Wake the chip and select the ranges the yaw integration expects
    pub async fn init(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(WHO_AM_I).await?;
        if id != WHO_AM_I_VALUE {
            warn!("Gyroscope WHO_AM_I mismatch: {:#x}", id);
            return Err(SensorError::Bus);
        }
        self.write_register(PWR_MGMT_1, 0x00).await?;
        self.write_register(ACCEL_CONFIG, ACCEL_RANGE_2G).await?;
        self.write_register(GYRO_CONFIG, GYRO_RANGE_250DPS).await?;
        info!("Gyroscope initialized");
        Ok(())
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, SensorError> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[register], &mut value)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(value[0])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[register, value])
            .await
            .map_err(|_| SensorError::Bus)
    }
}

impl<I: I2c> RateGyro for Mpu6050<I> {
    async fn read_raw_rate(&mut self) -> Result<i16, SensorError> {
        let mut data = [0u8; 2];
        self.i2c
            .write_read(ADDRESS, &[GYRO_ZOUT_H], &mut data)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(i16::from_be_bytes(data))
    }
}
