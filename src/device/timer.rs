//! Control loop clock on top of the embassy time driver

use embassy_time::{Instant, Timer};
use micromouse::traits::ControlTimer;

pub struct EmbassyTimer;

impl ControlTimer for EmbassyTimer {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn wait_ms(&mut self, ms: u64) {
        Timer::after_millis(ms).await;
    }
}
