//! Quadrature encoder tasks
//!
//! One task per wheel waits for rising edges on channel A and samples
//! channel B to get the direction. The counts land in [`ENCODERS`], which the
//! motion controller reads and zeroes between moves.
//!
//! Both tasks are spawned on the interrupt executor in `main.rs`. Each wait
//! re-arms the pin interrupt, so a task that is polled late drops the edges
//! in between; the higher priority keeps that window to the executor latency.

use crate::system::resources::{LeftEncoderResources, RightEncoderResources};
use embassy_rp::gpio::{Input, Pull};
use micromouse::{EncoderCounter, Wheel};

/// Tick totals of both wheels
pub static ENCODERS: EncoderCounter = EncoderCounter::new();

/// Left wheel edge counter
#[embassy_executor::task]
pub async fn left_encoder(r: LeftEncoderResources) {
    let channel_a = Input::new(r.channel_a, Pull::Up);
    let channel_b = Input::new(r.channel_b, Pull::Up);
    count_edges(channel_a, channel_b, Wheel::Left).await;
}

/// Right wheel edge counter
#[embassy_executor::task]
pub async fn right_encoder(r: RightEncoderResources) {
    let channel_a = Input::new(r.channel_a, Pull::Up);
    let channel_b = Input::new(r.channel_b, Pull::Up);
    count_edges(channel_a, channel_b, Wheel::Right).await;
}

async fn count_edges(mut channel_a: Input<'static>, channel_b: Input<'static>, wheel: Wheel) -> ! {
    loop {
        channel_a.wait_for_rising_edge().await;
        ENCODERS.on_rising_edge(wheel, channel_b.is_high());
    }
}
