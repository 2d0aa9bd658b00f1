//! RC button handling
//!
//! Turns the four remote control inputs into press and hold events for the
//! orchestrator. A hold is what stops a run, so it is reported as soon as
//! the threshold passes rather than on release.

use crate::system::event::{self, ButtonId, Events};
use crate::system::resources::{RCResourcesA, RCResourcesB, RCResourcesC, RCResourcesD};
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Level, Pull};
use embassy_time::{Duration, Timer};

/// Button hold threshold
const HOLD_DURATION: Duration = Duration::from_millis(700);

/// Button debounce delay
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

/// Button A: explore, hold to stop
#[embassy_executor::task]
pub async fn rc_button_a_handle(r: RCResourcesA) {
    handle_button(Input::new(r.btn_a, Pull::Down), ButtonId::A).await;
}

/// Button B: speed run
#[embassy_executor::task]
pub async fn rc_button_b_handle(r: RCResourcesB) {
    handle_button(Input::new(r.btn_b, Pull::Down), ButtonId::B).await;
}

/// Button C: speed profile
#[embassy_executor::task]
pub async fn rc_button_c_handle(r: RCResourcesC) {
    handle_button(Input::new(r.btn_c, Pull::Down), ButtonId::C).await;
}

/// Button D: turn strategy, hold to reset the goal
#[embassy_executor::task]
pub async fn rc_button_d_handle(r: RCResourcesD) {
    handle_button(Input::new(r.btn_d, Pull::Down), ButtonId::D).await;
}

/// Reports ButtonPressed for a short press, ButtonHoldStart/End for a long one
async fn handle_button(mut button: Input<'static>, id: ButtonId) -> ! {
    loop {
        if debounce(&mut button).await != Level::High {
            continue;
        }

        match select(Timer::after(HOLD_DURATION), debounce(&mut button)).await {
            Either::First(()) => {
                event::send(Events::ButtonHoldStart(id)).await;
                button.wait_for_low().await;
                event::send(Events::ButtonHoldEnd(id)).await;
            }
            Either::Second(_) => event::send(Events::ButtonPressed(id)).await,
        }
    }
}

/// Waits for an edge that is still there after the debounce delay
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let start_level = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end_level = button.get_level();
        if start_level != end_level {
            break end_level;
        }
    }
}
