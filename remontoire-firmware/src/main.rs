//! Remontoire - Dual Watch Winder Firmware
//!
//! Main firmware binary for RP2040-based dual watch winders. Each channel
//! keeps one automatic watch wound at a configured number of turns per
//! day, with a timed turbo override and a three-position hardware mode
//! switch. Named after the horological "remontoir" - the rewinding
//! mechanism that keeps a movement supplied with energy.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use {defmt_rtt as _, panic_probe as _};

use remontoire_core::config::WinderConfig;
use remontoire_core::engine::Engine;
use remontoire_drivers::stepper::Half4Wire;

mod board;
mod channels;
mod settings;
mod tasks;

use crate::settings::SettingsStore;
use crate::tasks::persist::persist_task;
use crate::tasks::winder::{scheduler_now, winder_task, UptimeClock};

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Remontoire firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Stored settings must be in memory before the first scheduling tick
    let mut store = SettingsStore::new(p.FLASH, p.DMA_CH0);
    let config = match store.load().await {
        Ok(config) => {
            info!("Settings loaded from flash");
            config
        }
        Err(e) => {
            warn!("No usable stored settings ({}); using defaults", e);
            WinderConfig::default()
        }
    };

    let mut engine = Engine::new(board::STEPS_PER_REV);
    engine.load_config(&config, scheduler_now());

    // Motor 1 (left): ULN2003 IN1..IN4
    let m1 = Half4Wire::new(
        [
            Output::new(p.PIN_2, Level::Low),
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_4, Level::Low),
            Output::new(p.PIN_5, Level::Low),
        ],
        UptimeClock,
        board::MOTOR_RPM,
        board::STEPS_PER_REV,
    );

    // Motor 2 (right): ULN2003 IN1..IN4
    let m2 = Half4Wire::new(
        [
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
            Output::new(p.PIN_8, Level::Low),
            Output::new(p.PIN_9, Level::Low),
        ],
        UptimeClock,
        board::MOTOR_RPM,
        board::STEPS_PER_REV,
    );

    // Three-position mode switch to ground, break-before-make
    let selector_a = Input::new(p.PIN_14, Pull::Up);
    let selector_b = Input::new(p.PIN_15, Pull::Up);

    // Onboard LED mirrors the run state
    let run_led = Output::new(p.PIN_25, Level::Low);

    unwrap!(spawner.spawn(winder_task(engine, [m1, m2], selector_a, selector_b, run_led)));
    unwrap!(spawner.spawn(persist_task(store)));

    info!("Boot complete");
}
