//! Winder scheduling task
//!
//! Runs the cooperative scheduling tick in a tight loop: drain pending
//! commands, read the mode switch, tick the engine (which services both
//! step generators), mirror the run state on the LED, and periodically
//! publish a status snapshot.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Duration, Instant as Uptime, Timer};

use remontoire_core::clock::Instant;
use remontoire_core::engine::{Engine, SwitchPosition};
use remontoire_core::traits::Clock;
use remontoire_drivers::stepper::Half4Wire;
use remontoire_protocol::Command;

use crate::board::NETWORK_DESC;
use crate::channels::{COMMAND_CHANNEL, SETTINGS_SAVE, STATUS};

/// Pause between scheduling ticks.
///
/// Must stay well under the step interval (~976 us at 15 RPM) so the
/// step generators are never starved.
const TICK_PAUSE: Duration = Duration::from_micros(500);

/// How often a fresh status snapshot is published.
const STATUS_PERIOD: Duration = Duration::from_millis(250);

/// Microsecond time source backed by the embassy uptime clock.
#[derive(Clone, Copy)]
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_us(&self) -> u64 {
        Uptime::now().as_micros()
    }
}

/// Step generator type driven by this task.
pub type WinderStepper = Half4Wire<Output<'static>, UptimeClock>;

/// The scheduling timeline: wrapping uptime milliseconds.
pub(crate) fn scheduler_now() -> Instant {
    Instant::from_ms(Uptime::now().as_millis() as u32)
}

/// Winder task: exclusively owns the engine and both step generators.
///
/// Command mutations are drained between ticks, keeping them atomic with
/// respect to the tick boundary.
#[embassy_executor::task]
pub async fn winder_task(
    mut engine: Engine,
    mut steppers: [WinderStepper; 2],
    selector_a: Input<'static>,
    selector_b: Input<'static>,
    mut run_led: Output<'static>,
) {
    info!("Winder task started");

    // Prime the selector debouncer so the switch position is committed
    // before the first scheduling tick.
    for _ in 0..5 {
        engine.observe_selector(read_selector(&selector_a, &selector_b), scheduler_now());
        Timer::after_millis(10).await;
    }
    info!("Mode switch position: {}", engine.switch_position().wire_code());

    let mut last_status = Uptime::now();

    loop {
        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            handle_command(&mut engine, &mut steppers, command);
        }

        let now = scheduler_now();
        let raw = read_selector(&selector_a, &selector_b);
        engine.tick(now, raw, &mut steppers);

        if engine.enabled() {
            run_led.set_high();
        } else {
            run_led.set_low();
        }

        if last_status.elapsed() >= STATUS_PERIOD {
            last_status = Uptime::now();
            let mut status = engine.status(now);
            let _ = status.network.push_str(NETWORK_DESC);
            STATUS.signal(status);
        }

        Timer::after(TICK_PAUSE).await;
    }
}

fn handle_command(engine: &mut Engine, steppers: &mut [WinderStepper; 2], command: Command) {
    let now = scheduler_now();
    match command {
        Command::ApplyConfig(frame) => {
            let config = engine.apply_config(&frame, now);
            info!(
                "Config applied: tpd {}/{}, dir {}/{}",
                config.channels[0].tpd,
                config.channels[1].tpd,
                config.channels[0].plan.wire_code(),
                config.channels[1].plan.wire_code(),
            );
            if SETTINGS_SAVE.try_send(config).is_err() {
                warn!("Settings save queue full; keeping configuration in memory only");
            }
        }
        Command::SetEnabled(enabled) => {
            info!("Winding {}", if enabled { "started" } else { "stopped" });
            engine.set_enabled(enabled);
        }
        Command::StartTurbo(request) => {
            info!(
                "Turbo requested: m1={} m2={} minutes={}",
                request.m1, request.m2, request.minutes
            );
            engine.start_turbo(&request, now, &mut *steppers);
        }
    }
}

fn read_selector(a: &Input<'static>, b: &Input<'static>) -> SwitchPosition {
    SwitchPosition::decode(a.is_high(), b.is_high())
}
