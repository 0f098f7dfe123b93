//! Half-step driver for 4-wire unipolar steppers
//!
//! Generates the 8-phase half-step coil sequence on four GPIO outputs at a
//! fixed step rate. Implements the core's [`StepQueue`] contract: queued
//! distance is consumed one step per [`StepQueue::poll`] call when a step
//! interval has elapsed, so the caller's poll frequency bounds the
//! achievable rate.

use embedded_hal::digital::OutputPin;

use remontoire_core::traits::{Clock, StepQueue};

/// Coil energize pattern for one half-step cycle, IN1..IN4.
///
/// Walking this table forward turns the rotor clockwise; the winding
/// order matches the usual 28BYJ-48 / ULN2003 breakout pinout.
const HALF_STEP_SEQUENCE: [[bool; 4]; 8] = [
    [true, false, false, false],
    [true, true, false, false],
    [false, true, false, false],
    [false, true, true, false],
    [false, false, true, false],
    [false, false, true, true],
    [false, false, false, true],
    [true, false, false, true],
];

/// Lowest usable step rate in steps per second.
pub const MIN_SPS: u32 = 50;

/// Highest reliable step rate for this motor class in steps per second.
pub const MAX_SPS: u32 = 1200;

/// Step rate for a target output-shaft RPM, clamped to the motor's
/// usable range.
pub fn steps_per_second(rpm: u16, steps_per_rev: u32) -> u32 {
    (rpm as u32 * steps_per_rev / 60).clamp(MIN_SPS, MAX_SPS)
}

/// Fixed-rate half-step generator over four coil outputs.
///
/// Position bookkeeping is signed and relative: `move_by` extends the
/// target, `distance_to_go` reports the signed remainder. Coils are
/// de-energized whenever the queue is idle; holding torque is not needed
/// on a winder and the motor runs cooler for it.
pub struct Half4Wire<P: OutputPin, C: Clock> {
    pins: [P; 4],
    clock: C,
    step_interval_us: u64,
    last_step_us: u64,
    phase: u8,
    position: i64,
    target: i64,
    energized: bool,
}

impl<P: OutputPin, C: Clock> Half4Wire<P, C> {
    /// Create a driver over the four coil outputs IN1..IN4.
    pub fn new(pins: [P; 4], clock: C, rpm: u16, steps_per_rev: u32) -> Self {
        let sps = steps_per_second(rpm, steps_per_rev);
        let mut driver = Self {
            pins,
            clock,
            step_interval_us: 1_000_000 / sps as u64,
            last_step_us: 0,
            phase: 0,
            position: 0,
            target: 0,
            energized: false,
        };
        driver.release();
        driver
    }

    /// Current half-step phase index (0..8).
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Net steps emitted since creation.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Microseconds between steps at the configured rate.
    pub fn step_interval_us(&self) -> u64 {
        self.step_interval_us
    }

    fn energize_phase(&mut self) {
        let pattern = HALF_STEP_SEQUENCE[self.phase as usize];
        for (pin, on) in self.pins.iter_mut().zip(pattern.iter()) {
            let _ = if *on { pin.set_high() } else { pin.set_low() };
        }
        self.energized = true;
    }

    fn release(&mut self) {
        for pin in self.pins.iter_mut() {
            let _ = pin.set_low();
        }
        self.energized = false;
    }

    fn step_once(&mut self, forward: bool) {
        if forward {
            self.phase = (self.phase + 1) & 7;
            self.position += 1;
        } else {
            self.phase = (self.phase + 7) & 7;
            self.position -= 1;
        }
        self.energize_phase();
    }
}

impl<P: OutputPin, C: Clock> StepQueue for Half4Wire<P, C> {
    fn move_by(&mut self, delta: i32) {
        self.target += delta as i64;
    }

    fn distance_to_go(&self) -> i32 {
        (self.target - self.position) as i32
    }

    fn poll(&mut self) {
        let togo = self.target - self.position;
        if togo == 0 {
            if self.energized {
                self.release();
            }
            return;
        }

        let now = self.clock.now_us();
        if now.wrapping_sub(self.last_step_us) < self.step_interval_us {
            return;
        }
        self.last_step_us = now;
        self.step_once(togo > 0);
    }

    fn stop(&mut self) {
        self.target = self.position;
    }
}
