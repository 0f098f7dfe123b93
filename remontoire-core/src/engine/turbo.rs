//! Turbo override state machine
//!
//! A turbo request supersedes per-channel scheduling for the selected
//! channels for a bounded number of minutes. Stopping is never abrupt:
//! once the window expires, each selected channel finishes whatever
//! distance is still queued before the override releases it back to the
//! scheduler.

use crate::clock::Instant;
use crate::traits::{Direction, StepQueue};

/// Shortest accepted turbo duration in minutes.
pub const TURBO_MIN_MINUTES: i32 = 1;

/// Longest accepted turbo duration in minutes.
pub const TURBO_MAX_MINUTES: i32 = 15;

/// Full rotations queued up-front per requested minute.
///
/// Deliberately over-provisioned so the channel does not need re-queuing
/// every revolution at high duty.
const BULK_REVS_PER_MINUTE: u32 = 6;

/// Full rotations re-queued when an active channel drains early.
const REFILL_REVS: u32 = 2;

/// Override lifecycle: `Idle -> Active -> Stopping -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TurboState {
    /// No override in flight
    Idle,
    /// Continuously rotating the selected channels until `end_at`
    Active { end_at: Instant },
    /// Window expired; waiting for queued distance to drain
    Stopping,
}

/// Timed high-speed override for one or both channels.
#[derive(Debug)]
pub struct TurboOverride {
    state: TurboState,
    selected: [bool; 2],
    /// Queued rotation direction per channel, fixed at start
    direction: [Direction; 2],
    steps_per_rev: u32,
}

impl TurboOverride {
    /// Create an idle override.
    pub fn new(steps_per_rev: u32) -> Self {
        Self {
            state: TurboState::Idle,
            selected: [false; 2],
            direction: [Direction::Clockwise; 2],
            steps_per_rev,
        }
    }

    /// Whether an override is in flight (active or stopping).
    pub fn is_engaged(&self) -> bool {
        !matches!(self.state, TurboState::Idle)
    }

    /// Whether the override is draining out.
    pub fn is_stopping(&self) -> bool {
        matches!(self.state, TurboState::Stopping)
    }

    /// Whether the override currently supersedes scheduling for `channel`.
    pub fn controls(&self, channel: usize) -> bool {
        self.is_engaged() && self.selected[channel]
    }

    /// Channel selection flags (all false while idle).
    pub fn selected(&self) -> [bool; 2] {
        self.selected
    }

    /// Milliseconds left in the turbo window; zero once expired or idle.
    pub fn remaining_ms(&self, now: Instant) -> u32 {
        match self.state {
            TurboState::Active { end_at } => {
                let left = end_at.since(now);
                if left < 0 {
                    0
                } else {
                    left as u32
                }
            }
            _ => 0,
        }
    }

    /// Engage the override, replacing any override already in flight.
    ///
    /// `minutes` is clamped to `[TURBO_MIN_MINUTES, TURBO_MAX_MINUTES]`.
    /// Each selected channel is bulk-queued in its currently-established
    /// direction: the sign of its in-flight remainder, or `fallback` when
    /// it sits idle.
    pub fn start<S: StepQueue>(
        &mut self,
        now: Instant,
        select: [bool; 2],
        minutes: i32,
        fallback: [Direction; 2],
        steppers: &mut [S; 2],
    ) {
        let minutes = minutes.clamp(TURBO_MIN_MINUTES, TURBO_MAX_MINUTES) as u32;

        self.selected = select;
        self.state = TurboState::Active {
            end_at: now.add_ms(minutes * 60_000),
        };

        let span = (BULK_REVS_PER_MINUTE * self.steps_per_rev * minutes) as i32;
        for (index, stepper) in steppers.iter_mut().enumerate() {
            if !select[index] {
                continue;
            }
            let direction = match stepper.distance_to_go() {
                0 => fallback[index],
                d if d > 0 => Direction::Clockwise,
                _ => Direction::CounterClockwise,
            };
            self.direction[index] = direction;
            stepper.move_by(direction.sign() * span);
        }
    }

    /// Drive the state machine one tick.
    pub fn tick<S: StepQueue>(&mut self, now: Instant, steppers: &mut [S; 2]) {
        match self.state {
            TurboState::Idle => {}

            TurboState::Active { end_at } => {
                if now.has_reached(end_at) {
                    // Expired: stop queuing, let in-flight motion finish
                    self.state = TurboState::Stopping;
                    return;
                }

                // Keep selected channels saturated with queued distance
                for (index, stepper) in steppers.iter_mut().enumerate() {
                    if self.selected[index] && stepper.distance_to_go() == 0 {
                        let refill = (REFILL_REVS * self.steps_per_rev) as i32;
                        stepper.move_by(self.direction[index].sign() * refill);
                    }
                }
            }

            TurboState::Stopping => {
                let all_done = steppers
                    .iter()
                    .enumerate()
                    .all(|(index, stepper)| {
                        !self.selected[index] || stepper.distance_to_go() == 0
                    });

                if all_done {
                    self.state = TurboState::Idle;
                    self.selected = [false; 2];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS_PER_REV: u32 = 4096;

    struct SimStepper {
        position: i64,
        target: i64,
        rate: i64,
        stop_calls: u32,
    }

    impl SimStepper {
        fn new(rate: i64) -> Self {
            Self {
                position: 0,
                target: 0,
                rate,
                stop_calls: 0,
            }
        }
    }

    impl StepQueue for SimStepper {
        fn move_by(&mut self, delta: i32) {
            self.target += delta as i64;
        }

        fn distance_to_go(&self) -> i32 {
            (self.target - self.position) as i32
        }

        fn poll(&mut self) {
            let togo = self.target - self.position;
            if togo != 0 {
                self.position += togo.signum() * togo.abs().min(self.rate);
            }
        }

        fn stop(&mut self) {
            self.stop_calls += 1;
            self.target = self.position;
        }
    }

    fn cw_fallback() -> [Direction; 2] {
        [Direction::Clockwise; 2]
    }

    #[test]
    fn test_bulk_queue_size() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            5,
            cw_fallback(),
            &mut steppers,
        );

        // 6 revs/minute * 4096 steps * 5 minutes
        assert_eq!(steppers[0].distance_to_go(), 122_880);
        assert_eq!(steppers[1].distance_to_go(), 0);
        assert!(turbo.controls(0));
        assert!(!turbo.controls(1));
    }

    #[test]
    fn test_minutes_clamped() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        turbo.start(
            Instant::from_ms(0),
            [true, true],
            0,
            cw_fallback(),
            &mut steppers,
        );
        assert_eq!(turbo.remaining_ms(Instant::from_ms(0)), 60_000);

        turbo.start(
            Instant::from_ms(0),
            [true, true],
            100,
            cw_fallback(),
            &mut steppers,
        );
        assert_eq!(turbo.remaining_ms(Instant::from_ms(0)), 15 * 60_000);
    }

    #[test]
    fn test_queues_in_established_direction() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        // Channel 0 is mid-rotation counter-clockwise
        steppers[0].move_by(-500);

        turbo.start(
            Instant::from_ms(0),
            [true, true],
            1,
            cw_fallback(),
            &mut steppers,
        );

        // Extends the in-flight CCW motion rather than reversing it
        assert_eq!(steppers[0].distance_to_go(), -500 - 24_576);
        // Idle channel falls back to its last scheduled direction
        assert_eq!(steppers[1].distance_to_go(), 24_576);
    }

    #[test]
    fn test_restart_replaces_override() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            5,
            cw_fallback(),
            &mut steppers,
        );
        turbo.start(
            Instant::from_ms(60_000),
            [false, true],
            10,
            cw_fallback(),
            &mut steppers,
        );

        assert!(!turbo.controls(0));
        assert!(turbo.controls(1));
        assert_eq!(turbo.remaining_ms(Instant::from_ms(60_000)), 10 * 60_000);
    }

    #[test]
    fn test_refill_while_active() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            1,
            cw_fallback(),
            &mut steppers,
        );

        // Drain the queued distance, then tick before expiry
        steppers[0].position = steppers[0].target;
        turbo.tick(Instant::from_ms(30_000), &mut steppers);

        assert_eq!(
            steppers[0].distance_to_go(),
            (REFILL_REVS * STEPS_PER_REV) as i32
        );
    }

    #[test]
    fn test_stopping_drains_without_force_clearing() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(4096), SimStepper::new(4096)];

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            1,
            cw_fallback(),
            &mut steppers,
        );

        // Expiry tick enters the stopping phase without touching motion
        let expiry = Instant::from_ms(60_000);
        turbo.tick(expiry, &mut steppers);
        assert!(turbo.is_stopping());
        assert!(steppers[0].distance_to_go() > 0);

        // Distance drains monotonically to exactly zero; stop() is never
        // used to cut it short
        let mut previous = steppers[0].distance_to_go();
        let mut now = expiry;
        while turbo.is_engaged() {
            now = now.add_ms(10);
            steppers[0].poll();
            let remaining = steppers[0].distance_to_go();
            assert!(remaining <= previous);
            previous = remaining;
            turbo.tick(now, &mut steppers);
        }
        assert_eq!(steppers[0].distance_to_go(), 0);
        assert_eq!(steppers[0].stop_calls, 0);
        assert_eq!(turbo.selected(), [false, false]);
    }

    #[test]
    fn test_unselected_channels_trivially_done() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(4096), SimStepper::new(4096)];

        // Channel 1 has unrelated queued distance and is not selected
        steppers[1].move_by(5000);

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            1,
            cw_fallback(),
            &mut steppers,
        );
        steppers[0].position = steppers[0].target;

        turbo.tick(Instant::from_ms(60_000), &mut steppers); // -> Stopping
        turbo.tick(Instant::from_ms(60_010), &mut steppers); // -> Idle

        assert!(!turbo.is_engaged());
    }

    #[test]
    fn test_remaining_ms_zero_when_idle_or_stopping() {
        let mut turbo = TurboOverride::new(STEPS_PER_REV);
        let mut steppers = [SimStepper::new(64), SimStepper::new(64)];

        assert_eq!(turbo.remaining_ms(Instant::from_ms(0)), 0);

        turbo.start(
            Instant::from_ms(0),
            [true, false],
            2,
            cw_fallback(),
            &mut steppers,
        );
        assert_eq!(turbo.remaining_ms(Instant::from_ms(30_000)), 90_000);

        turbo.tick(Instant::from_ms(120_000), &mut steppers);
        assert!(turbo.is_stopping());
        assert_eq!(turbo.remaining_ms(Instant::from_ms(120_000)), 0);
    }
}
