//! Per-channel turns-per-day scheduling
//!
//! Each winder channel carries an absolute due time for its next rotation.
//! Due times advance by whole intervals as rotations are issued; they are
//! never walked backward except by the bounded catch-up clamp, which drops
//! missed rotations after a long stall instead of bursting them out.

use crate::clock::{Instant, DAY_MS};
use crate::config::{ChannelConfig, DirectionPlan, TPD_MAX};
use crate::traits::{Direction, StepQueue};

/// Winder channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    /// Left mechanism
    M1,
    /// Right mechanism
    M2,
}

impl ChannelId {
    /// Both channels, in status order.
    pub const ALL: [ChannelId; 2] = [ChannelId::M1, ChannelId::M2];

    /// Index into per-channel arrays.
    pub fn index(self) -> usize {
        match self {
            ChannelId::M1 => 0,
            ChannelId::M2 => 1,
        }
    }
}

/// One independently scheduled winder mechanism.
///
/// Owned exclusively by the engine; mutated only through configuration
/// entry points and the scheduling tick.
#[derive(Debug)]
pub struct MotorChannel {
    id: ChannelId,
    tpd: u16,
    plan: DirectionPlan,
    last_direction: Direction,
    next_due: Option<Instant>,
    steps_per_rev: u32,
}

impl MotorChannel {
    /// Create an unscheduled channel.
    pub fn new(id: ChannelId, steps_per_rev: u32) -> Self {
        Self {
            id,
            tpd: 0,
            plan: DirectionPlan::default(),
            last_direction: Direction::Clockwise,
            next_due: None,
            steps_per_rev,
        }
    }

    /// Channel identifier.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Current turns-per-day setting.
    pub fn tpd(&self) -> u16 {
        self.tpd
    }

    /// Current direction plan.
    pub fn plan(&self) -> DirectionPlan {
        self.plan
    }

    /// Direction of the most recently issued rotation.
    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    /// Steps in one full rotation.
    pub fn steps_per_rev(&self) -> u32 {
        self.steps_per_rev
    }

    /// Milliseconds between rotations, or `None` while disabled.
    ///
    /// Integer division: turns-per-day is an average daily cadence, not an
    /// exact period.
    pub fn interval_ms(&self) -> Option<u32> {
        if self.tpd == 0 {
            None
        } else {
            Some(DAY_MS / self.tpd as u32)
        }
    }

    /// Re-derive the due time from `now`.
    ///
    /// Disabled channels (`tpd == 0`) become unscheduled.
    pub fn reschedule(&mut self, now: Instant) {
        self.next_due = self.interval_ms().map(|interval| now.add_ms(interval));
    }

    /// Apply an external configuration update.
    ///
    /// The due time is re-derived from `now` even when the values did not
    /// change.
    pub fn apply(&mut self, cfg: ChannelConfig, now: Instant) {
        self.tpd = cfg.tpd.min(TPD_MAX);
        self.plan = cfg.plan;
        self.reschedule(now);
    }

    /// Apply a preset overlay value.
    ///
    /// Unlike [`MotorChannel::apply`] this is change-detecting: the overlay
    /// re-applies its preset on every tick, and re-applying an unchanged
    /// TPD must not push the due time forward.
    pub fn overlay(&mut self, cfg: ChannelConfig, now: Instant) {
        self.plan = cfg.plan;
        let tpd = cfg.tpd.min(TPD_MAX);
        if tpd != self.tpd {
            self.tpd = tpd;
            self.reschedule(now);
        }
    }

    /// Milliseconds until the next rotation is due, floored at zero.
    ///
    /// `None` while the channel is unscheduled.
    pub fn due_in_ms(&self, now: Instant) -> Option<u32> {
        let due = self.next_due?;
        let remaining = due.since(now);
        Some(if remaining < 0 { 0 } else { remaining as u32 })
    }

    /// Evaluate the channel for one tick and issue at most one rotation.
    ///
    /// A rotation is issued only when the channel is scheduled, its due
    /// time has passed, and the step queue is idle. Returns the issued
    /// direction, if any.
    pub fn service<S: StepQueue>(&mut self, now: Instant, stepper: &mut S) -> Option<Direction> {
        let interval = self.interval_ms()?;
        let due = self.next_due?;
        if !now.has_reached(due) || stepper.distance_to_go() != 0 {
            return None;
        }

        let direction = self.plan.next_direction(&mut self.last_direction);
        stepper.move_by(direction.sign() * self.steps_per_rev as i32);

        let mut next = due.add_ms(interval);
        // Catch-up clamp: after a long stall, drop the backlog rather than
        // replaying every missed rotation.
        if now.since(next) > 2 * interval as i32 {
            next = now.add_ms(interval);
        }
        self.next_due = Some(next);

        Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEPS_PER_REV: u32 = 4096;

    /// Step queue that consumes a fixed number of steps per poll.
    struct SimStepper {
        position: i64,
        target: i64,
        rate: i64,
    }

    impl SimStepper {
        fn new(rate: i64) -> Self {
            Self {
                position: 0,
                target: 0,
                rate,
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
            self.target = self.position;
        }
    }

    fn channel_with_tpd(tpd: u16, now: Instant) -> MotorChannel {
        let mut ch = MotorChannel::new(ChannelId::M1, STEPS_PER_REV);
        ch.apply(
            ChannelConfig {
                tpd,
                plan: DirectionPlan::Clockwise,
            },
            now,
        );
        ch
    }

    #[test]
    fn test_interval_truncates() {
        let ch = channel_with_tpd(650, Instant::from_ms(0));
        assert_eq!(ch.interval_ms(), Some(132_923));
    }

    #[test]
    fn test_zero_tpd_never_schedules() {
        let mut ch = channel_with_tpd(0, Instant::from_ms(0));
        let mut stepper = SimStepper::new(i64::MAX);

        assert_eq!(ch.interval_ms(), None);
        assert_eq!(ch.due_in_ms(Instant::from_ms(0)), None);

        for ms in (0..DAY_MS).step_by(60_000) {
            assert!(ch.service(Instant::from_ms(ms), &mut stepper).is_none());
        }
        assert_eq!(stepper.distance_to_go(), 0);
    }

    #[test]
    fn test_rotations_issue_on_interval_boundaries() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(1200, t0); // interval 72_000
        let mut stepper = SimStepper::new(i64::MAX);

        assert!(ch
            .service(Instant::from_ms(71_999), &mut stepper)
            .is_none());

        let issued = ch.service(Instant::from_ms(72_000), &mut stepper);
        assert_eq!(issued, Some(Direction::Clockwise));
        assert_eq!(stepper.distance_to_go(), STEPS_PER_REV as i32);
        stepper.poll();

        // One interval later, exactly one more
        assert!(ch
            .service(Instant::from_ms(143_999), &mut stepper)
            .is_none());
        assert!(ch
            .service(Instant::from_ms(144_000), &mut stepper)
            .is_some());
    }

    #[test]
    fn test_no_rotation_while_motion_in_flight() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(1200, t0);
        let mut stepper = SimStepper::new(64);

        assert!(ch.service(Instant::from_ms(72_000), &mut stepper).is_some());
        // Queue still draining: a passed due time does not stack a second
        // rotation
        assert!(ch.service(Instant::from_ms(72_001), &mut stepper).is_none());
    }

    #[test]
    fn test_alternate_strictly_alternates_issued_rotations() {
        let t0 = Instant::from_ms(0);
        let mut ch = MotorChannel::new(ChannelId::M2, STEPS_PER_REV);
        ch.apply(
            ChannelConfig {
                tpd: 1200,
                plan: DirectionPlan::Alternate,
            },
            t0,
        );
        let mut stepper = SimStepper::new(i64::MAX);

        let mut previous: Option<Direction> = None;
        let mut issued = 0;
        let mut now = t0;
        while issued < 6 {
            now = now.add_ms(1_000);
            stepper.poll();
            if let Some(dir) = ch.service(now, &mut stepper) {
                if let Some(prev) = previous {
                    assert_eq!(dir, prev.opposite());
                }
                previous = Some(dir);
                issued += 1;
            }
        }
    }

    #[test]
    fn test_catch_up_clamp_drops_backlog() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(1200, t0); // interval 72_000
        let mut stepper = SimStepper::new(i64::MAX);

        // Ten intervals elapse without evaluation (e.g. scheduling disabled)
        let late = Instant::from_ms(10 * 72_000);
        assert!(ch.service(late, &mut stepper).is_some());

        // The backlog is dropped: next due is one interval from now, not
        // nine intervals in the past
        assert_eq!(ch.due_in_ms(late), Some(72_000));
    }

    #[test]
    fn test_small_lag_keeps_whole_interval_arithmetic() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(1200, t0);
        let mut stepper = SimStepper::new(i64::MAX);

        // Evaluated one tick late: due advances by exactly one interval
        // from the original due time, preserving the cadence
        let late = Instant::from_ms(72_500);
        assert!(ch.service(late, &mut stepper).is_some());
        assert_eq!(ch.due_in_ms(late), Some(144_000 - 72_500));
    }

    #[test]
    fn test_apply_rederives_due_time() {
        let t0 = Instant::from_ms(5_000);
        let mut ch = channel_with_tpd(1200, t0);
        assert_eq!(ch.due_in_ms(t0), Some(72_000));

        // Same values, later apply: due time still re-derived
        let t1 = Instant::from_ms(50_000);
        ch.apply(
            ChannelConfig {
                tpd: 1200,
                plan: DirectionPlan::Clockwise,
            },
            t1,
        );
        assert_eq!(ch.due_in_ms(t1), Some(72_000));
    }

    #[test]
    fn test_overlay_is_change_detecting() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(500, t0);
        let due_before = ch.due_in_ms(t0);

        // Re-applying the same preset value must not move the due time
        ch.overlay(
            ChannelConfig {
                tpd: 500,
                plan: DirectionPlan::Alternate,
            },
            Instant::from_ms(30_000),
        );
        assert_eq!(
            ch.due_in_ms(t0),
            due_before,
            "unchanged overlay moved the due time"
        );

        // A different value re-derives from now
        let t1 = Instant::from_ms(40_000);
        ch.overlay(
            ChannelConfig {
                tpd: 800,
                plan: DirectionPlan::Alternate,
            },
            t1,
        );
        assert_eq!(ch.due_in_ms(t1), Some(DAY_MS / 800));
    }

    #[test]
    fn test_setting_tpd_zero_clears_due_time() {
        let t0 = Instant::from_ms(0);
        let mut ch = channel_with_tpd(650, t0);
        assert!(ch.due_in_ms(t0).is_some());

        ch.apply(
            ChannelConfig {
                tpd: 0,
                plan: DirectionPlan::Clockwise,
            },
            t0,
        );
        assert_eq!(ch.due_in_ms(t0), None);
    }

    #[test]
    fn test_due_in_ms_floors_at_zero() {
        let t0 = Instant::from_ms(0);
        let ch = channel_with_tpd(1200, t0);
        assert_eq!(ch.due_in_ms(Instant::from_ms(100_000)), Some(0));
    }

    #[test]
    fn test_scheduling_across_counter_wrap() {
        let t0 = Instant::from_ms(u32::MAX - 30_000);
        let mut ch = channel_with_tpd(1200, t0); // due wraps past zero
        let mut stepper = SimStepper::new(i64::MAX);

        assert!(ch.service(Instant::from_ms(u32::MAX), &mut stepper).is_none());

        let due = t0.add_ms(72_000);
        assert!(ch.service(due, &mut stepper).is_some());
        assert_eq!(ch.due_in_ms(due), Some(72_000));
    }

    proptest! {
        #[test]
        fn prop_interval_is_truncating_division(tpd in 1u16..=1200) {
            let ch = channel_with_tpd(tpd, Instant::from_ms(0));
            prop_assert_eq!(ch.interval_ms(), Some(86_400_000 / tpd as u32));
        }

        #[test]
        fn prop_due_time_advances_by_whole_intervals(
            tpd in 600u16..=1200,
            lateness in 0u32..10_000,
        ) {
            let t0 = Instant::from_ms(0);
            let mut ch = channel_with_tpd(tpd, t0);
            let interval = ch.interval_ms().unwrap();
            let mut stepper = SimStepper::new(i64::MAX);

            let eval = Instant::from_ms(interval + lateness);
            prop_assert!(ch.service(eval, &mut stepper).is_some());
            // Lateness below the clamp threshold never resets the cadence
            let due = eval.add_ms(ch.due_in_ms(eval).unwrap());
            prop_assert_eq!(due.as_ms(), 2 * interval);
        }
    }
}
