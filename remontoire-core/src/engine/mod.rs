//! The cooperative scheduling engine
//!
//! One [`Engine`] owns all scheduling state: both winder channels, the
//! turbo override, the mode selector, and the run flag. External layers
//! mutate it only through the entry points here, between ticks; the tick
//! itself is a single non-blocking pass that must run every loop
//! iteration so the step queues stay serviced.

mod channel;
mod selector;
mod turbo;

pub use channel::{ChannelId, MotorChannel};
pub use selector::{ModeSelector, SwitchPosition, DEBOUNCE_MS};
pub use turbo::{TurboOverride, TURBO_MAX_MINUTES, TURBO_MIN_MINUTES};

use remontoire_protocol::{ChannelStatus, ConfigFrame, StatusSnapshot, TurboRequest, TurboStatus};

use crate::clock::Instant;
use crate::config::{ChannelConfig, WinderConfig};
use crate::traits::StepQueue;

/// The winder scheduling engine.
pub struct Engine {
    channels: [MotorChannel; 2],
    turbo: TurboOverride,
    selector: ModeSelector,
    enabled: bool,
}

impl Engine {
    /// Create an engine with both channels unscheduled and winding enabled.
    pub fn new(steps_per_rev: u32) -> Self {
        Self {
            channels: [
                MotorChannel::new(ChannelId::M1, steps_per_rev),
                MotorChannel::new(ChannelId::M2, steps_per_rev),
            ],
            turbo: TurboOverride::new(steps_per_rev),
            selector: ModeSelector::new(),
            enabled: true,
        }
    }

    /// Load a stored configuration before the first tick.
    pub fn load_config(&mut self, config: &WinderConfig, now: Instant) {
        for (channel, cfg) in self.channels.iter_mut().zip(config.channels.iter()) {
            channel.apply(*cfg, now);
        }
    }

    /// Apply a raw configuration frame from the outside world.
    ///
    /// Values are clamped/defaulted, both channels are updated, and both
    /// due times are re-derived from `now`. Never fails; returns the
    /// sanitized configuration for persistence.
    pub fn apply_config(&mut self, frame: &ConfigFrame, now: Instant) -> WinderConfig {
        let config = WinderConfig::from_frame(frame);
        self.load_config(&config, now);
        config
    }

    /// The currently effective configuration.
    pub fn config(&self) -> WinderConfig {
        WinderConfig {
            channels: [
                ChannelConfig {
                    tpd: self.channels[0].tpd(),
                    plan: self.channels[0].plan(),
                },
                ChannelConfig {
                    tpd: self.channels[1].tpd(),
                    plan: self.channels[1].plan(),
                },
            ],
        }
    }

    /// Toggle the run state. No other side effects.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether winding is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Committed mode switch position.
    pub fn switch_position(&self) -> SwitchPosition {
        self.selector.stable()
    }

    /// Start (or replace) a turbo override.
    pub fn start_turbo<S: StepQueue>(
        &mut self,
        request: &TurboRequest,
        now: Instant,
        steppers: &mut [S; 2],
    ) {
        let fallback = [
            self.channels[0].last_direction(),
            self.channels[1].last_direction(),
        ];
        self.turbo.start(
            now,
            [request.m1, request.m2],
            request.minutes,
            fallback,
            steppers,
        );
    }

    /// Feed a selector reading outside the tick (boot priming).
    pub fn observe_selector(&mut self, raw: SwitchPosition, now: Instant) {
        self.selector.update(raw, now);
    }

    /// One cooperative scheduling tick.
    ///
    /// Sequence: selector debounce and preset overlay, turbo state
    /// machine, then either the stop path (winding disabled) or step-queue
    /// service plus due-time evaluation. The step queues are polled on
    /// every branch; nothing here blocks or panics.
    pub fn tick<S: StepQueue>(&mut self, now: Instant, raw: SwitchPosition, steppers: &mut [S; 2]) {
        self.selector.update(raw, now);
        if let Some(preset) = self.selector.stable().preset() {
            // Continuous overlay: the preset wins over manual edits on
            // every tick while a preset position is committed
            for (channel, cfg) in self.channels.iter_mut().zip(preset.channels.iter()) {
                channel.overlay(*cfg, now);
            }
        }

        self.turbo.tick(now, steppers);

        if !self.enabled {
            // Halt without losing due times; the queues still get their
            // service call so in-flight deceleration can progress
            for stepper in steppers.iter_mut() {
                if stepper.distance_to_go() != 0 {
                    stepper.stop();
                }
                stepper.poll();
            }
            return;
        }

        for stepper in steppers.iter_mut() {
            stepper.poll();
        }

        for (index, (channel, stepper)) in self
            .channels
            .iter_mut()
            .zip(steppers.iter_mut())
            .enumerate()
        {
            if self.turbo.controls(index) {
                continue;
            }
            channel.service(now, stepper);
        }
    }

    /// Read-only status snapshot.
    ///
    /// The network descriptor is left empty; the hosting layer fills it.
    pub fn status(&self, now: Instant) -> StatusSnapshot {
        StatusSnapshot {
            network: Default::default(),
            enabled: self.enabled,
            switch_mode: self.selector.stable().wire_code(),
            channels: [
                channel_status(&self.channels[0], now),
                channel_status(&self.channels[1], now),
            ],
            turbo: TurboStatus {
                active: self.turbo.is_engaged(),
                stopping: self.turbo.is_stopping(),
                selected: self.turbo.selected(),
                left_ms: self.turbo.remaining_ms(now),
            },
        }
    }
}

fn channel_status(channel: &MotorChannel, now: Instant) -> ChannelStatus {
    ChannelStatus {
        tpd: channel.tpd(),
        dir: channel.plan().wire_code(),
        next_ms: channel.due_in_ms(now).map_or(-1, |ms| ms as i32),
    }
}
