//! Mode switch debouncing and preset lookup
//!
//! A three-position switch on two pulled-up input lines selects between
//! two fixed presets and a manual position. Raw readings are debounced;
//! only the committed stable position drives the preset overlay.

use crate::clock::Instant;
use crate::config::{WinderConfig, PRESET_BRISK, PRESET_GENTLE};

/// How long a raw reading must hold before it becomes the stable position.
pub const DEBOUNCE_MS: u32 = 40;

/// Logical positions of the mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchPosition {
    /// Low-cadence preset, both channels alternating
    Gentle,
    /// Configuration left entirely to external updates
    #[default]
    Manual,
    /// High-cadence preset, opposed fixed directions
    Brisk,
}

impl SwitchPosition {
    /// Decode the two selector lines (pulled up, switched to ground).
    ///
    /// Unrecognized combinations read as manual rather than faulting.
    pub fn decode(a_high: bool, b_high: bool) -> Self {
        match (a_high, b_high) {
            (false, true) => SwitchPosition::Gentle,
            (true, true) => SwitchPosition::Manual,
            (true, false) => SwitchPosition::Brisk,
            _ => SwitchPosition::Manual,
        }
    }

    /// Preset overlay for this position; `None` in the manual position.
    pub fn preset(self) -> Option<&'static WinderConfig> {
        match self {
            SwitchPosition::Gentle => Some(&PRESET_GENTLE),
            SwitchPosition::Manual => None,
            SwitchPosition::Brisk => Some(&PRESET_BRISK),
        }
    }

    /// Numeric position code for status reporting.
    pub fn wire_code(self) -> u8 {
        match self {
            SwitchPosition::Gentle => 0,
            SwitchPosition::Manual => 1,
            SwitchPosition::Brisk => 2,
        }
    }
}

/// Debouncer for the mode switch.
///
/// The stable position only changes after a candidate reading persists
/// unchanged for the debounce window. Debounce state is never persisted;
/// every boot starts from the manual position until the first commit.
#[derive(Debug)]
pub struct ModeSelector {
    candidate: SwitchPosition,
    candidate_since: Instant,
    stable: SwitchPosition,
}

impl ModeSelector {
    /// Create a selector with no committed reading.
    pub fn new() -> Self {
        Self {
            candidate: SwitchPosition::Manual,
            candidate_since: Instant::from_ms(0),
            stable: SwitchPosition::Manual,
        }
    }

    /// The committed switch position.
    pub fn stable(&self) -> SwitchPosition {
        self.stable
    }

    /// Feed one raw reading.
    ///
    /// A changed reading restarts the window; an unchanged reading commits
    /// once it has held for [`DEBOUNCE_MS`].
    pub fn update(&mut self, raw: SwitchPosition, now: Instant) {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = now;
        } else if now.since(self.candidate_since) >= DEBOUNCE_MS as i32 {
            self.stable = self.candidate;
        }
    }
}

impl Default for ModeSelector {
    fn default() -> Self {
        Self::new()
    }
}
