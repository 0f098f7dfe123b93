//! Configuration type definitions
//!
//! Per-channel winding parameters as the outside world sets them. Values
//! arriving from external layers are clamped and defaulted here, never
//! rejected: a configuration apply always succeeds.

use remontoire_protocol::ConfigFrame;

use crate::traits::Direction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest accepted turns-per-day setting.
pub const TPD_MAX: u16 = 1200;

/// Factory default turns per day (typical automatic movements want 650-800).
pub const TPD_DEFAULT: u16 = 650;

/// Direction plan for a winder channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DirectionPlan {
    /// Every rotation clockwise
    Clockwise,
    /// Every rotation counter-clockwise
    CounterClockwise,
    /// Flip direction on each issued rotation
    #[default]
    Alternate,
}

impl DirectionPlan {
    /// Decode the wire code: `+1` CW, `-1` CCW, `0` alternate.
    ///
    /// Unrecognized codes fall back to alternate rather than failing.
    pub fn from_wire(code: i8) -> Self {
        match code {
            1 => DirectionPlan::Clockwise,
            -1 => DirectionPlan::CounterClockwise,
            _ => DirectionPlan::Alternate,
        }
    }

    /// Wire code for status reporting.
    pub fn wire_code(self) -> i8 {
        match self {
            DirectionPlan::Clockwise => 1,
            DirectionPlan::CounterClockwise => -1,
            DirectionPlan::Alternate => 0,
        }
    }

    /// Pick the direction for the next issued rotation, updating the
    /// channel's alternate memory.
    ///
    /// Must be invoked exactly once per issued rotation: the alternate
    /// state only advances when a rotation actually happens.
    pub fn next_direction(self, last: &mut Direction) -> Direction {
        match self {
            DirectionPlan::Clockwise => {
                *last = Direction::Clockwise;
                Direction::Clockwise
            }
            DirectionPlan::CounterClockwise => {
                *last = Direction::CounterClockwise;
                Direction::CounterClockwise
            }
            DirectionPlan::Alternate => {
                *last = last.opposite();
                *last
            }
        }
    }
}

/// Winding parameters for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelConfig {
    /// Target full rotations per day; 0 disables the channel
    pub tpd: u16,
    /// Direction plan
    pub plan: DirectionPlan,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            tpd: TPD_DEFAULT,
            plan: DirectionPlan::Alternate,
        }
    }
}

/// Complete persistable winder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WinderConfig {
    /// One entry per channel
    pub channels: [ChannelConfig; 2],
}

impl WinderConfig {
    /// Sanitize a raw configuration frame.
    ///
    /// TPD values are clamped to `[0, TPD_MAX]`; direction codes outside
    /// `{-1, 0, +1}` default to alternate.
    pub fn from_frame(frame: &ConfigFrame) -> Self {
        Self {
            channels: [
                ChannelConfig {
                    tpd: clamp_tpd(frame.tpd1),
                    plan: DirectionPlan::from_wire(frame.dir1),
                },
                ChannelConfig {
                    tpd: clamp_tpd(frame.tpd2),
                    plan: DirectionPlan::from_wire(frame.dir2),
                },
            ],
        }
    }
}

fn clamp_tpd(raw: i32) -> u16 {
    raw.clamp(0, TPD_MAX as i32) as u16
}

/// Preset applied while the mode switch rests in the "gentle" position.
pub const PRESET_GENTLE: WinderConfig = WinderConfig {
    channels: [
        ChannelConfig {
            tpd: 500,
            plan: DirectionPlan::Alternate,
        },
        ChannelConfig {
            tpd: 500,
            plan: DirectionPlan::Alternate,
        },
    ],
};

/// Preset applied while the mode switch rests in the "brisk" position.
pub const PRESET_BRISK: WinderConfig = WinderConfig {
    channels: [
        ChannelConfig {
            tpd: 800,
            plan: DirectionPlan::Clockwise,
        },
        ChannelConfig {
            tpd: 800,
            plan: DirectionPlan::CounterClockwise,
        },
    ],
};
