//! Mutation commands from the configuration front-end
//!
//! Values are carried exactly as received; sanitization happens in the
//! engine so that every command path reports success.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw per-channel configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfigFrame {
    /// Channel 1 turns per day (clamped to [0, 1200] by the engine)
    pub tpd1: i32,
    /// Channel 2 turns per day
    pub tpd2: i32,
    /// Channel 1 direction code: +1 CW, -1 CCW, 0 alternate
    pub dir1: i8,
    /// Channel 2 direction code
    pub dir2: i8,
}

/// Request to engage the turbo override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurboRequest {
    /// Apply to channel 1
    pub m1: bool,
    /// Apply to channel 2
    pub m2: bool,
    /// Requested duration in minutes (clamped to [1, 15] by the engine)
    pub minutes: i32,
}

/// A mutation entry point invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Update both channels' winding parameters and persist them
    ApplyConfig(ConfigFrame),
    /// Toggle winding on or off; no other side effects
    SetEnabled(bool),
    /// Engage (or replace) the turbo override
    StartTurbo(TurboRequest),
}
