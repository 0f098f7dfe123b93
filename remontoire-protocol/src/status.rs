//! Read-only machine status
//!
//! One flat snapshot per query, cheap to clone and serialize. Sentinels
//! follow the wire contract: an unscheduled channel reports `-1` for its
//! next-rotation countdown, an inactive turbo reports `0` remaining.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capacity of the opaque network descriptor.
pub const NETWORK_DESC_LEN: usize = 64;

/// Per-channel status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelStatus {
    /// Configured turns per day
    pub tpd: u16,
    /// Direction plan wire code: +1 CW, -1 CCW, 0 alternate
    pub dir: i8,
    /// Milliseconds until the next scheduled rotation; -1 when
    /// unscheduled, floored at 0 when overdue
    pub next_ms: i32,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            tpd: 0,
            dir: 0,
            next_ms: -1,
        }
    }
}

/// Turbo override status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurboStatus {
    /// An override is in flight (includes the stopping phase)
    pub active: bool,
    /// The override is draining out
    pub stopping: bool,
    /// Channel selection flags
    pub selected: [bool; 2],
    /// Milliseconds left in the turbo window; 0 when expired or inactive
    pub left_ms: u32,
}

/// Complete machine status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusSnapshot {
    /// Opaque network descriptor, filled by the hosting layer
    pub network: String<NETWORK_DESC_LEN>,
    /// Whether winding is enabled
    pub enabled: bool,
    /// Committed mode switch position code (0 gentle, 1 manual, 2 brisk)
    pub switch_mode: u8,
    /// Per-channel status, channel 1 first
    pub channels: [ChannelStatus; 2],
    /// Turbo override status
    pub turbo: TurboStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_uses_sentinels() {
        let snapshot = StatusSnapshot::default();
        assert!(snapshot.network.is_empty());
        assert_eq!(snapshot.channels[0].next_ms, -1);
        assert_eq!(snapshot.channels[1].next_ms, -1);
        assert_eq!(snapshot.turbo.left_ms, 0);
        assert!(!snapshot.turbo.active);
    }
}
