//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy
//! tasks. Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use remontoire_core::config::WinderConfig;
use remontoire_protocol::{Command, StatusSnapshot};

/// Channel capacity for pending control commands
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for queued settings writes
const SAVE_CHANNEL_SIZE: usize = 2;

/// Control commands from the front-end layer.
///
/// Drained by the winder task between scheduling ticks, which keeps every
/// mutation atomic with respect to the tick boundary.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Latest status snapshot, refreshed periodically by the winder task.
/// Consumed by whatever front-end layer is attached.
pub static STATUS: Signal<CriticalSectionRawMutex, StatusSnapshot> = Signal::new();

/// Sanitized configurations awaiting a flash write.
pub static SETTINGS_SAVE: Channel<CriticalSectionRawMutex, WinderConfig, SAVE_CHANNEL_SIZE> =
    Channel::new();
