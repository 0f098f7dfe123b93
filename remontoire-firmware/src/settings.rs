//! Persisted winder settings
//!
//! The channel configuration (TPD and direction plan per channel) must
//! survive a power cycle. It is postcard-encoded and kept in a
//! wear-leveled sequential-storage map in the top flash sectors, which
//! memory.x excludes from the program image. Turbo and mode-debounce
//! state are deliberately not persisted.

use core::ops::Range;

use embassy_rp::dma::Channel as DmaChannel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use remontoire_core::config::WinderConfig;

/// Total flash size on the target board.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Space reserved at the top of flash for settings wear leveling.
const SETTINGS_PARTITION_SIZE: usize = 64 * 1024;

/// Flash range of the settings partition.
const SETTINGS_RANGE: Range<u32> =
    (FLASH_SIZE - SETTINGS_PARTITION_SIZE) as u32..FLASH_SIZE as u32;

/// Map key for the winder configuration entry.
const KEY_WINDER_CONFIG: u8 = 0;

/// Scratch buffer size for map operations; the encoded config is a few
/// dozen bytes.
const SCRATCH_SIZE: usize = 128;

/// Errors from settings storage.
///
/// None of these are fatal: the firmware degrades to in-memory defaults
/// and keeps scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// No stored settings yet (first boot or erased flash)
    NotFound,
    /// Storage layer failure
    Storage,
    /// Stored bytes did not decode
    Corrupted,
}

/// Settings store over the on-board flash.
pub struct SettingsStore<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> SettingsStore<'d> {
    /// Create a settings store over the flash peripheral.
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl DmaChannel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Load the stored configuration.
    pub async fn load(&mut self) -> Result<WinderConfig, SettingsError> {
        let mut buffer = [0u8; SCRATCH_SIZE];
        let data = map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &KEY_WINDER_CONFIG,
        )
        .await
        .map_err(|_| SettingsError::Storage)?
        .ok_or(SettingsError::NotFound)?;

        postcard::from_bytes(data).map_err(|_| SettingsError::Corrupted)
    }

    /// Store a configuration. Called after every successful apply.
    pub async fn save(&mut self, config: &WinderConfig) -> Result<(), SettingsError> {
        let mut encoded = [0u8; SCRATCH_SIZE];
        let used = postcard::to_slice(config, &mut encoded)
            .map_err(|_| SettingsError::Corrupted)?
            .len();
        let data = &encoded[..used];

        let mut buffer = [0u8; SCRATCH_SIZE];
        map::store_item(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &KEY_WINDER_CONFIG,
            &data,
        )
        .await
        .map_err(|_| SettingsError::Storage)
    }
}
