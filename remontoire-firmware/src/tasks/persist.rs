//! Settings persistence task
//!
//! Flash writes involve sector erases and must never stall the scheduling
//! tick, so they happen here, fed by a channel from the winder task.

use defmt::*;

use crate::channels::SETTINGS_SAVE;
use crate::settings::SettingsStore;

/// Persist task: writes queued configurations to flash.
#[embassy_executor::task]
pub async fn persist_task(mut store: SettingsStore<'static>) {
    info!("Persist task started");

    loop {
        let config = SETTINGS_SAVE.receive().await;
        match store.save(&config).await {
            Ok(()) => debug!("Settings saved"),
            Err(e) => warn!("Settings save failed: {}; running from memory", e),
        }
    }
}
