//! Player preferences
//!
//! Persisted separately from progress under its own storage key.

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

pub const SETTINGS_KEY: &str = "transit_merge_settings";

/// Audio preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound effects on/off
    pub sfx_enabled: bool,
    /// Background music on/off
    pub bgm_enabled: bool,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sfx_enabled: true,
            bgm_enabled: true,
            music_volume: 0.3,
            sfx_volume: 0.8,
        }
    }
}

impl Settings {
    /// Flip sound effects; returns the new state
    pub fn toggle_sfx(&mut self) -> bool {
        self.sfx_enabled = !self.sfx_enabled;
        self.sfx_enabled
    }

    /// Flip background music; returns the new state
    pub fn toggle_bgm(&mut self) -> bool {
        self.bgm_enabled = !self.bgm_enabled;
        self.bgm_enabled
    }

    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Effective effects volume (0 when muted)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.sfx_enabled { self.sfx_volume } else { 0.0 }
    }

    /// Load from the store, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, SETTINGS_KEY) {
            Ok(Some(mut settings)) => {
                settings.set_music_volume(settings.music_volume);
                settings.set_sfx_volume(settings.sfx_volume);
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, SETTINGS_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_toggles() {
        let mut settings = Settings::default();
        assert!(!settings.toggle_sfx());
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert!(settings.toggle_sfx());
        assert_eq!(settings.effective_sfx_volume(), 0.8);
        assert!(!settings.toggle_bgm());
        assert!(!settings.bgm_enabled);
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.toggle_bgm();
        settings.set_sfx_volume(0.5);
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_and_corrupt_documents() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"sfx_enabled": false, "music_volume": 4.0}"#).unwrap();
        let settings = Settings::load(&store);
        assert!(!settings.sfx_enabled);
        assert!(settings.bgm_enabled);
        assert_eq!(settings.music_volume, 1.0);

        store.set(SETTINGS_KEY, "[not settings]").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }
}
