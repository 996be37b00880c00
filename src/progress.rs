//! Persisted progress: best score and discovered items
//!
//! Read once at startup, written whenever either value changes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::catalog::{self, ItemKind};
use crate::sim::{GameEvent, GameSession};
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

pub const HIGH_SCORE_KEY: &str = "transit_merge_high_score";
pub const UNLOCKED_KEY: &str = "transit_merge_unlocked";

/// One catalog row as the encyclopedia shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncyclopediaEntry {
    pub kind: ItemKind,
    pub level: u8,
    pub name: &'static str,
    pub korean_name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub radius: f32,
    pub score: u32,
    pub successor: Option<ItemKind>,
    pub unlocked: bool,
}

/// Full catalog annotated with what this player has found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encyclopedia {
    pub entries: Vec<EncyclopediaEntry>,
    pub highest_level: Option<u8>,
    pub discovered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub high_score: u64,
    pub unlocked: BTreeSet<ItemKind>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            high_score: 0,
            unlocked: catalog::initial_unlocked(),
        }
    }
}

impl Progress {
    /// Load from the store; missing or corrupt values fall back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut progress = Self::default();

        match load_json::<u64>(store, HIGH_SCORE_KEY) {
            Ok(Some(score)) => progress.high_score = score,
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring stored high score: {}", e),
        }

        // Stored as level numbers so unknown entries can be skipped one by one
        match load_json::<Vec<u8>>(store, UNLOCKED_KEY) {
            Ok(Some(levels)) => {
                let known = levels.iter().filter_map(|&l| ItemKind::from_level(l));
                progress.unlocked.extend(known);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring stored unlocked items: {}", e),
        }

        log::info!(
            "Loaded progress: high score {}, {} kinds unlocked",
            progress.high_score,
            progress.unlocked.len()
        );
        progress
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, HIGH_SCORE_KEY, &self.high_score)?;
        let levels: Vec<u8> = self.unlocked.iter().map(|k| k.level()).collect();
        save_json(store, UNLOCKED_KEY, &levels)?;
        log::debug!("Progress saved");
        Ok(())
    }

    /// Snapshot of the persisted fields of a session
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            high_score: session.high_score,
            unlocked: session.unlocked.clone(),
        }
    }

    /// Whether an event changes anything this struct persists
    pub fn affected_by(event: &GameEvent) -> bool {
        match event {
            GameEvent::Discovered(_) | GameEvent::Restarted => true,
            GameEvent::GameOver(over) => over.new_record,
            _ => false,
        }
    }

    pub fn is_unlocked(&self, kind: ItemKind) -> bool {
        self.unlocked.contains(&kind)
    }

    pub fn highest_level(&self) -> Option<u8> {
        catalog::highest_level(&self.unlocked)
    }

    pub fn encyclopedia(&self) -> Encyclopedia {
        let entries = catalog::catalog()
            .iter()
            .map(|info| EncyclopediaEntry {
                kind: info.kind,
                level: info.level,
                name: info.name,
                korean_name: info.korean_name,
                emoji: info.emoji,
                description: info.description,
                radius: info.radius,
                score: info.score,
                successor: info.successor,
                unlocked: self.is_unlocked(info.kind),
            })
            .collect();
        Encyclopedia {
            entries,
            highest_level: self.highest_level(),
            discovered: self.unlocked.len(),
        }
    }
}
