//! Events raised by the orchestrator, delivered synchronously per tick

use serde::{Deserialize, Serialize};

use super::catalog::ItemKind;
use super::merge::MergeEvent;
use super::world::BodyId;

/// A kind seen for the first time this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub kind: ItemKind,
    /// The kind joins the random drop pool from now on
    pub newly_droppable: bool,
}

/// Final tally of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverEvent {
    pub final_score: u64,
    pub high_score: u64,
    pub new_record: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player dropped an item
    Dropped { body: BodyId, kind: ItemKind, x: f32 },
    Merged(MergeEvent),
    Discovered(Discovery),
    /// A new item is ready to drop
    NextItem(ItemKind),
    GameOver(GameOverEvent),
    /// Fresh run started; unlocked kinds are back to the initial set
    Restarted,
}
