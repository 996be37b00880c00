//! Transit Merge - a transportation-themed physics merge game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, merges, loss check, game flow)
//! - `tuning`: Data-driven game balance
//! - `storage`: Key-value persistence boundary (files natively, LocalStorage on web)
//! - `progress`: Persisted high score and discovered items
//! - `settings`: Audio preferences
//! - `audio`: Sound service driven by game events
//! - `autoplay`: Demo player used by the headless runner

pub mod audio;
pub mod autoplay;
pub mod progress;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use progress::Progress;
pub use settings::Settings;
pub use sim::{Game, GameEvent, ItemKind};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for stable stacking)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the accumulator accepts (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Play area dimensions (pixels, y grows downward)
    pub const GAME_WIDTH: f32 = 320.0;
    pub const GAME_HEIGHT: f32 = 480.0;
    /// Warning line as a fraction of the height, measured from the top
    pub const WARNING_LINE_RATIO: f32 = 0.15;

    /// Highest level that may be offered as a drop; larger items only come from merges
    pub const DROPPABLE_MAX_LEVEL: u8 = 4;
}

/// Convert a duration in seconds to whole simulation ticks (rounded)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u32 {
    (secs / consts::SIM_DT).round().max(0.0) as u32
}
