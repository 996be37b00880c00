//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body id)
//! - No rendering or platform dependencies

pub mod catalog;
pub mod events;
pub mod game;
pub mod merge;
pub mod monitor;
pub mod session;
pub mod world;

pub use catalog::{ItemInfo, ItemKind};
pub use events::{Discovery, GameEvent, GameOverEvent};
pub use game::Game;
pub use merge::{MergeEvent, resolve_merges};
pub use monitor::{LossMonitor, OverflowSignal};
pub use session::{GameSession, choose_next_item};
pub use world::{Body, BodyId, BodySnapshot, CollisionStart, PhysicsWorld};
