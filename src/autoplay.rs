//! Demo player
//!
//! Drives a game without input: aims the next item at a resting body of the
//! same kind when one is reachable from above, otherwise picks a random
//! column. Used by the headless runner and integration tests.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::Game;

pub struct AutoPlayer {
    rng: Pcg32,
    /// Ticks to wait after each drop on top of the game's own cooldown
    think_ticks: u32,
    wait: u32,
}

impl AutoPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0xA070_91A7),
            think_ticks: 30,
            wait: 0,
        }
    }

    pub fn with_think_ticks(mut self, ticks: u32) -> Self {
        self.think_ticks = ticks;
        self
    }

    /// Choose where the next item should go, if anything can be dropped
    pub fn choose_x(&mut self, game: &Game) -> Option<f32> {
        let next = game.next_item()?;
        let radius = next.radius();

        // Highest (smallest y) same-kind body: most likely to be reachable
        let target = game
            .world()
            .bodies()
            .iter()
            .filter(|b| b.kind == next)
            .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y).then(a.id.cmp(&b.id)));

        let x = match target {
            Some(body) => body.pos.x,
            None => {
                let width = game.tuning().width;
                self.rng.random_range(radius..=(width - radius).max(radius))
            }
        };
        Some(game.preview_x(x))
    }

    /// Called once per tick; drops when allowed. Returns true on a drop.
    pub fn update(&mut self, game: &mut Game) -> bool {
        if game.is_game_over() {
            return false;
        }
        if game.pending_discovery().is_some() {
            game.dismiss_discovery();
        }
        if self.wait > 0 {
            self.wait -= 1;
            return false;
        }
        if game.session().cooldown_active() {
            return false;
        }
        let Some(x) = self.choose_x(game) else {
            return false;
        };
        if game.drop_item(x).is_some() {
            self.wait = self.think_ticks;
            true
        } else {
            false
        }
    }
}
