//! Game orchestrator
//!
//! The only entry point for UI input. Sequences drop -> settle -> merge or
//! rest -> next item, owns score and discovery bookkeeping, and runs the fixed
//! timestep loop that drives physics, merge resolution and the loss check.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::catalog::{self, INITIAL_UNLOCKED, ItemKind};
use super::events::{Discovery, GameEvent, GameOverEvent};
use super::merge::{MergeEvent, resolve_merges};
use super::monitor::LossMonitor;
use super::session::{GameSession, choose_next_item};
use super::world::{BodyId, BodySnapshot, PhysicsWorld};
use crate::consts::*;
use crate::progress::Progress;
use crate::tuning::Tuning;

pub struct Game {
    tuning: Tuning,
    seed: u64,
    world: PhysicsWorld,
    monitor: LossMonitor,
    session: GameSession,
    rng: Pcg32,
    /// UI-level pause state (modals, hidden tab)
    ui_active: bool,
    accumulator: f32,
    time_ticks: u64,
    /// Events raised since the last drain
    events: Vec<GameEvent>,
}

impl Game {
    /// Start a session with persisted progress
    pub fn new(tuning: Tuning, seed: u64, progress: &Progress) -> Self {
        let mut world = PhysicsWorld::new(&tuning, seed);
        world.initialize(tuning.width, tuning.height);

        let mut unlocked = catalog::initial_unlocked();
        unlocked.extend(progress.unlocked.iter().copied());

        log::info!("Game started with seed {} (high score {})", seed, progress.high_score);

        Self {
            monitor: LossMonitor::new(&tuning),
            session: GameSession::new(progress.high_score, unlocked),
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            seed,
            world,
            ui_active: true,
            accumulator: 0.0,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn score(&self) -> u64 {
        self.session.score
    }

    pub fn high_score(&self) -> u64 {
        self.session.high_score
    }

    pub fn next_item(&self) -> Option<ItemKind> {
        self.session.next_item
    }

    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    pub fn pending_discovery(&self) -> Option<Discovery> {
        self.session.pending_discovery
    }

    pub fn warning_line_y(&self) -> f32 {
        self.monitor.warning_line_y()
    }

    /// Whether the physics loop is currently running
    pub fn is_simulating(&self) -> bool {
        self.world.is_active()
    }

    /// Persisted view of the session
    pub fn progress(&self) -> Progress {
        Progress::from_session(&self.session)
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.world.snapshot()
    }

    /// Clamp a pointer x so the next item's preview stays inside the walls
    pub fn preview_x(&self, x: f32) -> f32 {
        let radius = self.session.next_item.map_or(0.0, |k| k.radius());
        x.clamp(radius, self.tuning.width - radius)
    }

    /// UI pause/resume. Physics also stays halted while a discovery notice is
    /// open or after game over.
    pub fn set_active(&mut self, active: bool) {
        self.ui_active = active;
        self.refresh_activity();
    }

    fn refresh_activity(&mut self) {
        let run = self.ui_active && !self.session.game_over && self.session.pending_discovery.is_none();
        self.world.set_active(run);
    }

    /// Drop the next item at `x`. Returns the new body, or `None` when the
    /// drop is rejected (cooldown, nothing queued, paused, or game over).
    pub fn drop_item(&mut self, x: f32) -> Option<BodyId> {
        if self.session.game_over || !self.ui_active || self.session.pending_discovery.is_some() {
            return None;
        }
        if self.session.cooldown_active() {
            log::trace!("Drop ignored: cooldown ({} ticks left)", self.session.drop_cooldown_ticks);
            return None;
        }
        let kind = self.session.next_item?;

        let radius = kind.radius();
        let x = x.clamp(radius, self.tuning.width - radius);
        let body = self.world.add_body(x, radius, kind, false)?;

        self.session.drop_cooldown_ticks = self.tuning.drop_cooldown_ticks();
        self.session.first_drop_pending = false;
        self.session.drops += 1;
        log::debug!("Dropped {:?} {} at x={:.1}", kind, body, x);
        self.events.push(GameEvent::Dropped { body, kind, x });

        self.select_next_item();
        Some(body)
    }

    fn select_next_item(&mut self) {
        if self.session.game_over {
            return;
        }
        let next = if self.session.first_drop_pending {
            ItemKind::lowest()
        } else {
            choose_next_item(&mut self.rng, &self.session.unlocked, self.tuning.droppable_max_level)
        };
        self.session.next_item = Some(next);
        self.events.push(GameEvent::NextItem(next));
    }

    /// Apply a merge: award points, record discoveries, re-roll the next item.
    pub fn on_merge(&mut self, event: MergeEvent) {
        let award = event.score_awarded;
        let kind = event.new_kind;
        self.session.score += u64::from(award);
        self.session.last_award = Some(award);
        self.session.merges += 1;
        self.events.push(GameEvent::Merged(event));

        if self.session.unlocked.insert(kind) {
            let discovery = Discovery {
                kind,
                newly_droppable: kind.level() <= self.tuning.droppable_max_level
                    && !INITIAL_UNLOCKED.contains(&kind),
            };
            log::info!("Discovered {:?} (score {})", kind, self.session.score);
            self.session.pending_discovery = Some(discovery);
            // Hold the next item back until the notice is dismissed
            self.session.next_item = None;
            self.events.push(GameEvent::Discovered(discovery));
            self.refresh_activity();
        } else if self.session.pending_discovery.is_none() {
            self.select_next_item();
        }
    }

    /// Close the discovery notice and resume play
    pub fn dismiss_discovery(&mut self) {
        if self.session.pending_discovery.take().is_none() {
            return;
        }
        if self.session.next_item.is_none() {
            self.select_next_item();
        }
        self.refresh_activity();
    }

    /// End the run. Idempotent: the high score is updated at most once.
    pub fn on_game_over(&mut self) {
        if self.session.game_over {
            return;
        }
        self.session.game_over = true;
        self.session.next_item = None;

        let new_record = self.session.score > self.session.high_score;
        if new_record {
            self.session.high_score = self.session.score;
        }
        log::info!(
            "Game over: score {} (high {}{})",
            self.session.score,
            self.session.high_score,
            if new_record { ", new record" } else { "" }
        );

        self.events.push(GameEvent::GameOver(GameOverEvent {
            final_score: self.session.score,
            high_score: self.session.high_score,
            new_record,
        }));
        self.refresh_activity();
    }

    /// Fresh run: score 0, initial unlocks, empty board
    pub fn restart(&mut self) {
        self.world.reset();
        self.monitor.reset();
        self.session = GameSession::new(self.session.high_score, catalog::initial_unlocked());
        self.accumulator = 0.0;
        self.events.clear();
        self.refresh_activity();
        log::info!("Game restarted");
        self.events.push(GameEvent::Restarted);
        self.events.push(GameEvent::NextItem(ItemKind::lowest()));
    }

    /// Feed a frame's elapsed time; runs as many fixed ticks as fit.
    pub fn advance(&mut self, frame_dt: f32) -> Vec<GameEvent> {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        self.take_events()
    }

    /// Run exactly one fixed tick
    pub fn step_once(&mut self) -> Vec<GameEvent> {
        self.tick();
        self.take_events()
    }

    /// Drain events raised outside `advance` (drops, dismissals)
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn tick(&mut self) {
        self.time_ticks += 1;
        // The cooldown is wall-clock-like: it runs even while physics is halted
        self.session.drop_cooldown_ticks = self.session.drop_cooldown_ticks.saturating_sub(1);

        if !self.world.is_active() {
            return;
        }

        let starts = self.world.step(SIM_DT);
        for merge in resolve_merges(&mut self.world, &starts) {
            self.on_merge(merge);
        }

        if self.monitor.check(self.world.bodies()).is_some() {
            self.on_game_over();
        }
    }
}
