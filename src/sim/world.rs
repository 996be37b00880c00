//! Physics world adapter
//!
//! Wraps a rapier2d pipeline holding every item body and the static arena
//! walls. The game works in screen pixels with y growing downward; the engine
//! runs in meters, converted at this boundary with `Tuning::pixels_per_meter`.
//!
//! A step runs to completion before any add/remove call is accepted, so
//! callers only ever observe the world between steps. Body state is mirrored
//! into `Body` after each step and read from there.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::catalog::ItemKind;
use crate::tuning::Tuning;

/// Wall thickness (px)
const WALL_THICKNESS: f32 = 50.0;
/// Stream selector so the world's RNG never mirrors the game's
const WORLD_RNG_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Unique body identifier, never reused within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A dynamic disc, as of the end of the last step (pixels)
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub kind: ItemKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation (radians)
    pub angle: f32,
    pub angular_vel: f32,
    pub radius: f32,
    /// The engine put this body's island to sleep
    pub sleeping: bool,
    /// Committed to a merge this step
    pub merge_lock: bool,
    /// Remaining ticks of the merge flash (render hint)
    pub flash_ticks: u32,
    handle: RigidBodyHandle,
}

impl Body {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    #[inline]
    pub fn angular_speed(&self) -> f32 {
        self.angular_vel.abs()
    }
}

/// Read-only view of a body for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub kind: ItemKind,
    pub level: u8,
    pub position: Vec2,
    pub rotation: f32,
    pub radius: f32,
    /// Just produced by a merge (drives the pop animation)
    pub fresh_merge: bool,
}

/// Two bodies that began touching during a step (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollisionStart {
    pub a: BodyId,
    pub b: BodyId,
}

/// rapier state, rebuilt wholesale on reset
struct Engine {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Engine {
    fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }
}

/// The simulation world
pub struct PhysicsWorld {
    tuning: Tuning,
    /// Arena size (px), set by `initialize`
    arena: Option<(f32, f32)>,
    engine: Engine,
    gravity: Vector<Real>,
    /// Live bodies, sorted by id
    bodies: Vec<Body>,
    collider_to_body: HashMap<ColliderHandle, BodyId>,
    active: bool,
    next_id: u32,
    rng: Pcg32,
    steps: u64,
}

impl PhysicsWorld {
    /// Create an uninitialized world
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            tuning: tuning.clone(),
            arena: None,
            engine: Engine::new(),
            gravity: vector![0.0, tuning.gravity / tuning.pixels_per_meter],
            bodies: Vec::new(),
            collider_to_body: HashMap::new(),
            active: false,
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed ^ WORLD_RNG_SALT),
            steps: 0,
        }
    }

    /// Build the arena walls and start stepping. No-op if already initialized.
    pub fn initialize(&mut self, width: f32, height: f32) {
        if self.arena.is_some() {
            log::debug!("Physics world already initialized");
            return;
        }
        self.arena = Some((width, height));
        self.build_walls(width, height);
        self.active = true;
        log::info!("Physics world initialized ({}x{})", width, height);
    }

    pub fn is_initialized(&self) -> bool {
        self.arena.is_some()
    }

    /// Left wall, right wall and floor; the top stays open. The side walls
    /// reach well above the box so an overflowing stack stays contained.
    fn build_walls(&mut self, width: f32, height: f32) {
        let t = WALL_THICKNESS;
        // (center, half extents) in pixels
        let walls = [
            (Vec2::new(-t * 0.5, height * 0.5), Vec2::new(t * 0.5, height)),
            (Vec2::new(width + t * 0.5, height * 0.5), Vec2::new(t * 0.5, height)),
            (Vec2::new(width * 0.5, height + t * 0.5), Vec2::new(width * 0.5 + t, t * 0.5)),
        ];

        for (center, half) in walls {
            let center = self.to_meters(center);
            let half = half / self.tuning.pixels_per_meter;
            let wall = ColliderBuilder::cuboid(half.x, half.y)
                .translation(center)
                .friction(self.tuning.friction)
                .restitution(self.tuning.restitution)
                .build();
            self.engine.collider_set.insert(wall);
        }
    }

    #[inline]
    fn to_meters(&self, v: Vec2) -> Vector<Real> {
        let s = self.tuning.pixels_per_meter;
        vector![v.x / s, v.y / s]
    }

    /// Insert a disc of `kind` centered at (x, y).
    ///
    /// Merge products get a small upward pop with random sideways jitter.
    pub fn add_body(&mut self, x: f32, y: f32, kind: ItemKind, spawned_from_merge: bool) -> Option<BodyId> {
        if self.arena.is_none() {
            log::warn!("add_body({:?}) ignored: world not initialized", kind);
            return None;
        }

        let id = BodyId(self.next_id);
        self.next_id += 1;

        let radius = kind.radius();
        let mut vel = Vec2::ZERO;
        let mut flash_ticks = 0;
        if spawned_from_merge {
            let jitter = self.rng.random_range(-0.5f32..0.5) * self.tuning.merge_jitter_speed;
            vel = Vec2::new(jitter, -self.tuning.merge_pop_speed);
            flash_ticks = self.tuning.merge_flash_ticks();
        }

        let s = self.tuning.pixels_per_meter;
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(self.to_meters(Vec2::new(x, y)))
            .linvel(self.to_meters(vel))
            .linear_damping(self.tuning.linear_damping)
            .angular_damping(self.tuning.angular_damping)
            .build();
        let handle = self.engine.rigid_body_set.insert(rigid_body);

        // Density is per px² of disc area; rescale so masses match pixel space
        let collider = ColliderBuilder::ball(radius / s)
            .density(self.tuning.density * s * s)
            .friction(self.tuning.friction)
            .restitution(self.tuning.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.engine
                .collider_set
                .insert_with_parent(collider, handle, &mut self.engine.rigid_body_set);
        self.collider_to_body.insert(collider_handle, id);

        // Ids only grow, so pushing keeps the list sorted
        self.bodies.push(Body {
            id,
            kind,
            pos: Vec2::new(x, y),
            vel,
            angle: 0.0,
            angular_vel: 0.0,
            radius,
            sleeping: false,
            merge_lock: false,
            flash_ticks,
            handle,
        });
        Some(id)
    }

    /// Remove a body. Returns `None` if it was already gone.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.index_of(id)?;
        let body = self.bodies.remove(idx);

        let engine = &mut self.engine;
        engine.rigid_body_set.remove(
            body.handle,
            &mut engine.island_manager,
            &mut engine.collider_set,
            &mut engine.impulse_joint_set,
            &mut engine.multibody_joint_set,
            true,
        );
        self.collider_to_body.retain(|_, owner| *owner != id);
        Some(body)
    }

    /// Remove every dynamic body, keeping the walls
    pub fn clear_bodies(&mut self) {
        for id in self.bodies.iter().map(|b| b.id).collect::<Vec<_>>() {
            self.remove_body(id);
        }
    }

    /// Destroy and rebuild the engine and walls. No-op if never initialized.
    pub fn reset(&mut self) {
        let Some((width, height)) = self.arena else {
            return;
        };
        self.engine = Engine::new();
        self.bodies.clear();
        self.collider_to_body.clear();
        self.build_walls(width, height);
        self.steps = 0;
        log::info!("Physics world reset");
    }

    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            log::debug!("Physics stepping {}", if active { "resumed" } else { "paused" });
        }
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index_of(id).map(|i| &mut self.bodies[i])
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Steps taken since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Render view of all live bodies (sorted by id)
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .map(|b| BodySnapshot {
                id: b.id,
                kind: b.kind,
                level: b.kind.level(),
                position: b.pos,
                rotation: b.angle,
                radius: b.radius,
                fresh_merge: b.flash_ticks > 0,
            })
            .collect()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    /// Advance one fixed step. Returns the body pairs that began touching,
    /// ordered by `(a, b)`.
    pub fn step(&mut self, dt: f32) -> Vec<CollisionStart> {
        if !self.active || self.arena.is_none() {
            return Vec::new();
        }
        self.steps += 1;

        let (collision_send, collision_recv) = rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) = rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        let engine = &mut self.engine;
        engine.integration_parameters.dt = dt;
        engine.pipeline.step(
            &self.gravity,
            &engine.integration_parameters,
            &mut engine.island_manager,
            &mut engine.broad_phase,
            &mut engine.narrow_phase,
            &mut engine.rigid_body_set,
            &mut engine.collider_set,
            &mut engine.impulse_joint_set,
            &mut engine.multibody_joint_set,
            &mut engine.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        // Channel order is not guaranteed; the set fixes it
        let mut started = BTreeSet::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_to_body.get(&h1).copied();
                let b = self.collider_to_body.get(&h2).copied();
                // Wall contacts have no body id
                if let (Some(a), Some(b)) = (a, b) {
                    started.insert((a.min(b), a.max(b)));
                }
            }
        }

        self.sync_bodies();

        started.into_iter().map(|(a, b)| CollisionStart { a, b }).collect()
    }

    /// Mirror engine state into the pixel-space body list
    fn sync_bodies(&mut self) {
        let s = self.tuning.pixels_per_meter;
        for body in &mut self.bodies {
            body.flash_ticks = body.flash_ticks.saturating_sub(1);
            let Some(rb) = self.engine.rigid_body_set.get(body.handle) else {
                continue;
            };
            let t = rb.translation();
            let v = rb.linvel();
            body.pos = Vec2::new(t.x * s, t.y * s);
            body.vel = Vec2::new(v.x * s, v.y * s);
            body.angle = rb.rotation().angle();
            body.angular_vel = rb.angvel();
            body.sleeping = rb.is_sleeping();
        }
    }
}
