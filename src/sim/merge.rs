//! Collision & merge resolution
//!
//! Consumes the collision starts of a single step. Two touching items of the
//! same non-final kind fuse into one item of the successor kind at their
//! midpoint. The per-body `merge_lock` keeps a body from taking part in more
//! than one merge when several pairs start touching in the same step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::ItemKind;
use super::world::{BodyId, CollisionStart, PhysicsWorld};

/// A completed merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// The two bodies that were fused (both removed)
    pub consumed: [BodyId; 2],
    /// The successor body, if the world accepted it
    pub spawned: Option<BodyId>,
    pub new_kind: ItemKind,
    /// Midpoint of the consumed bodies
    pub position: Vec2,
    pub score_awarded: u32,
}

/// Resolve every eligible pair from one step, in the order given.
pub fn resolve_merges(world: &mut PhysicsWorld, starts: &[CollisionStart]) -> Vec<MergeEvent> {
    let mut planned: Vec<(BodyId, BodyId, ItemKind, Vec2)> = Vec::new();

    for start in starts {
        let (Some(a), Some(b)) = (world.body(start.a), world.body(start.b)) else {
            continue;
        };
        if a.merge_lock || b.merge_lock {
            continue;
        }
        if a.kind != b.kind {
            continue;
        }
        let Some(next) = a.kind.successor() else {
            // Two final-level items just bump into each other
            continue;
        };

        let midpoint = (a.pos + b.pos) * 0.5;
        planned.push((start.a, start.b, next, midpoint));

        for id in [start.a, start.b] {
            if let Some(body) = world.body_mut(id) {
                body.merge_lock = true;
            }
        }
    }

    planned
        .into_iter()
        .map(|(a, b, new_kind, position)| {
            world.remove_body(a);
            world.remove_body(b);
            let spawned = world.add_body(position.x, position.y, new_kind, true);
            log::debug!("Merged {} + {} -> {:?} {:?} at {:?}", a, b, new_kind, spawned, position);
            MergeEvent {
                consumed: [a, b],
                spawned,
                new_kind,
                position,
                score_awarded: new_kind.score(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::tuning::Tuning;

    fn world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(&Tuning::default(), 3);
        world.initialize(GAME_WIDTH, GAME_HEIGHT);
        world
    }

    fn start(a: BodyId, b: BodyId) -> CollisionStart {
        CollisionStart { a, b }
    }

    #[test]
    fn test_same_kind_pair_merges() {
        let mut world = world();
        let a = world.add_body(100.0, 300.0, ItemKind::Bicycle, false).unwrap();
        let b = world.add_body(130.0, 320.0, ItemKind::Bicycle, false).unwrap();

        let events = resolve_merges(&mut world, &[start(a, b)]);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.consumed, [a, b]);
        assert_eq!(event.new_kind, ItemKind::Motorcycle);
        assert_eq!(event.score_awarded, 20);
        assert_eq!(event.position, Vec2::new(115.0, 310.0));

        assert!(world.body(a).is_none());
        assert!(world.body(b).is_none());
        assert_eq!(world.body_count(), 1);
        let spawned = world.body(event.spawned.unwrap()).unwrap();
        assert_eq!(spawned.kind, ItemKind::Motorcycle);
        assert!(!spawned.merge_lock);
    }

    #[test]
    fn test_different_kinds_do_not_merge() {
        let mut world = world();
        let a = world.add_body(100.0, 300.0, ItemKind::Bicycle, false).unwrap();
        let b = world.add_body(140.0, 300.0, ItemKind::Motorcycle, false).unwrap();
        assert!(resolve_merges(&mut world, &[start(a, b)]).is_empty());
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_final_kind_never_merges() {
        let mut world = world();
        let a = world.add_body(106.0, 300.0, ItemKind::Spaceship, false).unwrap();
        let b = world.add_body(214.0, 300.0, ItemKind::Spaceship, false).unwrap();
        assert!(resolve_merges(&mut world, &[start(a, b)]).is_empty());
        assert_eq!(world.body_count(), 2);
        assert!(!world.body(a).unwrap().merge_lock);
    }

    #[test]
    fn test_three_way_contact_merges_once() {
        let mut world = world();
        let a = world.add_body(100.0, 300.0, ItemKind::Car, false).unwrap();
        let b = world.add_body(170.0, 300.0, ItemKind::Car, false).unwrap();
        let c = world.add_body(240.0, 300.0, ItemKind::Car, false).unwrap();

        // b touches both neighbours in the same step
        let events = resolve_merges(&mut world, &[start(a, b), start(b, c), start(a, c)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].consumed, [a, b]);
        // c survives alongside the new bus
        assert!(world.body(c).is_some());
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_two_disjoint_pairs_both_merge() {
        let mut world = world();
        let a = world.add_body(60.0, 300.0, ItemKind::Bicycle, false).unwrap();
        let b = world.add_body(90.0, 300.0, ItemKind::Bicycle, false).unwrap();
        let c = world.add_body(200.0, 300.0, ItemKind::Bus, false).unwrap();
        let d = world.add_body(260.0, 300.0, ItemKind::Bus, false).unwrap();

        let events = resolve_merges(&mut world, &[start(a, b), start(c, d)]);
        let kinds: Vec<_> = events.iter().map(|e| e.new_kind).collect();
        assert_eq!(kinds, vec![ItemKind::Motorcycle, ItemKind::Truck]);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_stale_pair_is_skipped() {
        let mut world = world();
        let a = world.add_body(100.0, 300.0, ItemKind::Bicycle, false).unwrap();
        let b = world.add_body(130.0, 300.0, ItemKind::Bicycle, false).unwrap();
        world.remove_body(b);
        assert!(resolve_merges(&mut world, &[start(a, b)]).is_empty());
        assert!(world.body(a).is_some());
    }
}
