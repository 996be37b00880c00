//! Static catalog of droppable/mergeable items
//!
//! Ten transportation kinds ordered by level. Two items of the same kind merge
//! into the successor; the spaceship is final.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Smallest radius (level 0)
pub const R_MIN: f32 = 18.0;
/// Largest radius (final level), two thirds of the play area width
pub const R_MAX: f32 = 106.0;
/// Highest level index
pub const MAX_LEVEL: u8 = 9;

/// Item kinds, discriminant == level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Bicycle = 0,
    Motorcycle,
    Car,
    Bus,
    Truck,
    Train,
    Ship,
    Airplane,
    Rocket,
    Spaceship,
}

/// Kinds every run starts with
pub const INITIAL_UNLOCKED: [ItemKind; 2] = [ItemKind::Bicycle, ItemKind::Motorcycle];

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemInfo {
    pub kind: ItemKind,
    pub level: u8,
    pub radius: f32,
    /// Awarded when this item is created by a merge
    pub score: u32,
    pub name: &'static str,
    pub korean_name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub successor: Option<ItemKind>,
}

const fn radius_for_level(level: u8) -> f32 {
    // Integer floor keeps the sizes identical to the hand-tuned table
    let span = (R_MAX - R_MIN) as u32;
    R_MIN + (span * level as u32 / MAX_LEVEL as u32) as f32
}

const fn entry(
    kind: ItemKind,
    score: u32,
    name: &'static str,
    korean_name: &'static str,
    emoji: &'static str,
    description: &'static str,
    successor: Option<ItemKind>,
) -> ItemInfo {
    let level = kind as u8;
    ItemInfo {
        kind,
        level,
        radius: radius_for_level(level),
        score,
        name,
        korean_name,
        emoji,
        description,
        successor,
    }
}

static CATALOG: [ItemInfo; 10] = [
    entry(
        ItemKind::Bicycle,
        10,
        "Bicycle",
        "자전거",
        "🚲",
        "Two wheels and a pair of pedals.",
        Some(ItemKind::Motorcycle),
    ),
    entry(
        ItemKind::Motorcycle,
        20,
        "Motorcycle",
        "오토바이",
        "🛵",
        "A buzzing engine that cuts through the wind.",
        Some(ItemKind::Car),
    ),
    entry(
        ItemKind::Car,
        40,
        "Car",
        "자동차",
        "🚗",
        "Room for the whole family on a road trip.",
        Some(ItemKind::Bus),
    ),
    entry(
        ItemKind::Bus,
        80,
        "Bus",
        "버스",
        "🚌",
        "Carries a crowd along a fixed route through the city.",
        Some(ItemKind::Truck),
    ),
    entry(
        ItemKind::Truck,
        150,
        "Truck",
        "트럭",
        "🚚",
        "Hauls the heaviest loads without complaint.",
        Some(ItemKind::Train),
    ),
    entry(
        ItemKind::Train,
        300,
        "Train",
        "기차",
        "🚆",
        "A long line of cars full of people and freight.",
        Some(ItemKind::Ship),
    ),
    entry(
        ItemKind::Ship,
        500,
        "Ship",
        "배",
        "🚢",
        "Sails the open sea with cargo and passengers.",
        Some(ItemKind::Airplane),
    ),
    entry(
        ItemKind::Airplane,
        800,
        "Airplane",
        "비행기",
        "✈️",
        "Crosses the world in a matter of hours.",
        Some(ItemKind::Rocket),
    ),
    entry(
        ItemKind::Rocket,
        1200,
        "Rocket",
        "로켓",
        "🚀",
        "Climbs straight up and out of the atmosphere.",
        Some(ItemKind::Spaceship),
    ),
    entry(
        ItemKind::Spaceship,
        2000,
        "Spaceship",
        "우주선",
        "🌌",
        "Leaves Earth behind to explore deep space.",
        None,
    ),
];

impl ItemKind {
    /// All kinds in level order
    pub const ALL: [ItemKind; 10] = [
        ItemKind::Bicycle,
        ItemKind::Motorcycle,
        ItemKind::Car,
        ItemKind::Bus,
        ItemKind::Truck,
        ItemKind::Train,
        ItemKind::Ship,
        ItemKind::Airplane,
        ItemKind::Rocket,
        ItemKind::Spaceship,
    ];

    #[inline]
    pub fn info(self) -> &'static ItemInfo {
        &CATALOG[self as usize]
    }

    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn radius(self) -> f32 {
        self.info().radius
    }

    #[inline]
    pub fn score(self) -> u32 {
        self.info().score
    }

    #[inline]
    pub fn successor(self) -> Option<ItemKind> {
        self.info().successor
    }

    pub fn from_level(level: u8) -> Option<ItemKind> {
        Self::ALL.get(level as usize).copied()
    }

    /// Level 0 kind
    pub fn lowest() -> ItemKind {
        ItemKind::Bicycle
    }

    pub fn is_final(self) -> bool {
        self.successor().is_none()
    }
}

/// Full catalog in level order (encyclopedia listing)
pub fn catalog() -> &'static [ItemInfo] {
    &CATALOG
}

/// Initial unlocked set
pub fn initial_unlocked() -> BTreeSet<ItemKind> {
    INITIAL_UNLOCKED.iter().copied().collect()
}

/// Highest level among the given kinds
pub fn highest_level(unlocked: &BTreeSet<ItemKind>) -> Option<u8> {
    unlocked.iter().next_back().map(|k| k.level())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radii_match_table() {
        let radii: Vec<f32> = ItemKind::ALL.iter().map(|k| k.radius()).collect();
        assert_eq!(
            radii,
            vec![18.0, 27.0, 37.0, 47.0, 57.0, 66.0, 76.0, 86.0, 96.0, 106.0]
        );
    }

    #[test]
    fn test_successor_chain_is_contiguous() {
        for info in catalog() {
            assert_eq!(info.kind.level(), info.level);
            match info.successor {
                Some(next) => assert_eq!(next.level(), info.level + 1),
                None => assert_eq!(info.level, MAX_LEVEL),
            }
        }
        assert!(ItemKind::Spaceship.is_final());
        assert!(!ItemKind::Rocket.is_final());
    }

    #[test]
    fn test_from_level() {
        assert_eq!(ItemKind::from_level(0), Some(ItemKind::Bicycle));
        assert_eq!(ItemKind::from_level(9), Some(ItemKind::Spaceship));
        assert_eq!(ItemKind::from_level(10), None);
    }

    #[test]
    fn test_highest_level() {
        let mut set = initial_unlocked();
        assert_eq!(highest_level(&set), Some(1));
        set.insert(ItemKind::Train);
        assert_eq!(highest_level(&set), Some(5));
        assert_eq!(highest_level(&BTreeSet::new()), None);
    }
}
