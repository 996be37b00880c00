//! Data-driven game balance
//!
//! Every field has a default so a tuning file only needs the values it
//! overrides. Loaded from JSON natively; the web build uses the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::secs_to_ticks;

/// Tuning load/validation failures
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning value `{name}` = {value} is out of range ({expected})")]
    OutOfRange {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },
}

/// Physics and gameplay balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub width: f32,
    pub height: f32,
    /// Warning line height as a fraction of `height`, from the top
    pub warning_line_ratio: f32,

    // === Physics ===
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Mass per px² of disc area
    pub density: f32,
    /// Linear velocity decay per second
    pub linear_damping: f32,
    /// Angular velocity decay per second
    pub angular_damping: f32,
    /// Scale between screen pixels and physics-engine meters
    pub pixels_per_meter: f32,

    // === Merging ===
    /// Upward kick given to a merge product (px/s)
    pub merge_pop_speed: f32,
    /// Horizontal kick range (px/s, centered on zero)
    pub merge_jitter_speed: f32,
    /// How long a fresh merge product is flagged for the merge animation (s)
    pub merge_flash_secs: f32,

    // === Dropping ===
    /// Minimum time between drops (s)
    pub drop_cooldown_secs: f32,
    /// Highest level offered as a random drop
    pub droppable_max_level: u8,

    // === Loss condition ===
    /// Linear speed under which a body counts as still (px/s)
    pub still_speed: f32,
    /// Angular speed under which a body counts as still (rad/s)
    pub still_spin: f32,
    /// Consecutive still steps above the line before the run ends
    pub settle_ticks: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: GAME_WIDTH,
            height: GAME_HEIGHT,
            warning_line_ratio: WARNING_LINE_RATIO,

            gravity: 800.0,
            restitution: 0.3,
            friction: 0.1,
            density: 0.001,
            linear_damping: 0.6,
            angular_damping: 0.6,
            pixels_per_meter: 50.0,

            merge_pop_speed: 80.0,
            merge_jitter_speed: 16.0,
            merge_flash_secs: 0.3,

            drop_cooldown_secs: 0.5,
            droppable_max_level: DROPPABLE_MAX_LEVEL,

            still_speed: 3.0,
            still_spin: 3.0,
            settle_ticks: 12,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file from disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let largest = crate::sim::ItemKind::Spaceship.radius();
        check("width", self.width, self.width > 2.0 * largest, "wider than the largest item")?;
        check("height", self.height, self.height > 2.0 * largest, "taller than the largest item")?;
        check(
            "warning_line_ratio",
            self.warning_line_ratio,
            (0.0..1.0).contains(&self.warning_line_ratio),
            "0 <= ratio < 1",
        )?;
        check("gravity", self.gravity, self.gravity > 0.0, "> 0")?;
        check(
            "restitution",
            self.restitution,
            (0.0..=1.0).contains(&self.restitution),
            "0..=1",
        )?;
        check("friction", self.friction, self.friction >= 0.0, ">= 0")?;
        check("density", self.density, self.density > 0.0, "> 0")?;
        check(
            "pixels_per_meter",
            self.pixels_per_meter,
            self.pixels_per_meter > 0.0,
            "> 0",
        )?;
        check(
            "drop_cooldown_secs",
            self.drop_cooldown_secs,
            self.drop_cooldown_secs >= 0.0,
            ">= 0",
        )?;
        check("still_speed", self.still_speed, self.still_speed > 0.0, "> 0")?;
        check("still_spin", self.still_spin, self.still_spin > 0.0, "> 0")?;
        Ok(())
    }

    /// Warning line y coordinate
    pub fn warning_line_y(&self) -> f32 {
        self.height * self.warning_line_ratio
    }

    pub fn drop_cooldown_ticks(&self) -> u32 {
        secs_to_ticks(self.drop_cooldown_secs)
    }

    pub fn merge_flash_ticks(&self) -> u32 {
        secs_to_ticks(self.merge_flash_secs)
    }
}

fn check(name: &'static str, value: f32, ok: bool, expected: &'static str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert!((tuning.warning_line_y() - 72.0).abs() < 1e-4);
        // 0.5 s at 120 Hz
        assert_eq!(tuning.drop_cooldown_ticks(), 60);
        assert_eq!(tuning.merge_flash_ticks(), 36);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 500.0, "settle_ticks": 4 }"#).unwrap();
        assert_eq!(tuning.gravity, 500.0);
        assert_eq!(tuning.settle_ticks, 4);
        assert_eq!(tuning.width, GAME_WIDTH);
        assert_eq!(tuning.droppable_max_level, DROPPABLE_MAX_LEVEL);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = Tuning::from_json(r#"{ "restitution": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "restitution",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "width": 100.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { name: "width", .. }));

        let err = Tuning::from_json(r#"{ "pixels_per_meter": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "pixels_per_meter",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ gravity: "),
            Err(TuningError::Parse(_))
        ));
    }
}
