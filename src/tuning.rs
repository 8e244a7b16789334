//! Difficulty tuning
//!
//! The knobs that shape how a run escalates with level. Defaults reproduce the
//! shipped balance; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading or validating a tuning table
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Level-scaling and spawn configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Per-level factor applied to the tree spawn interval (compounded)
    pub level_spawn_interval_reduction: f32,
    /// Per-level tree density multiplier (compounded, divides the interval)
    pub level_density_multiplier: f32,
    /// Floor for the scaled tree spawn interval (ms)
    pub min_spawn_interval_ms: f64,
    /// Hard cap on trees on screen; `None` disables the cap
    pub max_trees: Option<usize>,
    /// Chance that a tree spawns with a jump ramp in front of it
    pub jump_spawn_chance: f64,
    /// Wall-clock interval between NPC skier spawns (ms)
    pub npc_spawn_interval_ms: f64,
    /// Extra avalanche acceleration per level above 1 (px/s²)
    pub avalanche_level_acceleration: f32,
    /// Score needed per level
    pub score_per_level: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            level_spawn_interval_reduction: 1.0,
            level_density_multiplier: 1.1,
            min_spawn_interval_ms: 200.0,
            max_trees: None,
            jump_spawn_chance: 0.2,
            npc_spawn_interval_ms: 6000.0,
            avalanche_level_acceleration: 3.0,
            score_per_level: 100.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning table from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        positive(
            "level_spawn_interval_reduction",
            self.level_spawn_interval_reduction as f64,
        )?;
        positive(
            "level_density_multiplier",
            self.level_density_multiplier as f64,
        )?;
        if self.min_spawn_interval_ms.is_nan() || self.min_spawn_interval_ms < 0.0 {
            return Err(TuningError::Invalid {
                field: "min_spawn_interval_ms",
                reason: "must not be negative",
            });
        }
        if !(0.0..=1.0).contains(&self.jump_spawn_chance) {
            return Err(TuningError::Invalid {
                field: "jump_spawn_chance",
                reason: "must be within 0..=1",
            });
        }
        positive("npc_spawn_interval_ms", self.npc_spawn_interval_ms)?;
        positive("score_per_level", self.score_per_level as f64)?;
        Ok(())
    }
}

/// NaN, zero and negative values are all rejected
fn positive(field: &'static str, value: f64) -> Result<(), TuningError> {
    if value.is_nan() || value <= 0.0 {
        return Err(TuningError::Invalid {
            field,
            reason: "must be positive",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "max_trees": 8, "jump_spawn_chance": 0.5 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.max_trees, Some(8));
        assert_eq!(tuning.jump_spawn_chance, 0.5);
        // Untouched fields keep their defaults
        assert_eq!(tuning.score_per_level, Tuning::default().score_per_level);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "jump_spawn_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "jump_spawn_chance",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "score_per_level": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { .. }));

        let err = Tuning::from_json(r#"{ "level_density_multiplier": -1.1 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "level_density_multiplier",
                ..
            }
        ));
    }

    #[test]
    fn test_nan_values_rejected() {
        let tuning = Tuning {
            npc_spawn_interval_ms: f64::NAN,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::Invalid {
                field: "npc_spawn_interval_ms",
                ..
            })
        ));

        let tuning = Tuning {
            min_spawn_interval_ms: f64::NAN,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }
}
