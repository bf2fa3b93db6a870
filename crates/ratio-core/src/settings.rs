//! Tunable solver settings, loadable from a data file.

use serde::{Deserialize, Serialize};

/// Knobs for the linear system and the fixed-value relock logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Added per row index to the objective weight, so that among equally
    /// minimal solutions the earlier row is preferred.
    pub tie_break_epsilon: f64,
    /// Buildings used for a relock pin when the row was never solved.
    pub default_pin_buildings: f64,
    /// Objective weight of constraint slack in the infeasibility diagnosis.
    pub slack_penalty: f64,
    /// Values with a smaller magnitude are reported as zero.
    pub zero_threshold: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tie_break_epsilon: 1e-6,
            default_pin_buildings: 1.0,
            slack_penalty: 1e6,
            zero_threshold: 1e-9,
        }
    }
}

impl SolverSettings {
    /// Clamp tiny values to zero.
    pub fn clean(&self, value: f64) -> f64 {
        if value.abs() < self.zero_threshold {
            0.0
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_noise() {
        let settings = SolverSettings::default();
        assert_eq!(settings.clean(1e-12), 0.0);
        assert_eq!(settings.clean(-1e-12), 0.0);
        assert_eq!(settings.clean(0.5), 0.5);
    }

    #[test]
    fn defaults_pin_one_building() {
        assert_eq!(SolverSettings::default().default_pin_buildings, 1.0);
    }
}
