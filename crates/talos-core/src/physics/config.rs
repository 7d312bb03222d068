// Copyright 2025 the Talos Engine authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides the tuning constants of the physics core.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Tuning constants passed to the physical world at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// The number of sub-steps a single `update` tick is divided into.
    pub substeps: u32,
    /// The gravitational acceleration applied to awake bodies.
    pub gravity: Vec3,
    /// How much the broad-phase box of a moving body is expanded on every
    /// axis before it enters the BVH. Larger values trade broad-phase
    /// precision for fewer tree updates.
    pub kinematic_expansion: f32,
    /// Velocity magnitude below which a body is put to sleep.
    pub sleep_epsilon: f32,
    /// Baumgarte positional stabilization factor.
    pub baumgarte: f32,
    /// Penetration depth tolerated before stabilization kicks in.
    pub penetration_slop: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substeps: 1,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            kinematic_expansion: 1.0,
            sleep_epsilon: 0.05,
            baumgarte: 0.15,
            penetration_slop: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_json_round_trip() {
        let config = PhysicsConfig {
            substeps: 4,
            kinematic_expansion: 2.5,
            ..PhysicsConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: PhysicsConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.substeps, 4);
        assert_eq!(back.kinematic_expansion, 2.5);
        assert_eq!(back.gravity, config.gravity);
    }
}
