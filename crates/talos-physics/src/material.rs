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

//! Provides the append-only material database.

use serde::{Deserialize, Serialize};

use talos_core::physics::{PhysicsHandle, PhysicsKind};

/// The physical properties of a material.
///
/// Immutable after insertion; many bodies may reference one material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// The density of the material in kg/m³.
    pub density: f32,
    /// The coefficient of restitution, in `[0, 1]`.
    pub restitution: f32,
    /// The coefficient of kinetic friction, `>= 0`.
    pub kinetic_friction: f32,
}

/// Stores materials and maps material handles to their properties.
///
/// Materials are added, never removed, so a handle's low bits index the
/// storage directly. Slot 0 is reserved: a material handle with index 0
/// would be bit-identical to the null handle.
#[derive(Debug)]
pub struct MaterialDatabase {
    materials: Vec<MaterialProperties>,
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        // Placeholder backing the reserved null handle.
        let reserved = MaterialProperties {
            density: 0.0,
            restitution: 0.0,
            kinetic_friction: 0.0,
        };
        Self {
            materials: vec![reserved],
        }
    }

    /// Adds a new material and returns its handle.
    ///
    /// # Panics
    /// Panics when the 16-bit handle space is exhausted.
    pub fn add(&mut self, properties: MaterialProperties) -> PhysicsHandle {
        assert!(
            self.materials.len() < u16::MAX as usize,
            "material database exhausted the 16-bit handle space"
        );
        self.materials.push(properties);
        PhysicsHandle::new(PhysicsKind::Material, (self.materials.len() - 1) as u16)
    }

    /// Fetches the material with the specified handle.
    ///
    /// # Panics
    /// Panics in debug builds when the handle is not a material handle.
    pub fn get(&self, handle: PhysicsHandle) -> &MaterialProperties {
        debug_assert_eq!(handle.kind(), PhysicsKind::Material);
        &self.materials[handle.index() as usize]
    }

    /// Returns `true` when `handle` resolves to a stored material.
    pub fn contains(&self, handle: PhysicsHandle) -> bool {
        handle.try_kind() == Some(PhysicsKind::Material)
            && !handle.is_null()
            && (handle.index() as usize) < self.materials.len()
    }
}
