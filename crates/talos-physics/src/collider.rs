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

//! Provides the collider description attached to a body.

use serde::{Deserialize, Serialize};

use talos_core::math::{Aabb, HeightField, Obb, Sphere};

/// The narrow-phase shape of a collider.
///
/// The variants carry their parameters by value; the contact system stores
/// its own copy, so the caller may drop the source after adding the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColliderShape {
    /// No narrow-phase shape: the broad-phase box itself is the collider.
    /// Disallowed for kinematic bodies.
    None,
    /// A sphere in the body's local space.
    Sphere(Sphere),
    /// An oriented box in the body's local space.
    Obb(Obb),
    /// A height-field terrain anchored at the body's position.
    HeightField(HeightField),
}

/// Discriminant of [`ColliderShape`], used as the narrow-phase dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Bare broad-phase box.
    None,
    /// Sphere shape.
    Sphere,
    /// Oriented box shape.
    Obb,
    /// Height-field shape.
    HeightField,
}

impl ColliderShape {
    /// Returns the dispatch key of the shape.
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::None => ShapeKind::None,
            Self::Sphere(_) => ShapeKind::Sphere,
            Self::Obb(_) => ShapeKind::Obb,
            Self::HeightField(_) => ShapeKind::HeightField,
        }
    }
}

/// A collider usable in the physical world: a local-space broad-phase box
/// plus the narrow-phase shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    /// Axis-aligned bounding box in the body's local space, used for the
    /// broad phase.
    pub broad_phase: Aabb,
    /// The exact shape tested in the narrow phase.
    pub shape: ColliderShape,
}

impl Collider {
    /// Creates a collider from a broad-phase box and a narrow-phase shape.
    pub fn new(broad_phase: Aabb, shape: ColliderShape) -> Self {
        Self { broad_phase, shape }
    }

    /// Creates a sphere collider with a tight broad-phase box.
    pub fn sphere(sphere: Sphere) -> Self {
        let r = talos_core::math::Vec3::splat(sphere.radius);
        Self {
            broad_phase: Aabb::from_center_half_extents(sphere.center, r),
            shape: ColliderShape::Sphere(sphere),
        }
    }

    /// Creates an oriented-box collider with a tight broad-phase box.
    pub fn obb(obb: Obb) -> Self {
        Self {
            broad_phase: obb.to_aabb(),
            shape: ColliderShape::Obb(obb),
        }
    }

    /// Creates a broad-phase-only collider. Only valid on static bodies.
    pub fn aabb(broad_phase: Aabb) -> Self {
        Self {
            broad_phase,
            shape: ColliderShape::None,
        }
    }
}
