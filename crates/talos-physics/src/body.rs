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

//! Provides the description used to place a rigid body in the world.

use serde::{Deserialize, Serialize};

use crate::collider::Collider;
use talos_core::math::{Mat3, Quaternion, Vec3};
use talos_core::physics::PhysicsHandle;

/// Description for adding a rigid body to the physical world.
///
/// The world copies everything it needs; the descriptor can be dropped
/// after the add call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDesc {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub orientation: Quaternion,
    /// Initial linear velocity.
    pub linear_velocity: Vec3,
    /// Initial angular velocity (axis scaled by rate).
    pub angular_velocity: Vec3,
    /// Render scale; only affects the transforms handed to collaborators.
    pub scale: Vec3,
    /// Mass in kilograms. Must be positive for kinematic bodies.
    pub mass: f32,
    /// Body-space inertia tensor.
    pub inertia_tensor: Mat3,
    /// Quadratic aerodynamic drag coefficient.
    pub drag_coefficient: f32,
    /// The material this body is made of.
    pub material: PhysicsHandle,
    /// The collider used by the body.
    pub collider: Collider,
}

impl BodyDesc {
    /// Creates a body description with sane defaults at the given position.
    pub fn new(position: Vec3, material: PhysicsHandle, collider: Collider) -> Self {
        Self {
            position,
            orientation: Quaternion::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            scale: Vec3::ONE,
            mass: 1.0,
            inertia_tensor: Mat3::IDENTITY,
            drag_coefficient: 0.0,
            material,
            collider,
        }
    }

    /// Sets the initial linear velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Sets the mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Sets the body-space inertia tensor.
    pub fn with_inertia_tensor(mut self, tensor: Mat3) -> Self {
        self.inertia_tensor = tensor;
        self
    }

    /// Sets the drag coefficient.
    pub fn with_drag(mut self, drag_coefficient: f32) -> Self {
        self.drag_coefficient = drag_coefficient;
        self
    }

    /// Computes the inverse of the inertia tensor, treating a zero tensor
    /// as "cannot rotate" (zero inverse).
    ///
    /// Only diagonal tensors are inverted exactly; the off-diagonal part is
    /// dropped, which matches the solid shapes the engine ships.
    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        let d = Vec3::new(
            self.inertia_tensor.cols[0].x,
            self.inertia_tensor.cols[1].y,
            self.inertia_tensor.cols[2].z,
        );
        Mat3::from_diagonal(Vec3::new(
            talos_core::math::safe_recip(d.x),
            talos_core::math::safe_recip(d.y),
            talos_core::math::safe_recip(d.z),
        ))
    }
}
