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

//! Provides the error taxonomy of the physics core.
//!
//! Recoverable misuse is surfaced to the caller as a [`PhysicsError`] and
//! the offending operation becomes a no-op. Conditions the core cannot
//! recover from (node-pool exhaustion, handle corruption in debug builds)
//! panic instead.

use talos_core::physics::PhysicsHandle;
use thiserror::Error;

/// Errors surfaced by the public world operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// The handle's type tag, index, or implementation bits fail validation.
    #[error("invalid physics handle {0:?}")]
    HandleInvalid(PhysicsHandle),
    /// The handle's lookup slot is null (the object was destroyed).
    #[error("unknown physics handle {0:?}")]
    HandleUnknown(PhysicsHandle),
    /// A body was added without a material, or with a non-material handle in
    /// the material slot.
    #[error("body requires a material handle, got {0:?}")]
    MaterialMissing(PhysicsHandle),
    /// A kinematic body was added with a collider shape it cannot carry.
    #[error("kinematic bodies cannot use a bare AABB collider")]
    InvalidCollider,
}

/// Errors surfaced by the bounding-volume hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BvhError {
    /// The handle is already present in the tree.
    #[error("handle {0:?} is already present in the BVH")]
    HandleReused(PhysicsHandle),
    /// The handle was not found in the tree.
    #[error("handle {0:?} was not found in the BVH")]
    UnknownHandle(PhysicsHandle),
}
