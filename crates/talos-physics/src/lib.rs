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

//! # Talos Physics
//!
//! The rigid-body physics core: a dynamic bounding-volume hierarchy, a
//! contact-detection pipeline, an impulse-based contact solver, and a
//! SIMD-packed motion integrator, coordinated by [`world::PhysicalWorld`].
//!
//! The crate is a library with no I/O of its own. Rendering, windowing,
//! and asset loading are external collaborators that talk to the core
//! through handles, transforms, and frustum queries.

#![warn(missing_docs)]

pub mod body;
pub mod bvh;
pub mod collider;
pub mod contact;
pub mod error;
pub mod material;
pub mod motion;
pub mod render;
pub mod solver;
pub mod world;

pub use body::BodyDesc;
pub use collider::{Collider, ColliderShape};
pub use error::PhysicsError;
pub use material::MaterialProperties;
pub use world::PhysicalWorld;

pub use talos_core::physics::{PhysicsConfig, PhysicsHandle, PhysicsKind};
