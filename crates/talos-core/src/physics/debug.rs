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

//! Provides the debug-rendering observer interface.

use crate::math::{Aabb, Sphere, Vec3};

/// Receiver for debug visualization primitives.
///
/// Purely observational; the physics core pushes shapes into it from
/// debug-build visualization passes and never reads anything back.
pub trait DebugRenderer {
    /// Adds a line segment.
    fn add_line(&mut self, start: Vec3, end: Vec3);
    /// Adds a wireframe box.
    fn add_box(&mut self, aabb: &Aabb);
    /// Adds a wireframe sphere.
    fn add_sphere(&mut self, sphere: &Sphere);
    /// Adds an arrow with the given magnitude along `direction`.
    fn add_arrow(&mut self, at: Vec3, direction: Vec3, magnitude: f32);
}

/// A [`DebugRenderer`] that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebugRenderer;

impl DebugRenderer for NoopDebugRenderer {
    fn add_line(&mut self, _start: Vec3, _end: Vec3) {}
    fn add_box(&mut self, _aabb: &Aabb) {}
    fn add_sphere(&mut self, _sphere: &Sphere) {}
    fn add_arrow(&mut self, _at: Vec3, _direction: Vec3, _magnitude: f32) {}
}
