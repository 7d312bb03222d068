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

//! Provides the contract between the physics core and the renderer.
//!
//! The core never renders: it supplies transforms and frustum-query
//! results. The rendering collaborator hands
//! [`PhysicalWorld::render_visible`](crate::world::PhysicalWorld::render_visible)
//! a callback, which the core invokes once per visible handle, in
//! frustum-cast order. Grouping the visible set into subpasses is the
//! collaborator's job and happens on its side of the callback.

use talos_core::math::Mat4;
use talos_core::physics::PhysicsHandle;

/// Callback the rendering collaborator passes to
/// [`PhysicalWorld::render_visible`](crate::world::PhysicalWorld::render_visible);
/// invoked for every visible handle, in frustum-cast order, with the
/// object's world transform.
pub type RenderCallback<'a> = dyn FnMut(PhysicsHandle, &Mat4) + 'a;
