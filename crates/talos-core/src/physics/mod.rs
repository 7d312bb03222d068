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

//! # Physics Contracts
//!
//! Handle layout, configuration values, and observer interfaces shared
//! between the physics core and its collaborators.

pub mod config;
pub mod debug;
pub mod handle;
pub mod profile;

pub use config::PhysicsConfig;
pub use debug::{DebugRenderer, NoopDebugRenderer};
pub use handle::{PhysicsHandle, PhysicsKind};
pub use profile::{NoopProfiler, Profiler};
