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

//! Provides the profiling observer interface.

/// Receiver for profiling sections emitted by the physics pipeline.
///
/// Sections nest; every `begin` is matched by an `end` within the same
/// tick.
pub trait Profiler {
    /// Opens a profiling section.
    fn begin(&mut self, label: &'static str);
    /// Closes the most recently opened section.
    fn end(&mut self);
}

/// A [`Profiler`] that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn begin(&mut self, _label: &'static str) {}
    fn end(&mut self) {}
}
