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

//! Provides the 32-bit tagged handle used to address physics objects.
//!
//! Every object the user can manipulate is referred to by an opaque handle:
//!
//! ```text
//! [TTTT00UU UUUUUUUU IIIIIIII IIIIIIII]
//! T (4 bits):  the object type, also selects the world's internal list.
//! U (10 bits): implementation bits; subsystems may reuse them internally,
//!              but they must be zero in any handle crossing the public
//!              boundary.
//! I (16 bits): the index into the world's lookup table (public handles)
//!              or into a subsystem's packed arrays (internal handles).
//! ```

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The types of physics objects a handle can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[repr(u8)]
pub enum PhysicsKind {
    /// Physical material.
    Material = 0,
    /// Unmovable object.
    Static = 1,
    /// Full physics object.
    Kinematic = 2,
    /// Partial physics object.
    Dynamic = 3,
    /// Purely visual light source.
    LightSource = 4,
}

impl PhysicsKind {
    /// Returns `true` for kinds that participate in motion integration.
    #[inline]
    pub fn is_body(self) -> bool {
        matches!(self, Self::Kinematic | Self::Dynamic)
    }
}

/// Opaque handle to an object owned by the physical world.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
    Default,
)]
#[repr(transparent)]
pub struct PhysicsHandle(pub u32);

impl PhysicsHandle {
    /// The reserved null handle.
    pub const NULL: Self = Self(0);

    /// Bit mask covering the implementation-private bits (16-25).
    pub const IMPL_BITS: u32 = 0x03FF_0000;

    /// Creates a new handle from a kind and a 16-bit index.
    #[inline]
    pub const fn new(kind: PhysicsKind, index: u16) -> Self {
        Self((kind as u32) << 28 | index as u32)
    }

    /// Returns the type tag of the handle.
    ///
    /// # Panics
    /// Panics on a corrupt tag. Use [`Self::try_kind`] for handles that
    /// cross the public boundary.
    #[inline]
    pub fn kind(self) -> PhysicsKind {
        match self.try_kind() {
            Some(kind) => kind,
            None => panic!("corrupt physics handle (unknown type tag in {:#010x})", self.0),
        }
    }

    /// Returns the type tag of the handle, or `None` when the tag is not a
    /// known object type.
    #[inline]
    pub fn try_kind(self) -> Option<PhysicsKind> {
        match self.0 >> 28 {
            0 => Some(PhysicsKind::Material),
            1 => Some(PhysicsKind::Static),
            2 => Some(PhysicsKind::Kinematic),
            3 => Some(PhysicsKind::Dynamic),
            4 => Some(PhysicsKind::LightSource),
            _ => None,
        }
    }

    /// Returns the 16-bit index of the handle.
    #[inline]
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Returns `true` when this is the reserved null handle.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when any implementation-private bit is set.
    ///
    /// Such handles must never cross the public boundary.
    #[inline]
    pub const fn has_impl_bits(self) -> bool {
        self.0 & Self::IMPL_BITS != 0
    }
}
