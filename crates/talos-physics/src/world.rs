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

//! # Physical World
//!
//! The single public entry point for all physics mutation. The world owns
//! the material database, the motion system, the contact system, the
//! solver, the BVH, and the public-to-internal handle lookup table, and
//! sequences the sub-step pipeline.
//!
//! Every public operation takes one world-wide exclusive lock; the SIMD
//! parallelism inside the systems is data parallelism within that single
//! thread. `update` runs to completion while holding the lock, so
//! external observers always see the state as of the end of a tick.

use std::sync::Mutex;

use crate::body::BodyDesc;
use crate::bvh::Bvh;
use crate::collider::ColliderShape;
use crate::contact::{ContactCounters, ContactSystem};
use crate::error::PhysicsError;
use crate::material::{MaterialDatabase, MaterialProperties};
use crate::motion::{MotionDesc, MotionSystem};
use crate::solver::ContactSolver;
use talos_core::math::{safe_recip, Frustum, Mat3, Mat4, Ray, Vec3};
use talos_core::physics::{NoopProfiler, PhysicsConfig, PhysicsHandle, PhysicsKind, Profiler};

#[cfg(debug_assertions)]
use talos_core::physics::DebugRenderer;

/// The public-handle to internal-handle lookup table.
///
/// Public handles index this table; the stored internal handle carries the
/// same type tag and the direct index into the owning subsystem's packed
/// arrays. Public handles are never rewritten: when an object is removed,
/// the internal indices of later objects of the same type are decremented
/// in place and the public slot is nulled for reuse.
#[derive(Debug, Default)]
pub struct HandleLut {
    entries: Vec<PhysicsHandle>,
}

impl HandleLut {
    /// Allocates a public handle for an object stored at `index` in the
    /// subsystem selected by `kind`, reusing a nulled slot when possible.
    ///
    /// # Panics
    /// Panics when the 16-bit lookup space is exhausted; there is no way
    /// to recover without redesigning the handle layout.
    pub fn alloc(&mut self, kind: PhysicsKind, index: u16) -> PhysicsHandle {
        let internal = PhysicsHandle::new(kind, index);

        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.is_null() {
                *entry = internal;
                return PhysicsHandle::new(kind, slot as u16);
            }
        }

        assert!(
            self.entries.len() < u16::MAX as usize,
            "physics lookup table exhausted the 16-bit handle space"
        );
        self.entries.push(internal);
        PhysicsHandle::new(kind, (self.entries.len() - 1) as u16)
    }

    /// Returns the internal handle stored for a public handle.
    #[inline]
    pub fn internal_of(&self, public: PhysicsHandle) -> PhysicsHandle {
        self.entries[public.index() as usize]
    }

    /// Returns the packed-array index stored for a public handle.
    #[inline]
    pub fn internal_index(&self, public: PhysicsHandle) -> u16 {
        self.internal_of(public).index()
    }

    /// Finds the public handle mapping to the given internal handle, or
    /// the null handle when none does.
    pub fn public_of(&self, internal: PhysicsHandle) -> PhysicsHandle {
        for (slot, entry) in self.entries.iter().enumerate() {
            if *entry == internal {
                return PhysicsHandle::new(internal.kind(), slot as u16);
            }
        }
        PhysicsHandle::NULL
    }

    /// Nulls the slot of a public handle and decrements every stored
    /// internal index of the same type above the removed one.
    pub fn release(&mut self, public: PhysicsHandle) {
        let internal = self.internal_of(public);
        self.entries[public.index() as usize] = PhysicsHandle::NULL;

        let kind = internal.kind();
        let removed = internal.index();
        for entry in &mut self.entries {
            if !entry.is_null() && entry.kind() == kind && entry.index() > removed {
                *entry = PhysicsHandle::new(kind, entry.index() - 1);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Aggregate statistics of the world, for diagnostics overlays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldStats {
    /// Surface-area cost of the BVH's internal branches.
    pub tree_cost: f32,
    /// Leaf area over root area of the BVH.
    pub tree_efficiency: f32,
    /// Number of leaves in the BVH.
    pub leaf_count: u16,
    /// Number of sleeping bodies.
    pub sleeping: usize,
    /// Contact-system profiling counters.
    pub counters: ContactCounters,
}

struct WorldInner {
    config: PhysicsConfig,
    materials: MaterialDatabase,
    motion: MotionSystem,
    contacts: ContactSystem,
    solver: ContactSolver,
    tree: Bvh,
    lut: HandleLut,
    lights: Vec<Mat4>,
    profiler: Box<dyn Profiler + Send>,
}

/// The main entry point for all physics related code.
pub struct PhysicalWorld {
    inner: Mutex<WorldInner>,
}

impl PhysicalWorld {
    /// Creates an empty world with the given tuning constants.
    pub fn new(config: PhysicsConfig) -> Self {
        Self::with_profiler(config, Box::new(NoopProfiler))
    }

    /// Creates an empty world that reports pipeline sections to the given
    /// profiler.
    pub fn with_profiler(config: PhysicsConfig, profiler: Box<dyn Profiler + Send>) -> Self {
        Self {
            inner: Mutex::new(WorldInner {
                config,
                materials: MaterialDatabase::new(),
                motion: MotionSystem::new(),
                contacts: ContactSystem::new(),
                solver: ContactSolver::new(),
                tree: Bvh::new(),
                lut: HandleLut::default(),
                lights: Vec::new(),
                profiler,
            }),
        }
    }

    /// Adds a material and returns its handle.
    pub fn add_material(&self, properties: MaterialProperties) -> PhysicsHandle {
        self.lock().materials.add(properties)
    }

    /// Adds a static body. Static bodies never move and are cached as a
    /// world transform.
    pub fn add_static(&self, desc: &BodyDesc) -> Result<PhysicsHandle, PhysicsError> {
        self.add_internal(desc, PhysicsKind::Static)
    }

    /// Adds a kinematic body: fully simulated, integrated every sub-step.
    pub fn add_kinematic(&self, desc: &BodyDesc) -> Result<PhysicsHandle, PhysicsError> {
        self.add_internal(desc, PhysicsKind::Kinematic)
    }

    /// Adds a purely visual light source and returns its handle.
    pub fn add_light(&self, transform: Mat4) -> PhysicsHandle {
        let mut inner = self.lock();
        inner.lights.push(transform);
        let index = (inner.lights.len() - 1) as u16;
        inner.lut.alloc(PhysicsKind::LightSource, index)
    }

    /// Removes the specified object from the world.
    ///
    /// Materials cannot be destroyed.
    pub fn destroy(&self, handle: PhysicsHandle) -> Result<(), PhysicsError> {
        let inner = &mut *self.lock();
        let internal = Self::validate(&inner.lut, handle)?;

        match internal.kind() {
            PhysicsKind::Material => {
                log::error!("materials cannot be destroyed");
                return Err(PhysicsError::HandleInvalid(handle));
            }
            PhysicsKind::LightSource => {
                inner.lights.remove(internal.index() as usize);
            }
            PhysicsKind::Static | PhysicsKind::Kinematic | PhysicsKind::Dynamic => {
                // Order matters: the contact system needs the packed index
                // before the motion system compacts its arrays.
                inner
                    .contacts
                    .remove_body(handle, internal.index(), &mut inner.tree);
                inner.solver.remove_body(handle);
                inner.motion.remove(internal);
            }
        }

        inner.lut.release(handle);
        Ok(())
    }

    /// Sets the gravitational acceleration.
    pub fn set_gravity(&self, gravity: Vec3) {
        self.lock().config.gravity = gravity;
    }

    /// Sets the number of sub-steps per tick.
    pub fn set_substeps(&self, substeps: u32) {
        self.lock().config.substeps = substeps.max(1);
    }

    /// Returns the world transform of the specified object.
    pub fn get_transform(&self, handle: PhysicsHandle) -> Result<Mat4, PhysicsError> {
        let inner = self.lock();
        let internal = Self::validate(&inner.lut, handle)?;

        match internal.kind() {
            PhysicsKind::Material => Err(PhysicsError::HandleInvalid(handle)),
            PhysicsKind::LightSource => Ok(inner.lights[internal.index() as usize]),
            _ => Ok(inner.motion.get_transform(internal)),
        }
    }

    /// Returns the linear velocity of the specified body.
    ///
    /// Static bodies report zero.
    pub fn get_velocity(&self, handle: PhysicsHandle) -> Result<Vec3, PhysicsError> {
        let inner = self.lock();
        let internal = Self::validate(&inner.lut, handle)?;

        match internal.kind() {
            PhysicsKind::Static => Ok(Vec3::ZERO),
            PhysicsKind::Kinematic | PhysicsKind::Dynamic => {
                Ok(inner.motion.get_velocity(internal.index() as usize))
            }
            _ => Err(PhysicsError::HandleInvalid(handle)),
        }
    }

    /// Returns the handles of every object whose broad-phase box intersects
    /// the frustum. This is the renderer's culling entry point.
    pub fn cull_frustum(&self, frustum: &Frustum) -> Vec<PhysicsHandle> {
        let inner = self.lock();
        let mut result = Vec::new();
        inner.tree.frustumcast(frustum, &mut result);
        result
    }

    /// Casts a ray into the world and returns the first object hit in
    /// traversal order, if any.
    pub fn raycast(&self, ray: &Ray) -> Option<PhysicsHandle> {
        self.lock().tree.raycast(ray)
    }

    /// Invokes `callback` for every object whose broad-phase box intersects
    /// the frustum, in frustum-cast order, with the object's world
    /// transform.
    ///
    /// This is the renderer's draw entry point; grouping the visible set
    /// into subpasses happens on the collaborator's side.
    pub fn render_visible(&self, frustum: &Frustum, callback: &mut crate::render::RenderCallback<'_>) {
        let inner = self.lock();

        let mut visible = Vec::new();
        inner.tree.frustumcast(frustum, &mut visible);

        for handle in visible {
            let transform = inner.motion.get_transform(inner.lut.internal_of(handle));
            callback(handle, &transform);
        }
    }

    /// Returns aggregate statistics for diagnostics overlays.
    pub fn stats(&self) -> WorldStats {
        let inner = self.lock();
        WorldStats {
            tree_cost: inner.tree.tree_cost(),
            tree_efficiency: inner.tree.efficiency(),
            leaf_count: inner.tree.leaf_count(),
            sleeping: inner.motion.sleeping_count(),
            counters: inner.contacts.counters(),
        }
    }

    /// Advances the world by `dt` seconds, split into the configured number
    /// of sub-steps.
    ///
    /// Contacts found in a sub-step are solved against that sub-step's
    /// velocity snapshot before gravity-updated positions integrate, so
    /// resting bodies do not drift through floors.
    pub fn update(&self, dt: f32) {
        let inner = &mut *self.lock();
        inner.profiler.begin("physics");

        let substeps = inner.config.substeps.max(1);
        let dt_sub = dt / substeps as f32;

        for _ in 0..substeps {
            inner.profiler.begin("contacts");
            inner.contacts.check(
                &mut inner.tree,
                &mut inner.motion,
                &inner.lut,
                inner.config.kinematic_expansion,
            );
            inner.profiler.end();

            inner.profiler.begin("movement");
            inner.motion.apply_gravity(inner.config.gravity, dt_sub);
            inner.motion.apply_drag(dt_sub);
            inner.profiler.end();

            inner.profiler.begin("solver");
            inner.solver.solve(
                inner.contacts.stream(),
                &mut inner.motion,
                &inner.lut,
                dt_sub,
                inner.config.baumgarte,
                inner.config.penetration_slop,
            );
            inner.profiler.end();

            inner.profiler.begin("integrate");
            inner.motion.try_sleep(inner.config.sleep_epsilon);
            inner.motion.integrate(dt_sub);
            inner.profiler.end();
        }

        inner.profiler.end();
    }

    /// Draws the BVH, the colliders, and the most recent contacts.
    #[cfg(debug_assertions)]
    pub fn visualize(&self, renderer: &mut dyn DebugRenderer, display_depth: u32) {
        let inner = self.lock();
        inner.tree.visualize(renderer, display_depth);
        inner.contacts.visualize(renderer, &inner.motion, &inner.lut);
    }

    // --- Internal helpers ---

    fn lock(&self) -> std::sync::MutexGuard<'_, WorldInner> {
        self.inner.lock().expect("physics world lock poisoned")
    }

    /// Checks a public handle's implementation bits, table range, null
    /// slot, and type tag. Returns the stored internal handle.
    fn validate(lut: &HandleLut, handle: PhysicsHandle) -> Result<PhysicsHandle, PhysicsError> {
        if handle.is_null() || handle.has_impl_bits() {
            return Err(PhysicsError::HandleInvalid(handle));
        }
        let Some(kind) = handle.try_kind() else {
            return Err(PhysicsError::HandleInvalid(handle));
        };
        if handle.index() as usize >= lut.len() {
            return Err(PhysicsError::HandleInvalid(handle));
        }

        let internal = lut.internal_of(handle);
        if internal.is_null() {
            return Err(PhysicsError::HandleUnknown(handle));
        }
        if internal.kind() != kind {
            return Err(PhysicsError::HandleInvalid(handle));
        }

        Ok(internal)
    }

    fn add_internal(&self, desc: &BodyDesc, kind: PhysicsKind) -> Result<PhysicsHandle, PhysicsError> {
        let inner = &mut *self.lock();

        // A body without a material has no density, restitution, or
        // friction; reject it before touching any subsystem.
        if !inner.materials.contains(desc.material) {
            debug_assert!(false, "physics body added without a valid material");
            return Err(PhysicsError::MaterialMissing(desc.material));
        }
        if kind.is_body() && matches!(desc.collider.shape, ColliderShape::None) {
            log::error!("kinematic objects cannot have a bare AABB collider");
            return Err(PhysicsError::InvalidCollider);
        }
        debug_assert!(
            !kind.is_body() || desc.mass > 0.0,
            "kinematic bodies must have positive mass"
        );

        let transform = Mat4::from_trs(desc.position, desc.orientation, desc.scale);
        let inverse_inertia = if kind.is_body() {
            desc.inverse_inertia_tensor()
        } else {
            Mat3::ZERO
        };
        let inverse_mass = if kind.is_body() {
            safe_recip(desc.mass)
        } else {
            0.0
        };

        let index = if kind.is_body() {
            inner.motion.add_body(&MotionDesc {
                position: desc.position,
                orientation: desc.orientation,
                linear_velocity: desc.linear_velocity,
                angular_velocity: desc.angular_velocity,
                scale: desc.scale,
                drag_coefficient: desc.drag_coefficient,
                inverse_mass,
                inverse_inertia,
            })
        } else {
            inner.motion.add_static(transform)
        };

        let public = inner.lut.alloc(kind, index as u16);

        let material = *inner.materials.get(desc.material);
        inner
            .solver
            .add_body(public, inverse_inertia, inverse_mass, &material);
        inner.contacts.add_body(
            public,
            &desc.collider,
            &transform,
            &mut inner.tree,
            inner.config.kinematic_expansion,
        )?;

        Ok(public)
    }
}

impl Default for PhysicalWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::Collider;
    use talos_core::math::{Aabb, Sphere};

    fn test_material(world: &PhysicalWorld) -> PhysicsHandle {
        world.add_material(MaterialProperties {
            density: 1000.0,
            restitution: 0.5,
            kinetic_friction: 0.4,
        })
    }

    fn sphere_desc(position: Vec3, material: PhysicsHandle) -> BodyDesc {
        BodyDesc::new(position, material, Collider::sphere(Sphere::new(Vec3::ZERO, 0.5)))
    }

    #[test]
    fn test_handle_round_trip() {
        let world = PhysicalWorld::default();
        let material = test_material(&world);

        let position = Vec3::new(1.0, 2.0, 3.0);
        let handle = world.add_kinematic(&sphere_desc(position, material)).unwrap();

        assert_eq!(handle.kind(), PhysicsKind::Kinematic);
        let transform = world.get_transform(handle).unwrap();
        assert_eq!(transform.translation(), position);
    }

    #[test]
    fn test_material_required() {
        let world = PhysicalWorld::default();
        let bogus = PhysicsHandle::new(PhysicsKind::Material, 3);

        let result = std::panic::catch_unwind(|| {
            world.add_kinematic(&sphere_desc(Vec3::ZERO, bogus))
        });
        // Debug builds assert; release builds surface the error.
        if let Ok(result) = result {
            assert_eq!(result, Err(PhysicsError::MaterialMissing(bogus)));
        }
    }

    #[test]
    fn test_kinematic_rejects_bare_aabb() {
        let world = PhysicalWorld::default();
        let material = test_material(&world);

        let desc = BodyDesc::new(
            Vec3::ZERO,
            material,
            Collider::aabb(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE)),
        );
        assert_eq!(world.add_kinematic(&desc), Err(PhysicsError::InvalidCollider));

        // The same collider is fine on a static body.
        assert!(world.add_static(&desc).is_ok());
    }

    #[test]
    fn test_destroy_decrements_later_indices() {
        let world = PhysicalWorld::default();
        let material = test_material(&world);

        let a = world.add_kinematic(&sphere_desc(Vec3::new(0.0, 0.0, 0.0), material)).unwrap();
        let b = world.add_kinematic(&sphere_desc(Vec3::new(10.0, 0.0, 0.0), material)).unwrap();
        let c = world.add_kinematic(&sphere_desc(Vec3::new(20.0, 0.0, 0.0), material)).unwrap();

        world.destroy(b).unwrap();

        // Public handles survive removal of a sibling; transforms stay put.
        assert_eq!(world.get_transform(a).unwrap().translation(), Vec3::ZERO);
        assert_eq!(
            world.get_transform(c).unwrap().translation(),
            Vec3::new(20.0, 0.0, 0.0)
        );
        assert_eq!(
            world.get_transform(b),
            Err(PhysicsError::HandleUnknown(b))
        );
    }

    #[test]
    fn test_destroyed_slot_is_reused() {
        let world = PhysicalWorld::default();
        let material = test_material(&world);

        let a = world.add_kinematic(&sphere_desc(Vec3::ZERO, material)).unwrap();
        world.destroy(a).unwrap();
        let b = world.add_kinematic(&sphere_desc(Vec3::ONE, material)).unwrap();

        // The nulled lookup slot is recycled for the new body.
        assert_eq!(a.index(), b.index());
        assert!(world.get_transform(b).is_ok());
    }

    #[test]
    fn test_invalid_handles_are_rejected() {
        let world = PhysicalWorld::default();

        assert_eq!(
            world.get_transform(PhysicsHandle::NULL),
            Err(PhysicsError::HandleInvalid(PhysicsHandle::NULL))
        );

        let material = test_material(&world);
        let handle = world
            .add_kinematic(&sphere_desc(Vec3::ZERO, material))
            .unwrap();

        // Implementation bits must be clear on the public boundary.
        let tainted = PhysicsHandle(handle.0 | 0x0040_0000);
        assert_eq!(
            world.get_transform(tainted),
            Err(PhysicsError::HandleInvalid(tainted))
        );

        // Type tag must match the stored object.
        let wrong_kind = PhysicsHandle::new(PhysicsKind::Static, handle.index());
        assert!(world.get_transform(wrong_kind).is_err());

        // Materials have no transform.
        assert_eq!(
            world.get_transform(material),
            Err(PhysicsError::HandleInvalid(material))
        );
    }

    #[test]
    fn test_light_lifecycle() {
        let world = PhysicalWorld::default();
        let transform = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));

        let light = world.add_light(transform);
        assert_eq!(light.kind(), PhysicsKind::LightSource);
        assert_eq!(world.get_transform(light).unwrap(), transform);

        world.destroy(light).unwrap();
        assert!(world.get_transform(light).is_err());
    }

    #[test]
    fn test_render_visible_walks_frustum_hits() {
        use talos_core::math::Plane;

        let world = PhysicalWorld::default();
        let material = test_material(&world);

        let near = world
            .add_kinematic(&sphere_desc(Vec3::new(1.0, 2.0, 3.0), material))
            .unwrap();
        let far = world
            .add_static(&sphere_desc(Vec3::new(100.0, 0.0, 0.0), material))
            .unwrap();

        // An axis-aligned box "frustum" around the origin.
        let frustum = Frustum::new([
            Plane::new(Vec3::X, -10.0),
            Plane::new(-Vec3::X, -10.0),
            Plane::new(Vec3::Y, -10.0),
            Plane::new(-Vec3::Y, -10.0),
            Plane::new(Vec3::Z, -10.0),
            Plane::new(-Vec3::Z, -10.0),
        ]);

        let mut seen = Vec::new();
        world.render_visible(&frustum, &mut |handle, transform| {
            seen.push((handle, transform.translation()));
        });

        assert_eq!(seen, vec![(near, Vec3::new(1.0, 2.0, 3.0))]);
        let _ = far;
    }

    #[test]
    fn test_raycast_through_world() {
        let world = PhysicalWorld::default();
        let material = test_material(&world);
        let handle = world
            .add_static(&sphere_desc(Vec3::new(5.0, 0.0, 0.0), material))
            .unwrap();

        let hit = world.raycast(&Ray::new(Vec3::ZERO, Vec3::X));
        assert_eq!(hit, Some(handle));
    }
}
