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

//! # Contact Detection System
//!
//! For every non-sleeping moving body, queries the BVH with the body's
//! cached expanded broad-phase box and runs a shape-vs-shape narrow phase
//! on every overlapping pair. Confirmed contacts are appended to a
//! SIMD-packed stream the solver consumes eight at a time.
//!
//! The system owns a heap copy of every narrow-phase shape, keyed by
//! public handle, so callers may drop their shape source after adding a
//! body.

pub mod sat;

use std::collections::BTreeMap;

use crate::bvh::Bvh;
use crate::collider::{Collider, ColliderShape, ShapeKind};
use crate::error::PhysicsError;
use crate::motion::MotionSystem;
use crate::world::HandleLut;
use talos_core::math::{Aabb, Mat4, Obb, Sphere, Vec2, Vec3};
use talos_core::physics::{PhysicsHandle, PhysicsKind};
use talos_core::simd::LaneVec;

#[cfg(debug_assertions)]
use talos_core::physics::DebugRenderer;

/// SIMD-packed stream of the contacts found in one sub-step.
///
/// Struct-of-arrays so the solver reads eight contacts per iteration
/// without gathering.
#[derive(Debug, Default)]
pub struct ContactStream {
    /// First handle of each collision; the static/heavier body when the
    /// pair's types differ.
    pub first: Vec<PhysicsHandle>,
    /// Second handle of each collision; always a moving body.
    pub second: Vec<PhysicsHandle>,
    /// X component of the contact point.
    pub px: LaneVec,
    /// Y component of the contact point.
    pub py: LaneVec,
    /// Z component of the contact point.
    pub pz: LaneVec,
    /// X component of the contact normal.
    pub nx: LaneVec,
    /// Y component of the contact normal.
    pub ny: LaneVec,
    /// Z component of the contact normal.
    pub nz: LaneVec,
    /// Penetration depth (positive).
    pub depth: LaneVec,
    /// Effect multiplier; defaults to 1 and tunes elasticity.
    pub effect: LaneVec,
}

impl ContactStream {
    /// Returns the number of contacts in the stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.first.len()
    }

    /// Returns `true` when no contacts were emitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Returns the contact point of collision `i`.
    pub fn point(&self, i: usize) -> Vec3 {
        Vec3::new(self.px.get(i), self.py.get(i), self.pz.get(i))
    }

    /// Returns the contact normal of collision `i`.
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.nx.get(i), self.ny.get(i), self.nz.get(i))
    }

    fn clear(&mut self) {
        self.first.clear();
        self.second.clear();
        self.px.clear();
        self.py.clear();
        self.pz.clear();
        self.nx.clear();
        self.ny.clear();
        self.nz.clear();
        self.depth.clear();
        self.effect.clear();
    }

    fn push(&mut self, first: PhysicsHandle, second: PhysicsHandle, point: Vec3, normal: Vec3, depth: f32) {
        self.first.push(first);
        self.second.push(second);
        self.px.push(point.x);
        self.py.push(point.y);
        self.pz.push(point.z);
        self.nx.push(normal.x);
        self.ny.push(normal.y);
        self.nz.push(normal.z);
        self.depth.push(depth);
        self.effect.push(1.0);
    }
}

/// Profiling counters, reset on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContactCounters {
    /// BVH inserts and removes performed.
    pub bvh_updates: u32,
    /// Narrow-phase pair tests dispatched.
    pub narrow_checks: u32,
    /// Contacts emitted into the stream.
    pub collisions: u32,
}

type Kernel = fn(&mut ContactSystem, PhysicsHandle, PhysicsHandle, &mut MotionSystem, &HandleLut);

/// Detects collisions between bodies and produces the contact stream.
#[derive(Debug, Default)]
pub struct ContactSystem {
    /// Heap-owned narrow-phase shapes keyed by public handle.
    shapes: BTreeMap<PhysicsHandle, ColliderShape>,
    /// Local-space broad-phase boxes of moving bodies, by packed index.
    raw_broad_phase: Vec<Aabb>,
    /// World-space (expanded) broad-phase boxes as inserted in the BVH.
    cached_broad_phase: BTreeMap<PhysicsHandle, Aabb>,

    stream: ContactStream,
    drift_cache: Vec<usize>,
    broad_cache: Vec<PhysicsHandle>,
    counters: ContactCounters,
}

impl ContactSystem {
    /// Creates an empty contact system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contact stream of the last `check` call.
    #[inline]
    pub fn stream(&self) -> &ContactStream {
        &self.stream
    }

    /// Returns the profiling counters.
    #[inline]
    pub fn counters(&self) -> ContactCounters {
        self.counters
    }

    /// Resets the profiling counters.
    pub fn reset_counters(&mut self) {
        self.counters = ContactCounters::default();
    }

    /// Registers a collider for the specified body and inserts its
    /// broad-phase box into the BVH.
    ///
    /// Moving bodies get their box inflated by `expansion` so small
    /// movements don't churn the tree, and may not use a bare-AABB
    /// collider.
    pub fn add_body(
        &mut self,
        handle: PhysicsHandle,
        collider: &Collider,
        transform: &Mat4,
        bvh: &mut Bvh,
        expansion: f32,
    ) -> Result<(), PhysicsError> {
        let moving = handle.kind().is_body();
        if moving && matches!(collider.shape, ColliderShape::None) {
            log::error!("kinematic objects cannot have a bare AABB collider");
            return Err(PhysicsError::InvalidCollider);
        }

        let mut world_box = collider.broad_phase.transform(transform);
        if moving {
            world_box = world_box.inflate(expansion);
            self.raw_broad_phase.push(collider.broad_phase);
        }

        bvh.insert(handle, world_box)
            .expect("fresh public handle already present in the BVH");
        self.counters.bvh_updates += 1;

        self.cached_broad_phase.insert(handle, world_box);
        self.shapes.insert(handle, collider.shape.clone());
        Ok(())
    }

    /// Removes the body's collider, broad-phase cache, and BVH leaf.
    pub fn remove_body(&mut self, handle: PhysicsHandle, internal_index: u16, bvh: &mut Bvh) {
        self.cached_broad_phase.remove(&handle);
        if let Err(err) = bvh.remove(handle) {
            log::error!("unable to remove leaf node from BVH: {err}");
        }
        self.counters.bvh_updates += 1;

        if handle.kind().is_body() {
            self.raw_broad_phase.remove(internal_index as usize);
        }
        self.shapes.remove(&handle);
    }

    /// Runs one detection pass: refreshes the BVH entries of bodies that
    /// drifted out of their expanded box, then finds and tests every
    /// overlapping pair driven by a non-sleeping moving body.
    pub fn check(
        &mut self,
        bvh: &mut Bvh,
        motion: &mut MotionSystem,
        lut: &HandleLut,
        expansion: f32,
    ) {
        self.stream.clear();

        // Query the motion system for bodies that left their indexed box.
        let mut drifted = std::mem::take(&mut self.drift_cache);
        drifted.clear();
        motion.check_drift(expansion * 0.5, &mut drifted);

        for &idx in &drifted {
            let internal = PhysicsHandle::new(PhysicsKind::Kinematic, idx as u16);
            let public = lut.public_of(internal);
            if public.is_null() {
                log::warn!("drifted body {idx} has no public handle");
                continue;
            }

            if let Err(err) = bvh.remove(public) {
                log::error!("unable to refresh BVH entry: {err}");
                continue;
            }

            let fresh = self.raw_broad_phase[idx]
                .transform(&motion.get_transform(internal))
                .inflate(expansion);
            self.cached_broad_phase.insert(public, fresh);
            bvh.insert(public, fresh)
                .expect("refreshed handle already present in the BVH");
            self.counters.bvh_updates += 2;
        }
        self.drift_cache = drifted;

        // Broad phase: every awake moving body drives one boxcast; sleeping
        // bodies stay valid targets but never drive a query.
        let drivers: Vec<(PhysicsHandle, Aabb)> = self
            .cached_broad_phase
            .iter()
            .filter(|(h, _)| h.kind().is_body())
            .filter(|(h, _)| !motion.is_sleeping(lut.internal_index(**h) as usize))
            .map(|(h, bb)| (*h, *bb))
            .collect();

        let mut hits = std::mem::take(&mut self.broad_cache);
        for (driver, bounds) in drivers {
            hits.clear();
            bvh.boxcast(&bounds, &mut hits);

            for i in 0..hits.len() {
                let hit = hits[i];
                if hit != driver {
                    self.test_pair(hit, driver, motion, lut);
                }
            }
        }
        self.broad_cache = hits;
    }

    /// Draws the cached broad-phase boxes and narrow-phase shapes, plus the
    /// contact points of the last pass.
    #[cfg(debug_assertions)]
    pub fn visualize(&self, renderer: &mut dyn DebugRenderer, motion: &MotionSystem, lut: &HandleLut) {
        for (handle, bounds) in &self.cached_broad_phase {
            renderer.add_box(bounds);

            match self.shapes.get(handle) {
                Some(ColliderShape::Sphere(sphere)) => {
                    let world = sphere.transform(&motion.get_transform(lut.internal_of(*handle)));
                    renderer.add_sphere(&world);
                }
                Some(ColliderShape::Obb(obb)) => {
                    let m = motion.get_transform(lut.internal_of(*handle));
                    renderer.add_box(&obb.transform(m.translation(), m.rotation_part()).to_aabb());
                }
                _ => {}
            }
        }

        for i in 0..self.stream.len() {
            renderer.add_arrow(self.stream.point(i), self.stream.normal(i), self.stream.depth.get(i));
        }
    }

    // --- Narrow phase ---

    fn kernel_for(first: ShapeKind, second: ShapeKind) -> Option<Kernel> {
        match (first, second) {
            (ShapeKind::Sphere, ShapeKind::Sphere) => Some(Self::test_sphere_sphere),
            (ShapeKind::None, ShapeKind::Sphere) => Some(Self::test_aabb_sphere),
            (ShapeKind::HeightField, ShapeKind::Sphere) => Some(Self::test_heightfield_sphere),
            (ShapeKind::Obb, ShapeKind::Sphere) => Some(Self::test_obb_sphere),
            (ShapeKind::Obb, ShapeKind::Obb) => Some(Self::test_obb_obb),
            _ => None,
        }
    }

    /// Dispatches a pair to its shape kernel, retrying with the operands
    /// swapped before giving up.
    fn test_pair(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        self.counters.narrow_checks += 1;

        let (Some(shape1), Some(shape2)) = (self.shapes.get(&first), self.shapes.get(&second))
        else {
            return;
        };
        let (kind1, kind2) = (shape1.kind(), shape2.kind());

        if let Some(kernel) = Self::kernel_for(kind1, kind2) {
            kernel(self, first, second, motion, lut);
        } else if let Some(kernel) = Self::kernel_for(kind2, kind1) {
            kernel(self, second, first, motion, lut);
        } else {
            log::warn!("unable to check for collision between {kind1:?} and {kind2:?}");
        }
    }

    fn world_sphere(&self, handle: PhysicsHandle, motion: &MotionSystem, lut: &HandleLut) -> Sphere {
        let ColliderShape::Sphere(sphere) = &self.shapes[&handle] else {
            unreachable!("kernel dispatched on a non-sphere shape");
        };
        sphere.transform(&motion.get_transform(lut.internal_of(handle)))
    }

    fn world_obb(&self, handle: PhysicsHandle, motion: &MotionSystem, lut: &HandleLut) -> Obb {
        let ColliderShape::Obb(obb) = &self.shapes[&handle] else {
            unreachable!("kernel dispatched on a non-OBB shape");
        };
        let m = motion.get_transform(lut.internal_of(handle));
        obb.transform(m.translation(), m.rotation_part())
    }

    fn test_sphere_sphere(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        let s1 = self.world_sphere(first, motion, lut);
        let s2 = self.world_sphere(second, motion, lut);

        if s1.intersects_sphere(&s2) {
            let dist = (s2.center - s1.center).length();
            let normal = if dist > 1e-4 {
                (s2.center - s1.center) / dist
            } else {
                Vec3::Y
            };
            let point = s1.center + normal * s1.radius;
            let depth = (s1.radius + s2.radius) - dist;
            self.add_manifold(first, second, point, normal, depth, motion, lut);
        }
    }

    fn test_aabb_sphere(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        // The bare broad-phase box itself is the collider.
        let bounds = self.cached_broad_phase[&first];
        let sphere = self.world_sphere(second, motion, lut);

        let closest = bounds.closest_point(sphere.center);
        let dist_sq = closest.distance_squared(sphere.center);
        if dist_sq < sphere.radius * sphere.radius {
            let dist = dist_sq.sqrt();
            let normal = if dist > 1e-4 {
                (sphere.center - closest) / dist
            } else {
                Vec3::Y
            };
            let point = sphere.center - normal * sphere.radius;
            let depth = sphere.radius - dist;
            self.add_manifold(first, second, point, normal, depth, motion, lut);
        }
    }

    fn test_obb_sphere(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        let obb = self.world_obb(first, motion, lut);
        let sphere = self.world_sphere(second, motion, lut);

        let closest = obb.closest_point(sphere.center);
        let dist_sq = closest.distance_squared(sphere.center);
        if dist_sq < sphere.radius * sphere.radius {
            let dist = dist_sq.sqrt();
            let normal = if dist > 1e-4 {
                (sphere.center - closest) / dist
            } else {
                obb.up()
            };
            let depth = sphere.radius - dist;
            self.add_manifold(first, second, closest, normal, depth, motion, lut);
        }
    }

    fn test_heightfield_sphere(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        let offset = motion.get_transform(lut.internal_of(first)).translation();
        let sphere = self.world_sphere(second, motion, lut);

        let ColliderShape::HeightField(field) = &self.shapes[&first] else {
            unreachable!("kernel dispatched on a non-height-field shape");
        };

        // Sample the terrain under the sphere's center in field space.
        let query = Vec2::new(sphere.center.x - offset.x, sphere.center.z - offset.z);
        let Some((height, normal)) = field.try_sample(query) else {
            return;
        };

        // The sphere touches the terrain once its lowest point dips below
        // the sampled height.
        let lowest = sphere.center.y - sphere.radius;
        if height >= lowest {
            let point = Vec3::new(sphere.center.x, offset.y + height, sphere.center.z);
            let depth = height - lowest;
            self.add_manifold(first, second, point, normal, depth, motion, lut);
        }
    }

    fn test_obb_obb(
        &mut self,
        first: PhysicsHandle,
        second: PhysicsHandle,
        motion: &mut MotionSystem,
        lut: &HandleLut,
    ) {
        let obb1 = self.world_obb(first, motion, lut);
        let obb2 = self.world_obb(second, motion, lut);

        let Some(hit) = sat::test(&obb1, &obb2) else {
            return;
        };

        // One manifold per pair: condense the clipped polygon into its
        // centroid, falling back to the mid-penetration reference point.
        let points = sat::contact_points(&obb1, &obb2, &hit);
        let point = if points.is_empty() {
            let half_span = obb1.extents.dot(hit.normal.abs());
            obb1.center + hit.normal * (half_span - hit.depth * 0.5)
        } else {
            let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
            sum / points.len() as f32
        };

        self.add_manifold(first, second, point, hit.normal, hit.depth, motion, lut);
    }

    /// Appends a contact to the stream, unless it duplicates an earlier
    /// pair or the bodies are already separating.
    #[allow(clippy::too_many_arguments)]
    fn add_manifold(
        &mut self,
        mut first: PhysicsHandle,
        mut second: PhysicsHandle,
        point: Vec3,
        mut normal: Vec3,
        depth: f32,
        motion: &MotionSystem,
        lut: &HandleLut,
    ) {
        // Keep the static body first so the solver can treat the second
        // slot as always movable.
        if second.kind() == PhysicsKind::Static && first.kind() != PhysicsKind::Static {
            std::mem::swap(&mut first, &mut second);
            normal = -normal;
        }

        // Ignore duplicate collisions, in either order.
        for i in 0..self.stream.len() {
            let (f, s) = (self.stream.first[i], self.stream.second[i]);
            if (f == first && s == second) || (f == second && s == first) {
                return;
            }
        }

        // Ignore pairs that are already separating along the normal.
        let v1 = if first.kind() == PhysicsKind::Static {
            Vec3::ZERO
        } else {
            motion.get_velocity(lut.internal_index(first) as usize)
        };
        let v2 = motion.get_velocity(lut.internal_index(second) as usize);
        if (v2 - v1).dot(normal) >= 0.0 {
            return;
        }

        self.stream.push(first, second, point, normal, depth);
        self.counters.collisions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MotionDesc;
    use talos_core::math::{Mat3, Quaternion, Sphere};

    /// A tiny world harness: a BVH, a motion system, and a lookup table.
    struct Rig {
        bvh: Bvh,
        motion: MotionSystem,
        lut: HandleLut,
        contacts: ContactSystem,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                bvh: Bvh::new(),
                motion: MotionSystem::new(),
                lut: HandleLut::default(),
                contacts: ContactSystem::new(),
            }
        }

        fn add_kinematic_sphere(&mut self, position: Vec3, velocity: Vec3) -> PhysicsHandle {
            let idx = self.motion.add_body(&MotionDesc {
                position,
                orientation: Quaternion::IDENTITY,
                linear_velocity: velocity,
                angular_velocity: Vec3::ZERO,
                scale: Vec3::ONE,
                drag_coefficient: 0.0,
                inverse_mass: 1.0,
                inverse_inertia: Mat3::IDENTITY,
            });
            let handle = self.lut.alloc(PhysicsKind::Kinematic, idx as u16);
            let collider = Collider::sphere(Sphere::new(Vec3::ZERO, 0.5));
            let transform = Mat4::from_translation(position);
            self.contacts
                .add_body(handle, &collider, &transform, &mut self.bvh, 1.0)
                .unwrap();
            handle
        }

        fn add_static_box(&mut self, bounds: Aabb) -> PhysicsHandle {
            let idx = self.motion.add_static(Mat4::IDENTITY);
            let handle = self.lut.alloc(PhysicsKind::Static, idx as u16);
            self.contacts
                .add_body(handle, &Collider::aabb(bounds), &Mat4::IDENTITY, &mut self.bvh, 1.0)
                .unwrap();
            handle
        }

        fn check(&mut self) {
            self.contacts
                .check(&mut self.bvh, &mut self.motion, &self.lut, 1.0);
        }
    }

    #[test]
    fn test_approaching_spheres_emit_one_contact() {
        let mut rig = Rig::new();
        let a = rig.add_kinematic_sphere(Vec3::new(-0.4, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let b = rig.add_kinematic_sphere(Vec3::new(0.4, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));

        rig.check();

        // Both spheres drive a query; the duplicate is suppressed.
        let stream = rig.contacts.stream();
        assert_eq!(stream.len(), 1);
        let pair = (stream.first[0], stream.second[0]);
        assert!(pair == (a, b) || pair == (b, a));
        assert!(stream.depth.get(0) > 0.0);
        assert!((stream.normal(0).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_separating_spheres_are_filtered() {
        let mut rig = Rig::new();
        rig.add_kinematic_sphere(Vec3::new(-0.4, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        rig.add_kinematic_sphere(Vec3::new(0.4, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

        rig.check();
        assert!(rig.contacts.stream().is_empty());

        // The pairs were still tested.
        assert!(rig.contacts.counters().narrow_checks > 0);
        assert_eq!(rig.contacts.counters().collisions, 0);
    }

    #[test]
    fn test_static_body_is_ordered_first() {
        let mut rig = Rig::new();
        let floor = rig.add_static_box(Aabb::from_min_max(
            Vec3::new(-10.0, -1.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
        ));
        let ball =
            rig.add_kinematic_sphere(Vec3::new(0.0, 0.4, 0.0), Vec3::new(0.0, -1.0, 0.0));

        rig.check();

        let stream = rig.contacts.stream();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.first[0], floor);
        assert_eq!(stream.second[0], ball);
        // Normal points from the floor towards the sphere.
        assert!(stream.normal(0).y > 0.99);
    }

    #[test]
    fn test_sleeping_body_drives_no_queries() {
        let mut rig = Rig::new();
        rig.add_kinematic_sphere(Vec3::new(-0.4, 0.0, 0.0), Vec3::new(0.2, 0.0, 0.0));
        rig.add_kinematic_sphere(Vec3::new(0.4, 0.0, 0.0), Vec3::new(-0.2, 0.0, 0.0));

        // Everything below the sleep threshold: nobody drives, nothing is
        // found, even though the spheres overlap and approach.
        rig.motion.try_sleep(1.0);
        rig.check();
        assert!(rig.contacts.stream().is_empty());
    }

    #[test]
    fn test_drift_refreshes_bvh_entry() {
        let mut rig = Rig::new();
        let handle = rig.add_kinematic_sphere(Vec3::ZERO, Vec3::ZERO);

        // Teleport the body far outside its expanded box.
        let idx = rig.lut.internal_index(handle) as usize;
        rig.motion.apply_impulse(idx, Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);
        rig.motion.integrate(1.0);

        let updates_before = rig.contacts.counters().bvh_updates;
        rig.check();
        assert!(rig.contacts.counters().bvh_updates >= updates_before + 2);

        // The refreshed leaf must cover the new position.
        let mut hits = Vec::new();
        rig.bvh.boxcast(
            &Aabb::from_center_half_extents(Vec3::new(100.0, 0.0, 0.0), Vec3::ONE),
            &mut hits,
        );
        assert_eq!(hits, vec![handle]);
    }

    #[test]
    fn test_unsupported_pair_degrades_safely() {
        use talos_core::math::{HeightField, Obb};

        let mut rig = Rig::new();

        // There is no height-field-vs-OBB kernel in either order; the pair
        // must log and produce no contact instead of panicking.
        let field_idx = rig.motion.add_static(Mat4::IDENTITY);
        let field_handle = rig.lut.alloc(PhysicsKind::Static, field_idx as u16);
        let field = Collider::new(
            Aabb::from_min_max(Vec3::new(0.0, -1.0, 0.0), Vec3::new(10.0, 1.0, 10.0)),
            ColliderShape::HeightField(HeightField::new(11, 11, 10.0, false)),
        );
        rig.contacts
            .add_body(field_handle, &field, &Mat4::IDENTITY, &mut rig.bvh, 1.0)
            .unwrap();

        let obb_idx = rig.motion.add_body(&MotionDesc {
            position: Vec3::new(5.0, 0.3, 5.0),
            orientation: Quaternion::IDENTITY,
            linear_velocity: Vec3::new(0.0, -1.0, 0.0),
            angular_velocity: Vec3::ZERO,
            scale: Vec3::ONE,
            drag_coefficient: 0.0,
            inverse_mass: 1.0,
            inverse_inertia: Mat3::IDENTITY,
        });
        let obb_handle = rig.lut.alloc(PhysicsKind::Kinematic, obb_idx as u16);
        let obb = Collider::obb(Obb::new(Vec3::ZERO, Vec3::splat(0.5), Mat3::IDENTITY));
        let transform = Mat4::from_translation(Vec3::new(5.0, 0.3, 5.0));
        rig.contacts
            .add_body(obb_handle, &obb, &transform, &mut rig.bvh, 1.0)
            .unwrap();

        rig.check();
        assert!(rig.contacts.stream().is_empty());
        assert!(rig.contacts.counters().narrow_checks > 0);
    }
}
