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

//! Provides geometric primitive shapes for spatial calculations.
//!
//! This module contains the bounding volumes and query primitives used by
//! the broad phase, the narrow phase, and visibility culling.

use serde::{Deserialize, Serialize};

use super::{Mat3, Mat4, Vec3, EPSILON};

// --- Aabb ---

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// An AABB is a rectangular prism aligned with the coordinate axes, defined
/// by its minimum and maximum corner points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An invalid `Aabb` where `min` components are positive infinity and
    /// `max` are negative infinity.
    ///
    /// This is a neutral starting point for merging operations.
    pub const INVALID: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a new `Aabb` from two corner points.
    ///
    /// The corners may be passed in any order; `min`/`max` are sorted
    /// component-wise.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let he = half_extents.abs();
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Calculates the center point of the `Aabb`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents (half the size on each axis) of the `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Calculates the surface area of the box.
    ///
    /// This is the cost metric of the surface-area heuristic used by the
    /// bounding-volume hierarchy.
    #[inline]
    pub fn surface_area(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Checks if a point is contained within or on the boundary of the `Aabb`.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Checks if this `Aabb` intersects with another `Aabb`.
    ///
    /// Boxes that only touch at the boundary are considered intersecting.
    #[inline]
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        (self.min.x <= other.max.x && self.max.x >= other.min.x)
            && (self.min.y <= other.max.y && self.max.y >= other.min.y)
            && (self.min.z <= other.max.z && self.max.z >= other.min.z)
    }

    /// Creates a new `Aabb` that encompasses both this `Aabb` and another one.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the closest point on or inside the box to the specified point.
    #[inline]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.max(self.min).min(self.max)
    }

    /// Returns the box grown by `amount` on every axis (half on each side).
    #[inline]
    pub fn inflate(&self, amount: f32) -> Self {
        let half = Vec3::splat(amount * 0.5);
        Self {
            min: self.min - half,
            max: self.max + half,
        }
    }

    /// Returns the box translated by `offset`.
    #[inline]
    pub fn translate(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Computes the bounding box that encloses this `Aabb` after an affine
    /// transformation.
    ///
    /// Transforms the center and projects the extents onto the absolute
    /// rotation columns, which is cheaper than transforming all 8 corners.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center());
        let he = self.half_extents();

        let x_abs = matrix.cols[0].truncate().abs();
        let y_abs = matrix.cols[1].truncate().abs();
        let z_abs = matrix.cols[2].truncate().abs();

        let new_he = x_abs * he.x + y_abs * he.y + z_abs * he.z;
        Aabb::from_center_half_extents(center, new_he)
    }

    /// Returns the 8 corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            lo,
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            hi,
        ]
    }

    /// Performs a slab test against a ray described by its origin and the
    /// reciprocal of its direction.
    ///
    /// Returns the entry distance along the ray, or `None` when the ray
    /// misses. A ray starting inside the box reports distance zero.
    pub fn intersect_ray(&self, origin: Vec3, recip_dir: Vec3) -> Option<f32> {
        let t1 = (self.min - origin) * recip_dir;
        let t2 = (self.max - origin) * recip_dir;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let near = t_min.x.max(t_min.y).max(t_min.z);
        let far = t_max.x.min(t_max.y).min(t_max.z);

        if near <= far && far >= 0.0 {
            Some(near.max(0.0))
        } else {
            None
        }
    }
}

impl Default for Aabb {
    /// Returns the default `Aabb`, which is `Aabb::INVALID`.
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

// --- Sphere ---

/// A sphere described by its center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Sphere {
    /// The center of the sphere.
    pub center: Vec3,
    /// The radius of the sphere.
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere.
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Checks whether two spheres intersect.
    #[inline]
    pub fn intersects_sphere(&self, other: &Sphere) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) < r * r
    }

    /// Returns the sphere moved into world space by the given transform.
    ///
    /// Non-uniform scale is approximated by scaling the radius with the
    /// largest column length.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center);
        let sx = matrix.cols[0].truncate().length();
        let sy = matrix.cols[1].truncate().length();
        let sz = matrix.cols[2].truncate().length();
        Self {
            center,
            radius: self.radius * sx.max(sy).max(sz),
        }
    }
}

// --- Obb ---

/// An oriented bounding box: a center, half-extents, and a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Obb {
    /// The center of the box.
    pub center: Vec3,
    /// Half of the size of the box along its local axes.
    pub extents: Vec3,
    /// The orientation of the box.
    pub orientation: Mat3,
}

impl Obb {
    /// Creates a new oriented bounding box.
    #[inline]
    pub const fn new(center: Vec3, extents: Vec3, orientation: Mat3) -> Self {
        Self {
            center,
            extents,
            orientation,
        }
    }

    /// Returns the local right axis of the box.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.orientation.right()
    }

    /// Returns the local up axis of the box.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.orientation.up()
    }

    /// Returns the local forward axis of the box.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation.forward()
    }

    /// Returns the 8 corners of the box in world space.
    pub fn corners(&self) -> [Vec3; 8] {
        let e = self.extents;
        let mut result = [Vec3::ZERO; 8];
        for (i, corner) in result.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { -e.x } else { e.x },
                if i & 2 == 0 { -e.y } else { e.y },
                if i & 4 == 0 { -e.z } else { e.z },
            );
            *corner = self.center + self.orientation * local;
        }
        result
    }

    /// Returns the closest point on or inside the box to the specified point.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        let mut result = self.center;
        for i in 0..3 {
            let axis = self.orientation.cols[i];
            let dist = d.dot(axis).clamp(-self.extents[i], self.extents[i]);
            result += axis * dist;
        }
        result
    }

    /// Checks whether a world-space point lies inside the box.
    pub fn contains_point(&self, point: Vec3) -> bool {
        let d = point - self.center;
        for i in 0..3 {
            let dist = d.dot(self.orientation.cols[i]);
            // Tolerance keeps clipped edge points on the face inside.
            if dist.abs() > self.extents[i] + 1e-3 {
                return false;
            }
        }
        true
    }

    /// Returns the box moved into world space by a translation and rotation.
    pub fn transform(&self, translation: Vec3, rotation: Mat3) -> Self {
        Self {
            center: rotation * self.center + translation,
            extents: self.extents,
            orientation: rotation * self.orientation,
        }
    }

    /// Computes the tight axis-aligned bounding box enclosing the box.
    pub fn to_aabb(&self) -> Aabb {
        let abs = Mat3::from_cols(
            self.orientation.cols[0].abs(),
            self.orientation.cols[1].abs(),
            self.orientation.cols[2].abs(),
        );
        let he = abs * self.extents;
        Aabb::from_center_half_extents(self.center, he)
    }
}

// --- Plane ---

/// A plane in constant-normal form: `dot(normal, p) = d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Plane {
    /// The plane normal. Should be of unit length.
    pub normal: Vec3,
    /// The distance of the plane from the origin along the normal.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane from a normal and a distance.
    #[inline]
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Returns the signed distance of the point to the plane.
    ///
    /// Positive values lie in the half-space the normal points into.
    #[inline]
    pub fn halfspace(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.d
    }
}

// --- Frustum ---

/// A view frustum described by six inward-facing planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// The planes of the frustum (left, right, bottom, top, near, far).
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Creates a frustum from its six planes.
    #[inline]
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Checks whether the specified box intersects with (or is contained in)
    /// the frustum.
    ///
    /// A box is rejected as soon as all of its corners lie behind a single
    /// plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let corners = aabb.corners();
        for plane in &self.planes {
            let inside = corners.iter().any(|&c| plane.halfspace(c) >= 0.0);
            if !inside {
                return false;
            }
        }
        true
    }
}

// --- Ray ---

/// A ray in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Ray {
    /// Origin point.
    pub origin: Vec3,
    /// Direction vector (should be normalized).
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray.
    #[inline]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Returns the component-wise reciprocal of the ray direction, for use
    /// with [`Aabb::intersect_ray`].
    ///
    /// Zero direction components map to infinity, which the slab test
    /// handles naturally.
    #[inline]
    pub fn recip_direction(&self) -> Vec3 {
        Vec3::new(
            1.0 / self.direction.x,
            1.0 / self.direction.y,
            1.0 / self.direction.z,
        )
    }
}

/// Projects the corners of a box onto an axis and returns the
/// `(min, max)` interval of the projection.
pub fn project_interval(corners: &[Vec3; 8], axis: Vec3) -> (f32, f32) {
    let first = axis.dot(corners[0]);
    let mut result = (first, first);
    for corner in corners.iter().skip(1) {
        let d = axis.dot(*corner);
        result.0 = result.0.min(d);
        result.1 = result.1.max(d);
    }
    result
}

/// Clips a line segment against a plane.
///
/// Returns the intersection point when the segment crosses the plane.
pub fn plane_clip_line(plane: &Plane, start: Vec3, end: Vec3) -> Option<Vec3> {
    let ab = end - start;
    let nda = plane.normal.dot(start);
    let ndab = plane.normal.dot(ab);

    if ndab.abs() <= EPSILON {
        return None;
    }

    let t = (plane.d - nda) / ndab;
    if (0.0..=1.0).contains(&t) {
        Some(start + ab * t)
    } else {
        None
    }
}

// --- Tests ---
