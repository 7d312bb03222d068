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

//! Separating-axis intersection test for oriented bounding boxes.
//!
//! Both boxes are projected onto 15 candidate axes: the three face normals
//! of each box plus the nine pairwise edge cross products. A gap on any
//! axis proves separation; otherwise the axis with the smallest overlap is
//! the contact normal and the clipped face/edge points form the contact
//! polygon.

use talos_core::math::{plane_clip_line, project_interval, Obb, Plane, Vec3};

/// Maximum number of contact points reported for one box pair.
pub const MAX_CONTACTS: usize = 4;

/// The minimum-depth axis of an intersecting box pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatHit {
    /// Unit contact normal, pointing from the first box towards the second.
    pub normal: Vec3,
    /// Penetration depth along the normal (positive).
    pub depth: f32,
}

/// Builds the 15 candidate axes for a box pair.
fn candidate_axes(obb1: &Obb, obb2: &Obb) -> [Vec3; 15] {
    let mut axes = [Vec3::ZERO; 15];
    axes[0] = obb1.right();
    axes[1] = obb1.up();
    axes[2] = obb1.forward();
    axes[3] = obb2.right();
    axes[4] = obb2.up();
    axes[5] = obb2.forward();

    for i in 0..3 {
        axes[6 + i * 3] = axes[i].cross(axes[3]);
        axes[6 + i * 3 + 1] = axes[i].cross(axes[4]);
        axes[6 + i * 3 + 2] = axes[i].cross(axes[5]);
    }
    axes
}

/// Tests two oriented boxes for intersection.
///
/// Returns the minimum-depth axis when the boxes overlap, `None` when a
/// separating axis exists.
pub fn test(obb1: &Obb, obb2: &Obb) -> Option<SatHit> {
    let c1 = obb1.corners();
    let c2 = obb2.corners();

    let mut normal = Vec3::ZERO;
    let mut min_depth = f32::MAX;

    for axis in candidate_axes(obb1, obb2) {
        // Cross products of near-parallel box axes degenerate to zero;
        // those axes carry no information.
        if (axis.length_squared() - 1.0).abs() > 1e-3 {
            continue;
        }

        let (a_min, a_max) = project_interval(&c1, axis);
        let (b_min, b_max) = project_interval(&c2, axis);

        // A gap on any axis separates the boxes.
        if b_min > a_max || a_min > b_max {
            return None;
        }

        let depth = (a_max - a_min) + (b_max - b_min) - (a_max.max(b_max) - a_min.min(b_min));
        if depth < min_depth {
            min_depth = depth;
            normal = if b_min < a_min { -axis } else { axis };
        }
    }

    Some(SatHit {
        normal,
        depth: min_depth,
    })
}

/// The 12 edges of a box, as index pairs into [`Obb::corners`].
///
/// Corner `i` encodes its octant bitwise, so edges connect corners that
/// differ in exactly one bit.
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Builds the six face planes of a box, normals pointing outward.
fn face_planes(obb: &Obb) -> [Plane; 6] {
    let r = obb.right();
    let u = obb.up();
    let f = obb.forward();
    let c = obb.center;
    let e = obb.extents;

    [
        Plane::new(r, r.dot(c + r * e.x)),
        Plane::new(-r, -r.dot(c - r * e.x)),
        Plane::new(u, u.dot(c + u * e.y)),
        Plane::new(-u, -u.dot(c - u * e.y)),
        Plane::new(f, f.dot(c + f * e.z)),
        Plane::new(-f, -f.dot(c - f * e.z)),
    ]
}

/// Computes the contact polygon of an intersecting box pair.
///
/// Edge segments of each box are clipped against the face planes of the
/// other; surviving points inside the opposing box are projected onto the
/// mid-penetration plane and deduplicated. Returns one to four points, or
/// none for pathological deep overlaps.
pub fn contact_points(obb1: &Obb, obb2: &Obb, hit: &SatHit) -> Vec<Vec3> {
    let c1 = obb1.corners();
    let c2 = obb2.corners();
    let p1 = face_planes(obb1);
    let p2 = face_planes(obb2);

    let mut contacts = Vec::new();

    // Points on the edges of the second box that cross the first box.
    for plane in &p1 {
        for &(a, b) in &EDGES {
            if let Some(p) = plane_clip_line(plane, c2[a], c2[b]) {
                if obb1.contains_point(p) {
                    contacts.push(p);
                }
            }
        }
    }

    // And the reverse.
    for plane in &p2 {
        for &(a, b) in &EDGES {
            if let Some(p) = plane_clip_line(plane, c1[a], c1[b]) {
                if obb2.contains_point(p) {
                    contacts.push(p);
                }
            }
        }
    }

    // The reference point of impact along the normal.
    let (i_min, i_max) = project_interval(&c1, hit.normal);
    let d = (i_max - i_min) * 0.5 - hit.depth * 0.5;
    let reference = obb1.center + hit.normal * d;

    // Flatten the points onto the plane through the reference point, then
    // drop near-duplicates.
    let n = hit.normal;
    let mut culled: Vec<Vec3> = Vec::new();
    for point in contacts {
        let projected = point + n * n.dot(reference - point);
        if !culled
            .iter()
            .any(|c| c.distance_squared(projected) < 1e-4)
        {
            culled.push(projected);
        }
        if culled.len() == MAX_CONTACTS {
            break;
        }
    }

    culled
}

#[cfg(test)]
mod tests {
    use super::*;
    use talos_core::math::{Mat3, Quaternion, FRAC_PI_4};

    fn axis_aligned(center: Vec3, extents: Vec3) -> Obb {
        Obb::new(center, extents, Mat3::IDENTITY)
    }

    #[test]
    fn test_separated_boxes_report_no_hit() {
        let a = axis_aligned(Vec3::ZERO, Vec3::ONE);
        let b = axis_aligned(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE);
        assert!(test(&a, &b).is_none());
    }

    #[test]
    fn test_face_overlap_normal_and_depth() {
        let a = axis_aligned(Vec3::ZERO, Vec3::ONE);
        let b = axis_aligned(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);

        let hit = test(&a, &b).unwrap();
        assert!((hit.depth - 0.5).abs() < 1e-5);
        // Normal points from the first box towards the second.
        assert!((hit.normal - Vec3::X).length() < 1e-5);

        let flipped = test(&b, &a).unwrap();
        assert!((flipped.normal + Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_rotated_box_still_hits() {
        let a = axis_aligned(Vec3::ZERO, Vec3::ONE);
        let rot = Mat3::from_quaternion(Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_4));
        let b = Obb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE, rot);

        // The rotated box reaches sqrt(2) towards the first box.
        assert!(test(&a, &b).is_some());

        let far = Obb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE, rot);
        assert!(test(&a, &far).is_none());
    }

    #[test]
    fn test_contact_points_on_touching_faces() {
        let a = axis_aligned(Vec3::ZERO, Vec3::ONE);
        let b = axis_aligned(Vec3::new(1.8, 0.0, 0.0), Vec3::ONE);

        let hit = test(&a, &b).unwrap();
        let points = contact_points(&a, &b, &hit);

        assert!(!points.is_empty());
        assert!(points.len() <= MAX_CONTACTS);
        // All points lie near the x = 0.9 mid-penetration plane.
        for p in &points {
            assert!((p.x - 0.9).abs() < 1e-3, "stray contact point {p:?}");
        }
    }

    #[test]
    fn test_stacked_boxes_contact_normal_is_vertical() {
        let floor = axis_aligned(Vec3::ZERO, Vec3::new(10.0, 0.5, 10.0));
        let cube = axis_aligned(Vec3::new(0.0, 0.9, 0.0), Vec3::splat(0.5));

        let hit = test(&floor, &cube).unwrap();
        assert!(hit.normal.y > 0.99);
        assert!((hit.depth - 0.1).abs() < 1e-4);
    }
}
