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

//! Provides 3x3 and 4x4 column-major matrix types.

use serde::{Deserialize, Serialize};

use super::{Quaternion, Vec3, Vec4};
use std::ops::Mul;

// --- Mat3 ---

/// A 3x3 column-major matrix.
///
/// Used for inertia tensors and the orientation part of oriented bounding
/// boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat3 {
    /// The three columns of the matrix.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// A matrix with every element set to zero.
    pub const ZERO: Self = Self {
        cols: [Vec3::ZERO, Vec3::ZERO, Vec3::ZERO],
    };

    /// Creates a matrix from three column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Creates a diagonal matrix from the specified diagonal elements.
    #[inline]
    pub const fn from_diagonal(d: Vec3) -> Self {
        Self {
            cols: [
                Vec3::new(d.x, 0.0, 0.0),
                Vec3::new(0.0, d.y, 0.0),
                Vec3::new(0.0, 0.0, d.z),
            ],
        }
    }

    /// Creates a rotation matrix from a unit quaternion.
    pub fn from_quaternion(q: Quaternion) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);

        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        Self {
            cols: [
                Vec3::new(1.0 - (yy + zz), xy + wz, xz - wy),
                Vec3::new(xy - wz, 1.0 - (xx + zz), yz + wx),
                Vec3::new(xz + wy, yz - wx, 1.0 - (xx + yy)),
            ],
        }
    }

    /// Returns the transpose of the matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self {
            cols: [
                Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
                Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
                Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
            ],
        }
    }

    /// Returns the first basis vector (local right) of the matrix.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.cols[0]
    }

    /// Returns the second basis vector (local up) of the matrix.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.cols[1]
    }

    /// Returns the third basis vector (local forward) of the matrix.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.cols[2]
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    /// Transforms a vector by the matrix.
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Mat3;
    #[inline]
    fn mul(self, rhs: Mat3) -> Mat3 {
        Mat3 {
            cols: [self * rhs.cols[0], self * rhs.cols[1], self * rhs.cols[2]],
        }
    }
}

impl Mul<f32> for Mat3 {
    type Output = Mat3;
    #[inline]
    fn mul(self, rhs: f32) -> Mat3 {
        Mat3 {
            cols: [self.cols[0] * rhs, self.cols[1] * rhs, self.cols[2] * rhs],
        }
    }
}

impl Default for Mat3 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// --- Mat4 ---

/// A 4x4 column-major matrix for affine transformations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(t: Vec3) -> Self {
        let mut result = Self::IDENTITY;
        result.cols[3] = Vec4::from_vec3(t, 1.0);
        result
    }

    /// Creates a non-uniform scale matrix.
    #[inline]
    pub fn from_scale(s: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(s.x, 0.0, 0.0, 0.0),
                Vec4::new(0.0, s.y, 0.0, 0.0),
                Vec4::new(0.0, 0.0, s.z, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a rotation matrix around the Y-axis.
    pub fn from_rotation_y(angle_radians: f32) -> Self {
        let (s, c) = angle_radians.sin_cos();
        Self {
            cols: [
                Vec4::new(c, 0.0, -s, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(s, 0.0, c, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a world transform from a translation, rotation, and scale.
    pub fn from_trs(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        let r = Mat3::from_quaternion(rotation);
        Self {
            cols: [
                Vec4::from_vec3(r.cols[0] * scale.x, 0.0),
                Vec4::from_vec3(r.cols[1] * scale.y, 0.0),
                Vec4::from_vec3(r.cols[2] * scale.z, 0.0),
                Vec4::from_vec3(translation, 1.0),
            ],
        }
    }

    /// Returns the translation part of the matrix.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Returns the upper-left 3x3 block of the matrix.
    ///
    /// For a rigid transform this is the rotation; any scale folds in.
    #[inline]
    pub fn rotation_part(&self) -> Mat3 {
        Mat3::from_cols(
            self.cols[0].truncate(),
            self.cols[1].truncate(),
            self.cols[2].truncate(),
        )
    }

    /// Transforms a point, applying rotation, scale, and translation.
    #[inline]
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + (self.cols[1] * v.y + (self.cols[2] * v.z + self.cols[3] * v.w))
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Mat4;
    #[inline]
    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4 {
            cols: [
                self * rhs.cols[0],
                self * rhs.cols[1],
                self * rhs.cols[2],
                self * rhs.cols[3],
            ],
        }
    }
}

impl Default for Mat4 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_2};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_mat3_mul_vec3() {
        // The z column must contribute additively; a well-known regression
        // in hand-rolled 3x3 multiplies.
        let m = Mat3::from_cols(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        );
        assert_eq!(m * Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m * Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn test_mat3_from_quaternion() {
        let q = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        let m = Mat3::from_quaternion(q);

        // Rotating +X by 90 degrees around Y yields -Z.
        assert!(vec3_approx_eq(m * Vec3::X, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_mat3_transpose() {
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let t = m.transpose();
        assert_eq!(t.cols[0], Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_mat4_trs_composition() {
        let m = Mat4::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::IDENTITY,
            Vec3::splat(2.0),
        );
        assert!(vec3_approx_eq(
            m.transform_point3(Vec3::ONE),
            Vec3::new(3.0, 4.0, 5.0)
        ));
        assert_eq!(m.translation(), Vec3::new(1.0, 2.0, 3.0));
    }
}
