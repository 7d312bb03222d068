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

//! Provides a height-field terrain sampler.
//!
//! A height field is a regular XZ grid of height samples with optional
//! per-vertex normals. The contact system consumes exactly two operations:
//! [`HeightField::try_sample`] and deep cloning.

use serde::{Deserialize, Serialize};

use super::{Vec2, Vec3};

/// A regular grid of terrain heights with optional per-vertex normals.
///
/// Cloning produces a deep copy of the sample data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightField {
    width: u32,
    depth: u32,
    patch_size: Vec2,
    inv_patch_size: Vec2,
    heights: Vec<f32>,
    normals: Option<Vec<Vec3>>,
}

impl HeightField {
    /// Creates a flat height field of `width * depth` samples covering
    /// `scale` world units on both horizontal axes.
    ///
    /// # Panics
    /// Panics when either dimension is smaller than 2.
    pub fn new(width: u32, depth: u32, scale: f32, with_normals: bool) -> Self {
        assert!(width >= 2 && depth >= 2, "height field needs at least 2x2 samples");

        let patch_size = Vec2::new(scale / (width - 1) as f32, scale / (depth - 1) as f32);
        let count = (width * depth) as usize;

        Self {
            width,
            depth,
            patch_size,
            inv_patch_size: Vec2::new(1.0 / patch_size.x, 1.0 / patch_size.y),
            heights: vec![0.0; count],
            normals: with_normals.then(|| vec![Vec3::Y; count]),
        }
    }

    /// Returns the number of samples along the X axis.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the number of samples along the Z axis.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sets the height of a single sample.
    ///
    /// # Panics
    /// Panics when the coordinate is out of range.
    pub fn set_height(&mut self, x: u32, z: u32, height: f32) {
        assert!(x < self.width && z < self.depth, "height sample out of range");
        self.heights[(z * self.width + x) as usize] = height;
    }

    /// Sets the height and the normal of a single sample.
    ///
    /// # Panics
    /// Panics when the coordinate is out of range or normals were not
    /// allocated.
    pub fn set_height_and_normal(&mut self, x: u32, z: u32, height: f32, normal: Vec3) {
        assert!(x < self.width && z < self.depth, "height sample out of range");
        let i = (z * self.width + x) as usize;
        self.heights[i] = height;
        self.normals
            .as_mut()
            .expect("height field allocated without normals")[i] = normal;
    }

    /// Returns the height of a single sample.
    #[inline]
    fn height_at(&self, x: u32, z: u32) -> f32 {
        self.heights[(z * self.width + x) as usize]
    }

    #[inline]
    fn normal_at(&self, x: u32, z: u32) -> Vec3 {
        match &self.normals {
            Some(normals) => normals[(z * self.width + x) as usize],
            None => Vec3::Y,
        }
    }

    /// Recomputes all vertex normals from the height samples with a Sobel
    /// filter.
    ///
    /// `displacement` scales the height differences before the filter runs.
    ///
    /// # Panics
    /// Panics when the field was created without normals.
    pub fn calculate_normals(&mut self, displacement: f32) {
        assert!(self.normals.is_some(), "height field allocated without normals");

        let (w, d) = (self.width as i32, self.depth as i32);
        for z in 0..d {
            for x in 0..w {
                let mut sobel = [[0.0f32; 3]; 3];
                for (sz, row) in sobel.iter_mut().enumerate() {
                    for (sx, cell) in row.iter_mut().enumerate() {
                        let sample_x = (x + sx as i32 - 1).clamp(0, w - 1) as u32;
                        let sample_z = (z + sz as i32 - 1).clamp(0, d - 1) as u32;
                        *cell = self.height_at(sample_x, sample_z) * displacement;
                    }
                }

                // The normal tilts away from rising ground on both axes.
                let nx = sobel[0][0] + 2.0 * sobel[1][0] + sobel[2][0]
                    - sobel[0][2]
                    - 2.0 * sobel[1][2]
                    - sobel[2][2];
                let nz = sobel[0][0] + 2.0 * sobel[0][1] + sobel[0][2]
                    - sobel[2][0]
                    - 2.0 * sobel[2][1]
                    - sobel[2][2];

                let normal = Vec3::new(nx, 1.0, nz).normalize();
                let i = (z as u32 * self.width + x as u32) as usize;
                self.normals.as_mut().unwrap()[i] = normal;
            }
        }
    }

    /// Checks whether a local XZ position falls inside the sampled area.
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x > 0.0
            && pos.y > 0.0
            && ((pos.x * self.inv_patch_size.x) as u32) < self.width - 1
            && ((pos.y * self.inv_patch_size.y) as u32) < self.depth - 1
    }

    /// Samples the interpolated height and normal under a local XZ position.
    ///
    /// Returns `None` when the position lies outside the field. The
    /// containing patch is split into two triangles along its diagonal and
    /// the result is the barycentric interpolation within the hit triangle.
    pub fn try_sample(&self, pos: Vec2) -> Option<(f32, Vec3)> {
        if !self.contains(pos) {
            return None;
        }

        // The patch that contains the position, and the fractional uv
        // within the patch.
        let px = (pos.x * self.inv_patch_size.x) as u32;
        let pz = (pos.y * self.inv_patch_size.y) as u32;
        let u = pos.x * self.inv_patch_size.x - px as f32;
        let v = pos.y * self.inv_patch_size.y - pz as f32;

        let (a, b, c, t, s) = if u <= 1.0 - v {
            // Bottom-left triangle.
            ((px, pz), (px + 1, pz), (px, pz + 1), 1.0 - u - v, u)
        } else {
            // Top-right triangle.
            ((px + 1, pz), (px + 1, pz + 1), (px, pz + 1), 1.0 - v, u + v - 1.0)
        };

        let w_b = s;
        let w_c = 1.0 - t - s;
        let w_a = t;

        let height = self.height_at(a.0, a.1) * w_a
            + self.height_at(b.0, b.1) * w_b
            + self.height_at(c.0, c.1) * w_c;
        let normal = (self.normal_at(a.0, a.1) * w_a
            + self.normal_at(b.0, b.1) * w_b
            + self.normal_at(c.0, c.1) * w_c)
            .normalize();

        Some((height, normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn test_sample_flat_field() {
        let field = HeightField::new(4, 4, 3.0, false);
        let (h, n) = field.try_sample(Vec2::new(1.5, 1.5)).unwrap();
        assert_eq!(h, 0.0);
        assert_eq!(n, Vec3::Y);
    }

    #[test]
    fn test_sample_outside_is_none() {
        let field = HeightField::new(4, 4, 3.0, false);
        assert!(field.try_sample(Vec2::new(-0.5, 1.0)).is_none());
        assert!(field.try_sample(Vec2::new(1.0, 5.0)).is_none());
    }

    #[test]
    fn test_sample_interpolates_heights() {
        let mut field = HeightField::new(2, 2, 1.0, false);
        field.set_height(0, 0, 0.0);
        field.set_height(1, 0, 1.0);
        field.set_height(0, 1, 0.0);
        field.set_height(1, 1, 1.0);

        // Halfway along x the ramp is at half height.
        let (h, _) = field.try_sample(Vec2::new(0.5, 0.25)).unwrap();
        assert!(approx_eq(h, 0.5));
    }

    #[test]
    fn test_calculate_normals_tilts_slope() {
        let mut field = HeightField::new(3, 3, 2.0, true);
        for z in 0..3 {
            for x in 0..3 {
                field.set_height(x, z, x as f32);
            }
        }
        field.calculate_normals(1.0);

        let (_, n) = field.try_sample(Vec2::new(1.0, 1.0)).unwrap();
        // Rising towards +x tilts the normal towards -x.
        assert!(n.x < 0.0);
        assert!(n.y > 0.0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = HeightField::new(2, 2, 1.0, false);
        let copy = original.clone();
        original.set_height(0, 0, 9.0);

        assert_eq!(copy.try_sample(Vec2::new(0.1, 0.1)).unwrap().0, 0.0);
    }
}
