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

//! # Contact Solver
//!
//! Consumes the contact stream and the motion snapshot, computes per
//! contact a normal impulse (Newton's impact law, Baumgarte-stabilized)
//! and a Coulomb friction impulse, eight contacts per iteration, and
//! scatters the results back into the motion system.
//!
//! A single Gauss-Seidel pass runs per sub-step: all contacts are solved
//! against the same velocity snapshot, then every impulse is applied.
//! Contacts are visited in emission order, so identical inputs produce
//! identical results.

use std::collections::BTreeMap;

use crate::contact::ContactStream;
use crate::material::MaterialProperties;
use crate::motion::MotionSystem;
use crate::world::HandleLut;
use talos_core::math::{Mat3, Vec3};
use talos_core::physics::{PhysicsHandle, PhysicsKind};
use talos_core::simd::{cross3, dot3, f32x8, mat3_mul_vec3, normalize3, safe_div, LANE_WIDTH};

/// Per-body data the solver keeps between sub-steps, keyed by public
/// handle.
#[derive(Debug, Clone, Copy)]
struct BodyInfo {
    inv_mass: f32,
    inv_inertia: Mat3,
    restitution: f32,
    friction: f32,
}

/// One side of the staging buffers: the scalar columns of eight contacts'
/// worth of body state.
#[derive(Debug, Default)]
struct Staging {
    restitution: Vec<[f32; 8]>,
    friction: Vec<[f32; 8]>,
    inv_mass: Vec<[f32; 8]>,
    px: Vec<[f32; 8]>,
    py: Vec<[f32; 8]>,
    pz: Vec<[f32; 8]>,
    vx: Vec<[f32; 8]>,
    vy: Vec<[f32; 8]>,
    vz: Vec<[f32; 8]>,
    wx: Vec<[f32; 8]>,
    wy: Vec<[f32; 8]>,
    wz: Vec<[f32; 8]>,
    inertia: Vec<[[f32; 8]; 9]>,
}

impl Staging {
    fn resize(&mut self, blocks: usize) {
        self.restitution.clear();
        self.restitution.resize(blocks, [0.0; 8]);
        self.friction.clear();
        self.friction.resize(blocks, [0.0; 8]);
        self.inv_mass.clear();
        self.inv_mass.resize(blocks, [0.0; 8]);
        for column in [
            &mut self.px, &mut self.py, &mut self.pz, &mut self.vx, &mut self.vy, &mut self.vz,
            &mut self.wx, &mut self.wy, &mut self.wz,
        ] {
            column.clear();
            column.resize(blocks, [0.0; 8]);
        }
        self.inertia.clear();
        self.inertia.resize(blocks, [[0.0; 8]; 9]);
    }

    fn write(&mut self, i: usize, info: &BodyInfo, position: Vec3, velocity: Vec3, angular: Vec3) {
        let (j, k) = (i / LANE_WIDTH, i % LANE_WIDTH);
        self.restitution[j][k] = info.restitution;
        self.friction[j][k] = info.friction;
        self.inv_mass[j][k] = info.inv_mass;
        self.px[j][k] = position.x;
        self.py[j][k] = position.y;
        self.pz[j][k] = position.z;
        self.vx[j][k] = velocity.x;
        self.vy[j][k] = velocity.y;
        self.vz[j][k] = velocity.z;
        self.wx[j][k] = angular.x;
        self.wy[j][k] = angular.y;
        self.wz[j][k] = angular.z;
        for row in 0..3 {
            for col in 0..3 {
                self.inertia[j][row * 3 + col][k] = info.inv_inertia.cols[col][row];
            }
        }
    }

    #[inline]
    fn inertia_block(&self, j: usize) -> [f32x8; 9] {
        let m = &self.inertia[j];
        [
            f32x8::from(m[0]),
            f32x8::from(m[1]),
            f32x8::from(m[2]),
            f32x8::from(m[3]),
            f32x8::from(m[4]),
            f32x8::from(m[5]),
            f32x8::from(m[6]),
            f32x8::from(m[7]),
            f32x8::from(m[8]),
        ]
    }
}

/// Solves the contact stream and feeds impulses back into motion.
#[derive(Debug, Default)]
pub struct ContactSolver {
    bodies: BTreeMap<PhysicsHandle, BodyInfo>,

    first: Staging,
    second: Staging,
    // Accumulated impulses: `2 * block` entries; the second body's blocks
    // come first, the first body's blocks are offset by the block count.
    jx: Vec<f32x8>,
    jy: Vec<f32x8>,
    jz: Vec<f32x8>,
    jp: Vec<f32x8>,
    jyaw: Vec<f32x8>,
    jr: Vec<f32x8>,
}

impl ContactSolver {
    /// Creates an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a body's solver-side parameters.
    pub fn add_body(
        &mut self,
        handle: PhysicsHandle,
        inv_inertia: Mat3,
        inv_mass: f32,
        material: &MaterialProperties,
    ) {
        self.bodies.insert(
            handle,
            BodyInfo {
                inv_mass,
                inv_inertia,
                restitution: material.restitution,
                friction: material.kinetic_friction,
            },
        );
    }

    /// Forgets a body's solver-side parameters.
    pub fn remove_body(&mut self, handle: PhysicsHandle) {
        self.bodies.remove(&handle);
    }

    /// Solves every contact in the stream and applies the accumulated
    /// impulses to the motion system.
    ///
    /// `beta` is the Baumgarte factor and `slop` the penetration depth
    /// tolerated before positional stabilization adds any bias.
    pub fn solve(
        &mut self,
        stream: &ContactStream,
        motion: &mut MotionSystem,
        lut: &HandleLut,
        dt: f32,
        beta: f32,
        slop: f32,
    ) {
        let count = stream.len();
        if count == 0 {
            return;
        }

        self.fill_buffers(stream, motion, lut);
        self.vector_solve(stream, dt, beta, slop);
        self.apply_impulses(stream, motion, lut);
    }

    /// Gathers both bodies of every contact into the SIMD staging buffers.
    fn fill_buffers(&mut self, stream: &ContactStream, motion: &MotionSystem, lut: &HandleLut) {
        let count = stream.len();
        let blocks = count.div_ceil(LANE_WIDTH);
        self.first.resize(blocks);
        self.second.resize(blocks);

        for i in 0..count {
            let hfirst = stream.first[i];
            let hsecond = stream.second[i];

            let info2 = self.bodies[&hsecond];
            let idx2 = lut.internal_index(hsecond) as usize;
            self.second.write(
                i,
                &info2,
                motion.get_position(lut.internal_of(hsecond)),
                motion.get_velocity(idx2),
                motion.get_angular_velocity(idx2),
            );

            let info1 = self.bodies[&hfirst];
            if hfirst.kind() == PhysicsKind::Static {
                // A static body contributes nothing: zero inverse mass and
                // tensor, zero velocity, and its "position" is pinned to
                // the contact point so the lever arm r1 vanishes.
                let static_info = BodyInfo {
                    inv_mass: 0.0,
                    inv_inertia: Mat3::ZERO,
                    ..info1
                };
                self.first
                    .write(i, &static_info, stream.point(i), Vec3::ZERO, Vec3::ZERO);
            } else {
                let idx1 = lut.internal_index(hfirst) as usize;
                self.first.write(
                    i,
                    &info1,
                    motion.get_position(lut.internal_of(hfirst)),
                    motion.get_velocity(idx1),
                    motion.get_angular_velocity(idx1),
                );
            }
        }
    }

    /// Solves eight contacts per iteration.
    ///
    /// The order matters: the friction impulse is clamped relative to the
    /// normal impulse, and the angular impulses reuse the lever-arm cross
    /// products of both.
    fn vector_solve(&mut self, stream: &ContactStream, dt: f32, beta: f32, slop: f32) {
        let count = stream.len();
        let blocks = count.div_ceil(LANE_WIDTH);

        let zero = f32x8::splat(0.0);
        let one = f32x8::splat(1.0);
        let beta8 = f32x8::splat(beta);
        let slop8 = f32x8::splat(slop);
        let inv_dt = f32x8::splat(1.0 / dt);

        for column in [
            &mut self.jx, &mut self.jy, &mut self.jz, &mut self.jp, &mut self.jyaw, &mut self.jr,
        ] {
            column.clear();
            column.resize(blocks * 2, zero);
        }

        // i addresses the second body's impulses, k the first body's.
        for (i, k) in (blocks..blocks * 2).enumerate() {
            let nx = stream.nx.blocks()[i];
            let ny = stream.ny.blocks()[i];
            let nz = stream.nz.blocks()[i];
            let cx = stream.px.blocks()[i];
            let cy = stream.py.blocks()[i];
            let cz = stream.pz.blocks()[i];
            let em = stream.effect.blocks()[i];

            let imass1 = f32x8::from(self.first.inv_mass[i]);
            let imass2 = f32x8::from(self.second.inv_mass[i]);
            let moi1 = self.first.inertia_block(i);
            let moi2 = self.second.inertia_block(i);

            // Lever arms from both centers of mass to the contact point.
            let rx1 = cx - f32x8::from(self.first.px[i]);
            let ry1 = cy - f32x8::from(self.first.py[i]);
            let rz1 = cz - f32x8::from(self.first.pz[i]);
            let rx2 = cx - f32x8::from(self.second.px[i]);
            let ry2 = cy - f32x8::from(self.second.py[i]);
            let rz2 = cz - f32x8::from(self.second.pz[i]);

            // Relative velocity at the contact point.
            let (t1x, t1y, t1z) = cross3(
                f32x8::from(self.first.wx[i]),
                f32x8::from(self.first.wy[i]),
                f32x8::from(self.first.wz[i]),
                rx1,
                ry1,
                rz1,
            );
            let (t2x, t2y, t2z) = cross3(
                f32x8::from(self.second.wx[i]),
                f32x8::from(self.second.wy[i]),
                f32x8::from(self.second.wz[i]),
                rx2,
                ry2,
                rz2,
            );
            let vx = (f32x8::from(self.second.vx[i]) + t2x) - (f32x8::from(self.first.vx[i]) + t1x);
            let vy = (f32x8::from(self.second.vy[i]) + t2y) - (f32x8::from(self.first.vy[i]) + t1y);
            let vz = (f32x8::from(self.second.vz[i]) + t2z) - (f32x8::from(self.first.vz[i]) + t1z);
            let vdn = dot3(vx, vy, vz, nx, ny, nz);

            // Normal impulse: j = -(1 + e) * vdn / (im1 + im2 + angular terms).
            let e = f32x8::from(self.first.restitution[i]).min(f32x8::from(self.second.restitution[i]));
            let num = -(one + e) * vdn;

            let (rn1x, rn1y, rn1z) = cross3(rx1, ry1, rz1, nx, ny, nz);
            let (in1x, in1y, in1z) = mat3_mul_vec3(&moi1, rn1x, rn1y, rn1z);
            let d1 = imass1 + dot3(rn1x, rn1y, rn1z, in1x, in1y, in1z);

            let (rn2x, rn2y, rn2z) = cross3(rx2, ry2, rz2, nx, ny, nz);
            let (in2x, in2y, in2z) = mat3_mul_vec3(&moi2, rn2x, rn2y, rn2z);
            let d2 = imass2 + dot3(rn2x, rn2y, rn2z, in2x, in2y, in2z);

            let j = safe_div(num, d1 + d2) * em;

            let jnx = j * nx;
            let jny = j * ny;
            let jnz = j * nz;

            // Normal impulse on the first body (opposed) and the second.
            self.jx[k] = -(jnx * imass1);
            self.jy[k] = -(jny * imass1);
            self.jz[k] = -(jnz * imass1);
            self.jp[k] = -(j * in1x);
            self.jyaw[k] = -(j * in1y);
            self.jr[k] = -(j * in1z);

            self.jx[i] = jnx * imass2;
            self.jy[i] = jny * imass2;
            self.jz[i] = jnz * imass2;
            self.jp[i] = j * in2x;
            self.jyaw[i] = j * in2y;
            self.jr[i] = j * in2z;

            // Baumgarte stabilization: a depth-proportional velocity bias,
            // gated by the penetration slop so impact tests stay elastic.
            let depth = (stream.depth.blocks()[i] - slop8).max(zero);
            let bias = (beta8 / em) * depth * inv_dt;
            self.jx[k] -= bias * nx;
            self.jy[k] -= bias * ny;
            self.jz[k] -= bias * nz;
            self.jx[i] += bias * nx;
            self.jy[i] += bias * ny;
            self.jz[i] += bias * nz;

            // Kinetic friction along the contact tangent.
            let (tx, ty, tz) = normalize3(vx - vdn * nx, vy - vdn * ny, vz - vdn * nz);

            let mu = (f32x8::from(self.first.friction[i]) * f32x8::from(self.second.friction[i])).sqrt();
            let num_t = -dot3(vx, vy, vz, tx, ty, tz);

            let (rt1x, rt1y, rt1z) = cross3(rx1, ry1, rz1, tx, ty, tz);
            let (it1x, it1y, it1z) = mat3_mul_vec3(&moi1, rt1x, rt1y, rt1z);
            let d1t = imass1 + dot3(rt1x, rt1y, rt1z, it1x, it1y, it1z);

            let (rt2x, rt2y, rt2z) = cross3(rx2, ry2, rz2, tx, ty, tz);
            let (it2x, it2y, it2z) = mat3_mul_vec3(&moi2, rt2x, rt2y, rt2z);
            let d2t = imass2 + dot3(rt2x, rt2y, rt2z, it2x, it2y, it2z);

            // Coulomb clamp: |jt| <= mu * j.
            let jt = safe_div(num_t, d1t + d2t).max(-(mu * j)).min(mu * j);

            let jtx = jt * tx;
            let jty = jt * ty;
            let jtz = jt * tz;

            self.jx[k] -= jtx * imass1;
            self.jy[k] -= jty * imass1;
            self.jz[k] -= jtz * imass1;
            self.jp[k] -= jt * it1x;
            self.jyaw[k] -= jt * it1y;
            self.jr[k] -= jt * it1z;

            self.jx[i] += jtx * imass2;
            self.jy[i] += jty * imass2;
            self.jz[i] += jtz * imass2;
            self.jp[i] += jt * it2x;
            self.jyaw[i] += jt * it2y;
            self.jr[i] += jt * it2z;
        }
    }

    /// Scatters the accumulated impulses into the motion system's velocity
    /// arrays, waking every body that receives a non-zero impulse.
    fn apply_impulses(&self, stream: &ContactStream, motion: &mut MotionSystem, lut: &HandleLut) {
        let count = stream.len();
        let blocks = count.div_ceil(LANE_WIDTH);

        for i in 0..count {
            let (j, k) = (i / LANE_WIDTH, i % LANE_WIDTH);

            // The second body is always movable.
            let hsecond = stream.second[i];
            let linear = Vec3::new(
                self.jx[j].to_array()[k],
                self.jy[j].to_array()[k],
                self.jz[j].to_array()[k],
            );
            let angular = Vec3::new(
                self.jp[j].to_array()[k],
                self.jyaw[j].to_array()[k],
                self.jr[j].to_array()[k],
            );
            motion.apply_impulse(lut.internal_index(hsecond) as usize, linear, angular);

            // The first body only receives impulses when it can move.
            let hfirst = stream.first[i];
            if hfirst.kind() != PhysicsKind::Static {
                let linear = Vec3::new(
                    self.jx[j + blocks].to_array()[k],
                    self.jy[j + blocks].to_array()[k],
                    self.jz[j + blocks].to_array()[k],
                );
                let angular = Vec3::new(
                    self.jp[j + blocks].to_array()[k],
                    self.jyaw[j + blocks].to_array()[k],
                    self.jr[j + blocks].to_array()[k],
                );
                motion.apply_impulse(lut.internal_index(hfirst) as usize, linear, angular);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::Bvh;
    use crate::collider::Collider;
    use crate::contact::ContactSystem;
    use crate::motion::MotionDesc;
    use talos_core::math::{Mat4, Quaternion, Sphere};

    /// Builds two colliding unit spheres and returns everything the solver
    /// needs: a filled contact stream plus motion, lookup, and solver.
    struct Rig {
        motion: MotionSystem,
        lut: HandleLut,
        contacts: ContactSystem,
        solver: ContactSolver,
        bvh: Bvh,
        handles: Vec<PhysicsHandle>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                motion: MotionSystem::new(),
                lut: HandleLut::default(),
                contacts: ContactSystem::new(),
                solver: ContactSolver::new(),
                bvh: Bvh::new(),
                handles: Vec::new(),
            }
        }

        fn add_sphere(&mut self, position: Vec3, velocity: Vec3, material: &MaterialProperties) {
            let idx = self.motion.add_body(&MotionDesc {
                position,
                orientation: Quaternion::IDENTITY,
                linear_velocity: velocity,
                angular_velocity: Vec3::ZERO,
                scale: Vec3::ONE,
                drag_coefficient: 0.0,
                inverse_mass: 1.0,
                inverse_inertia: Mat3::ZERO,
            });
            let handle = self.lut.alloc(PhysicsKind::Kinematic, idx as u16);
            self.solver.add_body(handle, Mat3::ZERO, 1.0, material);
            self.contacts
                .add_body(
                    handle,
                    &Collider::sphere(Sphere::new(Vec3::ZERO, 0.5)),
                    &Mat4::from_translation(position),
                    &mut self.bvh,
                    1.0,
                )
                .unwrap();
            self.handles.push(handle);
        }

        fn detect_and_solve(&mut self, dt: f32) {
            self.contacts
                .check(&mut self.bvh, &mut self.motion, &self.lut, 1.0);
            self.solver.solve(
                self.contacts.stream(),
                &mut self.motion,
                &self.lut,
                dt,
                0.15,
                0.01,
            );
        }

        fn velocity(&self, i: usize) -> Vec3 {
            self.motion
                .get_velocity(self.lut.internal_index(self.handles[i]) as usize)
        }
    }

    #[test]
    fn test_elastic_impact_conserves_energy() {
        let rubber = MaterialProperties {
            density: 1000.0,
            restitution: 1.0,
            kinetic_friction: 0.0,
        };

        let mut rig = Rig::new();
        rig.add_sphere(Vec3::new(-0.495, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), &rubber);
        rig.add_sphere(Vec3::new(0.495, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), &rubber);

        rig.detect_and_solve(1.0 / 240.0);

        let va = rig.velocity(0);
        let vb = rig.velocity(1);

        // Equal masses and e = 1: the velocities swap.
        assert!((va.x + 1.0).abs() < 1e-3, "va.x = {}", va.x);
        assert!((vb.x - 1.0).abs() < 1e-3, "vb.x = {}", vb.x);

        let energy = 0.5 * (va.length_squared() + vb.length_squared());
        assert!((energy - 1.0).abs() < 1e-4, "kinetic energy {energy}");
    }

    #[test]
    fn test_inelastic_impact_kills_approach() {
        let clay = MaterialProperties {
            density: 1000.0,
            restitution: 0.0,
            kinetic_friction: 0.0,
        };

        let mut rig = Rig::new();
        rig.add_sphere(Vec3::new(-0.495, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), &clay);
        rig.add_sphere(Vec3::new(0.495, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), &clay);

        rig.detect_and_solve(1.0 / 240.0);

        // e = 0 leaves both bodies moving together.
        assert!(rig.velocity(0).x.abs() < 1e-3);
        assert!(rig.velocity(1).x.abs() < 1e-3);
    }

    #[test]
    fn test_friction_is_coulomb_bounded() {
        let rough = MaterialProperties {
            density: 1000.0,
            restitution: 0.0,
            kinetic_friction: 0.5,
        };

        let mut rig = Rig::new();
        // A grazing impact: mostly tangential motion, slight approach.
        rig.add_sphere(Vec3::new(-0.495, 0.0, 0.0), Vec3::new(0.2, 0.0, 0.0), &rough);
        rig.add_sphere(Vec3::new(0.495, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0), &rough);

        let before_b = rig.velocity(1);
        rig.detect_and_solve(1.0 / 240.0);

        // The normal impulse kills the 0.2 m/s approach split over both
        // bodies; the tangential change may not exceed mu times it.
        let normal_change = (rig.velocity(1).x - before_b.x).abs();
        let tangential_change = (rig.velocity(1).y - before_b.y).abs();
        assert!(normal_change > 0.0);
        assert!(
            tangential_change <= 0.5 * normal_change + 1e-5,
            "friction {tangential_change} exceeds mu * normal {normal_change}"
        );
    }

    #[test]
    fn test_impulse_wakes_sleeping_target() {
        let clay = MaterialProperties {
            density: 1000.0,
            restitution: 0.0,
            kinetic_friction: 0.0,
        };

        let mut rig = Rig::new();
        rig.add_sphere(Vec3::new(-0.495, 0.0, 0.0), Vec3::ZERO, &clay);
        rig.add_sphere(Vec3::new(0.495, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), &clay);

        // Put the resting sphere to sleep; the mover stays awake.
        rig.motion.try_sleep(0.05);
        assert!(rig.motion.is_sleeping(0));

        rig.detect_and_solve(1.0 / 240.0);

        // The collision impulse wakes the sleeper.
        assert!(!rig.motion.is_sleeping(0));
        assert!(rig.velocity(0).x < -0.1);
    }
}
