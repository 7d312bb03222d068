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

//! Benchmarks for the BVH hot paths: incremental insertion and boxcast
//! queries over a populated tree.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use talos_core::math::{Aabb, Vec3};
use talos_core::physics::{PhysicsHandle, PhysicsKind};
use talos_physics::bvh::Bvh;

struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32) / (u32::MAX >> 1) as f32
    }

    fn next_vec3(&mut self, scale: f32) -> Vec3 {
        Vec3::new(
            self.next_f32() * scale,
            self.next_f32() * scale,
            self.next_f32() * scale,
        )
    }
}

fn random_boxes(count: u16, seed: u64) -> Vec<(PhysicsHandle, Aabb)> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|i| {
            (
                PhysicsHandle::new(PhysicsKind::Static, i),
                Aabb::from_center_half_extents(
                    rng.next_vec3(100.0),
                    rng.next_vec3(1.0) + Vec3::splat(0.05),
                ),
            )
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let boxes = random_boxes(4096, 1);

    c.bench_function("bvh_insert_4096", |b| {
        b.iter_batched(
            Bvh::new,
            |mut bvh| {
                for (handle, aabb) in &boxes {
                    bvh.insert(*handle, *aabb).unwrap();
                }
                bvh
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_boxcast(c: &mut Criterion) {
    let boxes = random_boxes(4096, 2);
    let mut bvh = Bvh::new();
    for (handle, aabb) in &boxes {
        bvh.insert(*handle, *aabb).unwrap();
    }

    let mut rng = Lcg(3);
    let queries: Vec<Aabb> = (0..256)
        .map(|_| Aabb::from_center_half_extents(rng.next_vec3(100.0), rng.next_vec3(4.0)))
        .collect();

    c.bench_function("bvh_boxcast_4096x256", |b| {
        let mut result = Vec::new();
        b.iter(|| {
            let mut hits = 0usize;
            for query in &queries {
                result.clear();
                bvh.boxcast(query, &mut result);
                hits += result.len();
            }
            hits
        });
    });
}

criterion_group!(benches, bench_insert, bench_boxcast);
criterion_main!(benches);
