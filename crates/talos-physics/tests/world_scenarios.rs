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

//! End-to-end simulation scenarios: whole-world behavior over many ticks,
//! with literal masses in kilograms, lengths in meters, and gravity at
//! `(0, -9.81, 0)`.

use approx::assert_relative_eq;
use talos_core::math::{Aabb, Mat3, Obb, Sphere, Vec3};
use talos_physics::{
    BodyDesc, Collider, MaterialProperties, PhysicalWorld, PhysicsConfig, PhysicsHandle,
};

const FRAME: f32 = 1.0 / 60.0;

fn world_with_substeps(substeps: u32) -> PhysicalWorld {
    let _ = env_logger::builder().is_test(true).try_init();
    PhysicalWorld::new(PhysicsConfig {
        substeps,
        ..PhysicsConfig::default()
    })
}

fn material(world: &PhysicalWorld, restitution: f32, friction: f32) -> PhysicsHandle {
    world.add_material(MaterialProperties {
        density: 1000.0,
        restitution,
        kinetic_friction: friction,
    })
}

/// A unit-mass sphere of radius 0.5 that cannot rotate.
fn sphere_desc(position: Vec3, mat: PhysicsHandle) -> BodyDesc {
    BodyDesc::new(position, mat, Collider::sphere(Sphere::new(Vec3::ZERO, 0.5)))
        .with_inertia_tensor(Mat3::ZERO)
}

/// A large thin static box whose top face sits at `y = 0`.
fn floor_desc(mat: PhysicsHandle) -> BodyDesc {
    BodyDesc::new(
        Vec3::ZERO,
        mat,
        Collider::aabb(Aabb::from_min_max(
            Vec3::new(-50.0, -0.5, -50.0),
            Vec3::new(50.0, 0.0, 50.0),
        )),
    )
}

fn run(world: &PhysicalWorld, seconds: f32) {
    let frames = (seconds / FRAME).round() as usize;
    for _ in 0..frames {
        world.update(FRAME);
    }
}

#[test]
fn free_fall_matches_closed_form() {
    let world = world_with_substeps(4);
    let mat = material(&world, 0.0, 0.0);
    let sphere = world
        .add_kinematic(&sphere_desc(Vec3::new(0.0, 10.0, 0.0), mat))
        .unwrap();

    run(&world, 1.0);

    let position = world.get_transform(sphere).unwrap().translation();
    let velocity = world.get_velocity(sphere).unwrap();

    assert!(
        position.y >= 5.0 && position.y <= 5.2,
        "fell to y = {}",
        position.y
    );
    assert!(
        velocity.y >= -10.0 && velocity.y <= -9.6,
        "velocity.y = {}",
        velocity.y
    );
    // No lateral drift.
    assert_eq!(position.x, 0.0);
    assert_eq!(position.z, 0.0);
}

#[test]
fn sphere_comes_to_rest_on_plane() {
    let world = world_with_substeps(4);
    let mat = material(&world, 0.0, 0.0);
    world.add_static(&floor_desc(mat)).unwrap();
    let sphere = world
        .add_kinematic(&sphere_desc(Vec3::new(0.0, 10.0, 0.0), mat))
        .unwrap();

    run(&world, 3.0);

    let position = world.get_transform(sphere).unwrap().translation();
    let velocity = world.get_velocity(sphere).unwrap();

    assert!(
        position.y >= 0.49 && position.y <= 0.51,
        "resting at y = {}",
        position.y
    );
    assert!(velocity.length() < 0.01, "still moving at {velocity:?}");
    assert_eq!(world.stats().sleeping, 1, "sphere should be asleep");

    // Asleep means parked: another second changes nothing.
    run(&world, 1.0);
    let settled = world.get_transform(sphere).unwrap().translation();
    assert_eq!(settled.y, position.y);
}

#[test]
fn head_on_elastic_collision_swaps_velocities() -> anyhow::Result<()> {
    let world = world_with_substeps(4);
    let mat = material(&world, 1.0, 0.0);

    let a = world.add_kinematic(
        &sphere_desc(Vec3::new(-2.0, 0.0, 0.0), mat).with_velocity(Vec3::new(1.0, 0.0, 0.0)),
    )?;
    let b = world.add_kinematic(
        &sphere_desc(Vec3::new(2.0, 0.0, 0.0), mat).with_velocity(Vec3::new(-1.0, 0.0, 0.0)),
    )?;

    let energy_before = {
        let va = world.get_velocity(a)?;
        let vb = world.get_velocity(b)?;
        0.5 * (va.length_squared() + vb.length_squared())
    };

    // Closing speed is 2 m/s over a 3 m gap; impact happens around 1.5 s.
    run(&world, 2.0);

    let va = world.get_velocity(a)?;
    let vb = world.get_velocity(b)?;

    assert!((va.x + 1.0).abs() < 1e-3, "first sphere vx = {}", va.x);
    assert!((vb.x - 1.0).abs() < 1e-3, "second sphere vx = {}", vb.x);

    // Elastic impact conserves kinetic energy. Both spheres fall in
    // lock-step, so comparing total energy minus the shared fall term
    // reduces to the x components.
    let horizontal_after = 0.5 * (va.x * va.x + vb.x * vb.x);
    assert_relative_eq!(horizontal_after, energy_before, epsilon = 1e-4);
    Ok(())
}

#[test]
fn sliding_sphere_halts_under_friction() {
    let world = world_with_substeps(4);
    let mat = material(&world, 0.0, 0.5);
    world.add_static(&floor_desc(mat)).unwrap();
    let sphere = world
        .add_kinematic(
            &sphere_desc(Vec3::new(0.0, 0.5, 0.0), mat).with_velocity(Vec3::new(5.0, 0.0, 0.0)),
        )
        .unwrap();

    run(&world, 3.0);

    let position = world.get_transform(sphere).unwrap().translation();
    let velocity = world.get_velocity(sphere).unwrap();

    // Coulomb friction stops the slide near v^2 / (2 * mu * g) = 2.55 m;
    // the friction impulse can never exceed mu times the normal impulse,
    // so stopping much shorter would mean the bound was violated.
    assert!(velocity.length() < 0.05, "still sliding at {velocity:?}");
    assert!(
        position.x > 2.3 && position.x < 2.7,
        "slid {} m, expected about 2.55 m",
        position.x
    );
}

#[test]
fn stacked_boxes_settle_and_sleep() {
    let world = world_with_substeps(4);
    let mat = material(&world, 0.0, 0.4);

    // OBB floor so the box-box kernel handles every contact in the stack.
    world
        .add_static(&BodyDesc::new(
            Vec3::ZERO,
            mat,
            Collider::obb(Obb::new(
                Vec3::new(0.0, -0.5, 0.0),
                Vec3::new(20.0, 0.5, 20.0),
                Mat3::IDENTITY,
            )),
        ))
        .unwrap();

    let box_at = |y: f32| {
        BodyDesc::new(
            Vec3::new(0.0, y, 0.0),
            mat,
            Collider::obb(Obb::new(Vec3::ZERO, Vec3::splat(0.5), Mat3::IDENTITY)),
        )
        .with_inertia_tensor(Mat3::ZERO)
    };

    let bottom = world.add_kinematic(&box_at(0.5)).unwrap();
    let middle = world.add_kinematic(&box_at(1.5)).unwrap();
    let top = world.add_kinematic(&box_at(2.5)).unwrap();

    run(&world, 5.0);

    let y0 = world.get_transform(bottom).unwrap().translation().y;
    let y1 = world.get_transform(middle).unwrap().translation().y;
    let y2 = world.get_transform(top).unwrap().translation().y;

    assert!((y1 - y0 - 1.0).abs() < 0.01, "middle gap {}", y1 - y0);
    assert!((y2 - y1 - 1.0).abs() < 0.01, "top gap {}", y2 - y1);

    for handle in [bottom, middle, top] {
        let v = world.get_velocity(handle).unwrap();
        assert!(v.length() < 0.05, "box {handle:?} still moving at {v:?}");
    }
    assert_eq!(world.stats().sleeping, 3, "entire stack should sleep");
}

#[test]
fn sphere_rests_on_height_field_terrain() {
    use talos_core::math::HeightField;
    use talos_physics::ColliderShape;

    let world = world_with_substeps(4);
    let mat = material(&world, 0.0, 0.2);

    // A flat 20x20 m terrain anchored at the origin corner.
    let field = HeightField::new(21, 21, 20.0, true);
    world
        .add_static(&BodyDesc::new(
            Vec3::ZERO,
            mat,
            Collider::new(
                Aabb::from_min_max(Vec3::new(0.0, -1.0, 0.0), Vec3::new(20.0, 1.0, 20.0)),
                ColliderShape::HeightField(field),
            ),
        ))
        .unwrap();

    let sphere = world
        .add_kinematic(&sphere_desc(Vec3::new(10.0, 5.0, 10.0), mat))
        .unwrap();

    run(&world, 3.0);

    let position = world.get_transform(sphere).unwrap().translation();
    assert!(
        position.y >= 0.45 && position.y <= 0.55,
        "resting at y = {}",
        position.y
    );
    assert!(world.get_velocity(sphere).unwrap().length() < 0.01);
}
