//! Built-in outfit rig: hair strands, skirt panels and a cape
//!
//! Used by the CLI driver, the benchmark and integration tests in place of
//! an exported asset.

use glam::{Quat, Vec3};

use crate::collision::ColliderShape;
use crate::core::transform::Transform;
use crate::skeleton::{CharacterRig, ColliderDesc, DynamicTag, SkeletonDesc};

fn strand(
    skeleton: &mut SkeletonDesc,
    name: &str,
    parent: usize,
    offset: Vec3,
    segments: usize,
    segment: f32,
    tag: DynamicTag,
) {
    let mut parent = parent;
    for i in 0..segments {
        let translation = if i == 0 { offset } else { Vec3::new(0.0, -segment, 0.0) };
        parent = skeleton.push(
            format!("{name}_{i}"),
            Some(parent),
            Transform::from_translation(translation),
            Some(tag),
        );
    }
}

/// Eight chains: cape (5 bones), three hair strands (4), four skirt panels (3)
pub fn sample_outfit_rig() -> CharacterRig {
    let mut skeleton = SkeletonDesc::new();
    let at = |x: f32, y: f32, z: f32| Transform::from_translation(Vec3::new(x, y, z));

    let hips = skeleton.push("hips", None, at(0.0, 1.0, 0.0), None);
    let spine = skeleton.push("spine", Some(hips), at(0.0, 0.25, 0.0), None);
    let chest = skeleton.push("chest", Some(spine), at(0.0, 0.25, 0.0), None);
    let head = skeleton.push("head", Some(chest), at(0.0, 0.3, 0.0), None);
    let thigh_l = skeleton.push("thigh_l", Some(hips), at(0.1, -0.05, 0.0), None);
    let thigh_r = skeleton.push("thigh_r", Some(hips), at(-0.1, -0.05, 0.0), None);

    let cape = DynamicTag {
        stiffness: 6.0,
        damping: 1.5,
        angle_limit: 0.9,
        inertia: 0.2,
        priority: 5.0,
    };
    strand(&mut skeleton, "cape", chest, Vec3::new(0.0, 0.0, -0.12), 5, 0.15, cape);

    let hair = DynamicTag {
        stiffness: 12.0,
        damping: 2.5,
        angle_limit: 0.7,
        inertia: 0.4,
        priority: 4.0,
    };
    for (name, x) in [("hair_l", -0.06), ("hair_c", 0.0), ("hair_r", 0.06)] {
        strand(&mut skeleton, name, head, Vec3::new(x, 0.0, -0.09), 4, 0.08, hair);
    }

    let skirt = DynamicTag {
        stiffness: 18.0,
        damping: 3.0,
        angle_limit: 0.6,
        inertia: 0.5,
        priority: 3.0,
    };
    for (name, x, z) in [
        ("skirt_front", 0.0, 0.12),
        ("skirt_back", 0.0, -0.12),
        ("skirt_l", 0.12, 0.0),
        ("skirt_r", -0.12, 0.0),
    ] {
        strand(&mut skeleton, name, hips, Vec3::new(x, -0.05, z), 3, 0.12, skirt);
    }

    let colliders = vec![
        ColliderDesc {
            bone: head,
            shape: ColliderShape::Sphere {
                offset: Vec3::new(0.0, 0.08, 0.0),
                radius: 0.1,
            },
        },
        ColliderDesc {
            bone: spine,
            shape: ColliderShape::Capsule {
                offset: Vec3::ZERO,
                tail: Vec3::new(0.0, 0.5, 0.0),
                radius: 0.12,
            },
        },
        ColliderDesc {
            bone: thigh_l,
            shape: ColliderShape::Capsule {
                offset: Vec3::ZERO,
                tail: Vec3::new(0.0, -0.4, 0.0),
                radius: 0.07,
            },
        },
        ColliderDesc {
            bone: thigh_r,
            shape: ColliderShape::Capsule {
                offset: Vec3::ZERO,
                tail: Vec3::new(0.0, -0.4, 0.0),
                radius: 0.07,
            },
        },
    ];

    CharacterRig {
        skeleton,
        chains: Vec::new(),
        colliders,
    }
}

/// Character root for a sway-and-turn loop at `time` seconds
///
/// Drives the demo and benchmarks with enough motion to swing every chain.
pub fn sway_root(time: f32) -> Transform {
    Transform::new(
        Vec3::new(0.3 * (time * 2.1).sin(), 0.05 * (time * 4.2).sin().abs(), 0.0),
        Quat::from_rotation_y(0.6 * (time * 1.3).sin()),
    )
}
