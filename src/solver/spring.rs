//! Damped-spring pendulum step for a single chain
//!
//! Each bone's head is rigidly attached to its parent; only the tail swings.
//! The tail is pulled toward where rigid attachment would put it, kept at
//! the bone's rest length, limited to the swing cone and optionally pushed
//! out of colliders. Bones are processed root to tip so every child sees
//! its parent's new orientation.

use glam::{Quat, Vec3};

use crate::chain::model::BoneChain;
use crate::collision::{push_out, WorldCollider};
use crate::core::config::SimulationConfig;
use crate::core::error::SimulationWarning;
use crate::core::transform::Transform;
use crate::solver::limits::constrain_direction;

/// Inputs shared by every bone of one step
#[derive(Debug, Clone, Copy)]
pub struct StepParams<'a> {
    /// Step duration in seconds
    pub dt: f32,
    /// Bones past this count hold their idle rotation
    pub active_bones: usize,
    /// Empty when collision is disabled for the tier
    pub colliders: &'a [WorldCollider],
    pub hit_radius: f32,
    pub collision_passes: usize,
    pub epsilon: f32,
}

impl<'a> StepParams<'a> {
    pub fn new(config: &SimulationConfig, dt: f32, active_bones: usize) -> Self {
        Self {
            dt,
            active_bones,
            colliders: &[],
            hit_radius: config.bone_hit_radius,
            collision_passes: config.collision_passes,
            epsilon: config.numeric_epsilon,
        }
    }

    pub fn with_colliders(mut self, colliders: &'a [WorldCollider]) -> Self {
        self.colliders = colliders;
        self
    }
}

/// Advance `chain` by one step under `anchor`
///
/// Writes the new local rotations into the chain's target buffer. Bones
/// whose update is not finite, or whose tail cannot be cleared of the
/// colliders, keep their previous rotation; each one is reported through
/// `warn`. Returns the number of rejected bones.
pub fn step_chain(
    chain: &mut BoneChain,
    anchor: &Transform,
    params: &StepParams,
    mut warn: impl FnMut(SimulationWarning),
) -> usize {
    let chain_id = chain.id;

    if !anchor.is_valid() || !(params.dt > 0.0 && params.dt.is_finite()) {
        warn(SimulationWarning::NumericInstability {
            chain: chain_id,
            bone: 0,
        });
        return 1;
    }

    let (bones, target, idle) = chain.solver_parts();
    let dt = params.dt;
    let mut rejected = 0;
    let mut parent_world = *anchor;

    for (i, bone) in bones.iter_mut().enumerate() {
        let rigid = parent_world.mul_transform(&bone.rest_local);
        let head = rigid.translation;
        let forward = rigid.rotation * bone.tail_axis;

        if i >= params.active_bones {
            // Over the tier's bone budget: ride along rigidly
            let rotation = idle.rotations()[i];
            bone.head = head;
            bone.tail = head + forward * bone.length;
            bone.velocity = Vec3::ZERO;
            bone.rotation = rotation;
            target[i] = rotation;
            parent_world = rigid;
            continue;
        }

        let spring_target = head + forward * bone.length;
        let carried = bone.tail + (head - bone.head) * bone.inertia;

        let mut velocity = bone.velocity;
        velocity += (bone.stiffness * (spring_target - carried) - bone.damping * velocity) * dt;
        let free_tail = carried + velocity * dt;

        let mut direction = constrain_direction(head, free_tail, forward, bone.angle_limit, params.epsilon);
        let mut trapped = false;

        if let Some(dir) = direction {
            if !params.colliders.is_empty() {
                let tail = head + dir * bone.length;
                match push_out(tail, params.hit_radius, params.colliders, params.collision_passes) {
                    Some(pushed) if pushed != tail => {
                        direction = constrain_direction(head, pushed, forward, bone.angle_limit, params.epsilon);
                    }
                    Some(_) => {}
                    None => {
                        trapped = true;
                        direction = None;
                    }
                }
            }
        }

        let solved = direction.and_then(|dir| {
            let world_rotation = (Quat::from_rotation_arc(forward, dir) * rigid.rotation).normalize();
            let local = (parent_world.rotation.inverse() * world_rotation).normalize();
            let tail = head + dir * bone.length;
            let velocity = (tail - carried) / dt;
            let finite = local.is_finite() && tail.is_finite() && velocity.is_finite();
            finite.then_some((world_rotation, local, tail, velocity))
        });

        match solved {
            Some((world_rotation, local, tail, velocity)) => {
                bone.head = head;
                bone.tail = tail;
                bone.velocity = velocity;
                bone.rotation = local;
                target[i] = local;
                parent_world = Transform::new(head, world_rotation);
            }
            None => {
                // Hold the previous local rotation and drop the motion
                rejected += 1;
                warn(if trapped {
                    SimulationWarning::UnresolvedCollision {
                        chain: chain_id,
                        bone: i,
                    }
                } else {
                    SimulationWarning::NumericInstability {
                        chain: chain_id,
                        bone: i,
                    }
                });
                let held = parent_world.mul_transform(&Transform::new(bone.rest_local.translation, bone.rotation));
                bone.head = held.translation;
                bone.tail = held.translation + held.rotation * bone.tail_axis * bone.length;
                bone.velocity = Vec3::ZERO;
                target[i] = bone.rotation;
                parent_world = held;
            }
        }
    }

    rejected
}
