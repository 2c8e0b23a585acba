//! Runtime representation of a chain
//!
//! Bones live in a flat array ordered root to tip. Each node's parent is the
//! previous entry (the root's parent is the anchor), so traversal is a
//! forward walk and the chain owns every node outright.

use glam::{Quat, Vec3};

use crate::chain::pose::{BonePose, IdlePose};
use crate::core::transform::Transform;
use crate::core::types::{ChainId, Frame};
use crate::culling::ChainState;

/// One simulated bone
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    /// Index of this bone in the character skeleton
    pub skeleton_index: usize,
    /// Chain-local parent index; `None` for the root, which hangs off the anchor
    pub parent: Option<usize>,
    /// Authored transform relative to the parent
    pub rest_local: Transform,
    /// Unit direction from head to tail in bone space
    pub tail_axis: Vec3,
    /// Rigid head-to-tail length
    pub length: f32,

    pub stiffness: f32,
    pub damping: f32,
    /// Half-angle of the swing cone around the rigidly attached direction
    pub angle_limit: f32,
    pub inertia: f32,

    // Simulation state (world space)
    pub head: Vec3,
    pub tail: Vec3,
    pub velocity: Vec3,
    /// Local rotation produced by the last step
    pub rotation: Quat,
}

impl BoneNode {
    /// Angle between the simulated and the rest tail direction, in parent space
    pub fn swing_angle(&self) -> f32 {
        let rest_dir = self.rest_local.rotation * self.tail_axis;
        let current_dir = self.rotation * self.tail_axis;
        rest_dir.cross(current_dir).length().atan2(rest_dir.dot(current_dir))
    }
}

/// An ordered chain of bones simulated together
#[derive(Debug, Clone)]
pub struct BoneChain {
    pub id: ChainId,
    pub name: String,
    /// Skeleton index of the static bone the root is attached to
    pub anchor: usize,
    /// Visual importance used to rank chains against the tier budget
    pub priority: f32,
    pub state: ChainState,
    /// Host toggle; a disabled chain is never admitted to `Simulated`
    pub enabled: bool,
    pub last_simulated_frame: Option<Frame>,
    /// Hash of the chain name, stable across runs
    pub phase_seed: u64,
    bones: Vec<BoneNode>,
    idle: IdlePose,
    /// Local rotations from the last integration
    target: Vec<Quat>,
    /// Local rotations handed to skinning
    displayed: Vec<Quat>,
}

impl BoneChain {
    pub fn new(
        id: ChainId,
        name: String,
        anchor: usize,
        priority: f32,
        phase_seed: u64,
        bones: Vec<BoneNode>,
    ) -> Self {
        let idle = IdlePose::capture(bones.iter().map(|b| &b.rest_local));
        let target = idle.rotations().to_vec();
        let displayed = idle.rotations().to_vec();

        Self {
            id,
            name,
            anchor,
            priority,
            state: ChainState::Static,
            enabled: true,
            last_simulated_frame: None,
            phase_seed,
            bones,
            idle,
            target,
            displayed,
        }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[BoneNode] {
        &self.bones
    }

    pub fn idle_pose(&self) -> &IdlePose {
        &self.idle
    }

    pub fn target_rotations(&self) -> &[Quat] {
        &self.target
    }

    pub fn displayed_rotations(&self) -> &[Quat] {
        &self.displayed
    }

    /// Bones and target buffer together, for the solver
    pub(crate) fn solver_parts(&mut self) -> (&mut [BoneNode], &mut [Quat], &IdlePose) {
        (&mut self.bones, &mut self.target, &self.idle)
    }

    /// Snap to the authored idle pose and drop all motion
    pub fn reset_to_idle(&mut self) {
        self.displayed.copy_from_slice(self.idle.rotations());
        self.target.copy_from_slice(self.idle.rotations());
        for (bone, &rotation) in self.bones.iter_mut().zip(self.idle.rotations()) {
            bone.rotation = rotation;
            bone.velocity = Vec3::ZERO;
        }
        self.last_simulated_frame = None;
    }

    /// Restart simulation from the rotations currently displayed
    ///
    /// Heads and tails are rebuilt by forward kinematics under the current
    /// anchor, so a chain resumed after the character moved picks up from
    /// the pose on screen instead of stale world positions.
    pub fn reseed_from_displayed(&mut self, anchor: &Transform) {
        self.target.copy_from_slice(&self.displayed);

        let mut parent_world = *anchor;
        for (bone, &rotation) in self.bones.iter_mut().zip(self.displayed.iter()) {
            let world = parent_world.mul_transform(&Transform::new(bone.rest_local.translation, rotation));
            bone.head = world.translation;
            bone.tail = world.translation + world.rotation * bone.tail_axis * bone.length;
            bone.velocity = Vec3::ZERO;
            bone.rotation = rotation;
            parent_world = world;
        }
    }

    /// Move displayed rotations toward the last target by `blend` (1.0 = snap)
    pub fn blend_displayed(&mut self, blend: f32) {
        crate::scheduler::interpolation::blend_towards(&mut self.displayed, &self.target, blend);
    }

    /// Write one `BonePose` per bone into `out`, at the slots given by `slots`
    pub fn write_pose(&self, slots: &[usize], out: &mut [BonePose]) {
        for ((bone, &rotation), &slot) in self.bones.iter().zip(&self.displayed).zip(slots) {
            out[slot] = BonePose {
                bone: bone.skeleton_index,
                local: Transform::new(bone.rest_local.translation, rotation),
            };
        }
    }
}
