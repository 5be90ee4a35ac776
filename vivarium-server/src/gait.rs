use glam::DVec3;

use vivarium_core::scenegraph::{Axis, Entity, SceneGraph};

/// Per-joint angular steps, in degrees per tick. A step component changes
/// sign whenever its joint runs into a limit on that axis, so limited joints
/// swing back and forth between their extents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gait {
    steps: Vec<DVec3>,
}

impl Gait {
    pub fn new(steps: Vec<DVec3>) -> Gait {
        Gait { steps }
    }

    pub fn uniform(joints: usize, step: DVec3) -> Gait {
        Gait {
            steps: vec![step; joints],
        }
    }

    pub fn steps(&self) -> &[DVec3] {
        &self.steps
    }

    pub fn extend(&mut self, other: Gait) {
        self.steps.extend(other.steps);
    }

    /// Advance `joints[i]` by step `i`. Joints without a step stay put.
    pub fn cycle(&mut self, scene: &mut SceneGraph, joints: &[Entity]) {
        for (&joint, step) in joints.iter().zip(self.steps.iter_mut()) {
            let rotation = match scene.rotate_joint(joint, *step) {
                Some(rotation) => rotation,
                None => continue,
            };
            for axis in Axis::ALL {
                if rotation.hit_limit(axis) {
                    step[axis.index()] = -step[axis.index()];
                }
            }
        }
    }
}
