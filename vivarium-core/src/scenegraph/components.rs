use glam::{DMat4, DQuat, DVec3};

use crate::entity_location::EntityLocation;
use crate::scenegraph::*;
use crate::VivariumError;

// ---------- Components ---------- //

#[derive(Clone, Copy, Debug)]
pub struct SceneNode {
    pub first: Entity,
    pub last: Entity,
    pub next: Entity,
    pub prev: Entity,
    pub parent: Entity,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            first: NULL_ENTITY,
            last: NULL_ENTITY,
            next: NULL_ENTITY,
            prev: NULL_ENTITY,
            parent: NULL_ENTITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl Transform {
    pub fn at(translation: DVec3) -> Transform {
        Transform {
            translation,
            rotation: DQuat::IDENTITY,
        }
    }

    pub fn from_entity_location(entity_location: &EntityLocation) -> Transform {
        Transform {
            translation: entity_location.position,
            rotation: entity_location.orientation(),
        }
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(DVec3::ZERO)
    }
}

/// Marks a node whose subtree is highlighted as one unit when selected.
#[derive(Default, Clone, Copy, Debug)]
pub struct Selection {
    pub chained: bool,
}

// ---------- Joints ---------- //

/// The three joint axes, applied in u (x), v (y), w (z) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    U,
    V,
    W,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::U, Axis::V, Axis::W];

    pub fn index(self) -> usize {
        match self {
            Axis::U => 0,
            Axis::V => 1,
            Axis::W => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

/// Result of a `Joint::rotate` call: the new angles and, per axis, whether
/// the delta ran into that axis's extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointRotation {
    pub angles: DVec3,
    pub clamped: [bool; 3],
}

impl JointRotation {
    pub fn hit_limit(&self, axis: Axis) -> bool {
        self.clamped[axis.index()]
    }
}

/// Joint angles in degrees. `axis_sign` flips the direction an axis turns
/// in, which is how mirrored limbs share one recipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joint {
    pub angles: DVec3,
    pub default_angles: DVec3,
    pub axis_sign: DVec3,
    extents: [Option<Extent>; 3],
}

impl Default for Joint {
    fn default() -> Self {
        Self {
            angles: DVec3::ZERO,
            default_angles: DVec3::ZERO,
            axis_sign: DVec3::ONE,
            extents: [None; 3],
        }
    }
}

impl Joint {
    pub fn with_default_angle(mut self, axis: Axis, angle: f64) -> Self {
        self.default_angles[axis.index()] = angle;
        self.angles[axis.index()] = angle;
        self
    }

    pub fn limited(mut self, axis: Axis, min: f64, max: f64) -> Result<Self, VivariumError> {
        self.set_rotate_extent(axis, min, max)?;
        Ok(self)
    }

    pub fn set_rotate_extent(&mut self, axis: Axis, min: f64, max: f64) -> Result<(), VivariumError> {
        if !(min <= max) {
            return Err(VivariumError::InvertedExtent { axis, min, max });
        }
        self.extents[axis.index()] = Some(Extent { min, max });
        Ok(())
    }

    pub fn extent(&self, axis: Axis) -> Option<Extent> {
        self.extents[axis.index()]
    }

    pub fn angle(&self, axis: Axis) -> f64 {
        self.angles[axis.index()]
    }

    pub fn rotate(&mut self, delta: DVec3) -> JointRotation {
        let mut clamped = [false; 3];
        for axis in Axis::ALL {
            let i = axis.index();
            let target = self.angles[i] + delta[i];
            self.angles[i] = match self.extents[i] {
                Some(Extent { min, max }) => {
                    let angle = target.clamp(min, max);
                    clamped[i] = (delta[i] > 0.0 && angle >= max) || (delta[i] < 0.0 && angle <= min);
                    angle
                }
                None => target,
            };
        }

        JointRotation {
            angles: self.angles,
            clamped,
        }
    }

    pub fn reset(&mut self) {
        self.angles = self.default_angles;
    }

    pub fn mirror(&mut self, axis: Axis) {
        self.axis_sign[axis.index()] *= -1.0;
    }

    pub fn rotation_matrix(&self) -> DMat4 {
        let signed = self.angles * self.axis_sign;
        DMat4::from_rotation_x(signed.x.to_radians())
            * DMat4::from_rotation_y(signed.y.to_radians())
            * DMat4::from_rotation_z(signed.z.to_radians())
    }
}
