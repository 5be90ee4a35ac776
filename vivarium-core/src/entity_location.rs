use glam::{DMat3, DQuat, DVec3};

use crate::vector::{VecExt, DEFAULT_HEADING};
use crate::VivariumError;

pub const WORLD_UP: DVec3 = DVec3::Y;

// EntityLocation is what a body's controller hands to its scene node each
// tick: where the root sits and which way it is facing
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EntityLocation {
    pub position: DVec3,
    pub unit_steer_direction: DVec3,   // should be a normalized vector
    pub unit_upward_direction: DVec3,  // orthogonal to the steer direction
}

impl EntityLocation {
    pub fn new(position: DVec3) -> EntityLocation {
        EntityLocation {
            position,
            unit_steer_direction: DEFAULT_HEADING,
            unit_upward_direction: WORLD_UP,
        }
    }

    /// Re-aim along `heading`. On a zero-length heading the location is left
    /// untouched and the error is returned.
    pub fn face(&mut self, heading: DVec3) -> Result<(), VivariumError> {
        let n = heading.normalize_checked()?;

        // lateral vector n x up; a vertical heading has no lateral direction
        // against world up, so fall back to the x axis as reference
        let v = n
            .cross(WORLD_UP)
            .normalize_checked()
            .or_else(|_| n.cross(DVec3::X).normalize_checked())?;
        let u = n.cross(v).normalize_checked()?;

        // n x (n x up) points down for a level heading
        self.unit_steer_direction = n;
        self.unit_upward_direction = -u;
        Ok(())
    }

    /// Rotation basis that carries local +Z onto the heading and local +Y onto
    /// the corrected up vector.
    pub fn frame(&self) -> DMat3 {
        let forward = self.unit_steer_direction;
        let up = self.unit_upward_direction;
        DMat3::from_cols(up.cross(forward), up, forward)
    }

    pub fn orientation(&self) -> DQuat {
        DQuat::from_mat3(&self.frame())
    }
}
