use glam::DVec3;

use vivarium_core::VivariumError;

/// Collision volume of a body. `center` is an offset from the body's
/// position until `placed` turns it into a world-space sphere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: DVec3, radius: f64) -> Result<BoundingSphere, VivariumError> {
        if !(radius >= 0.0) {
            return Err(VivariumError::NegativeRadius(radius));
        }
        Ok(BoundingSphere { center, radius })
    }

    pub fn placed(&self, position: DVec3) -> BoundingSphere {
        BoundingSphere {
            center: position + self.center,
            radius: self.radius,
        }
    }

    // touching spheres count as colliding
    pub fn is_colliding(&self, other: &BoundingSphere) -> bool {
        self.center.distance(other.center) <= self.radius + other.radius
    }
}
