use glam::DVec3;
use log::warn;

use vivarium_core::vector::{VecExt, DEFAULT_HEADING};
use vivarium_core::VivariumError;

mod bounding_sphere;

#[cfg(test)]
mod tests;

pub use bounding_sphere::BoundingSphere;

/// The box every body lives in, centered on the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tank {
    half_extents: DVec3,
}

impl Tank {
    pub fn new(half_extents: DVec3) -> Result<Tank, VivariumError> {
        for half in half_extents.to_array() {
            if !(half > 0.0) {
                return Err(VivariumError::NonPositiveTank(half));
            }
        }
        Ok(Tank { half_extents })
    }

    pub fn half_extents(&self) -> DVec3 {
        self.half_extents
    }

    pub fn contains(&self, position: DVec3) -> bool {
        position.abs().cmple(self.half_extents).all()
    }

    /// Per-axis bound on a sphere center of `radius` that keeps the sphere inside.
    pub fn interior(&self, radius: f64) -> DVec3 {
        (self.half_extents - DVec3::splat(radius)).max(DVec3::ZERO)
    }

    pub fn floor(&self, radius: f64) -> f64 {
        -self.interior(radius).y
    }

    pub fn ceiling(&self, radius: f64) -> f64 {
        self.interior(radius).y
    }
}

/// Turn every velocity component that would carry a sphere of `radius` out
/// of the tank's interior on this tick back towards the inside. A component
/// already pointing inwards is kept, so a body caught outside the interior
/// works its way back in.
pub fn reflect_off_walls(position: DVec3, velocity: DVec3, radius: f64, tank: &Tank) -> DVec3 {
    let limit = tank.interior(radius);
    let mut reflected = velocity;
    for axis in 0..3 {
        let next = position[axis] + velocity[axis];
        if next >= limit[axis] {
            reflected[axis] = -velocity[axis].abs();
        } else if next <= -limit[axis] {
            reflected[axis] = velocity[axis].abs();
        }
    }
    reflected
}

/// Rescale `velocity` to `speed`. A velocity too short to carry a direction
/// is replaced by `fallback` (and that by the default heading if needed).
pub fn renormalize(velocity: DVec3, speed: f64, fallback: DVec3) -> DVec3 {
    match velocity.normalize_checked() {
        Ok(direction) => direction * speed,
        Err(_) => {
            warn!("degenerate velocity {}, keeping heading {}", velocity, fallback);
            fallback.normalize_checked().unwrap_or(DEFAULT_HEADING) * speed
        }
    }
}

/// Reflect `velocity` about `separation` (from this body to the one it
/// touches) if it is still closing in. Coincident centers leave it unchanged.
pub fn bounce_off(velocity: DVec3, separation: DVec3) -> DVec3 {
    if velocity.dot(separation) <= 0.0 {
        return velocity;
    }
    velocity.reflect_about(separation).unwrap_or(velocity)
}
