//! Small extensions over `glam::DVec3` for the steering math.
//!
//! glam already provides add/sub/scale/dot/cross/length; what it lacks is a
//! normalize that refuses zero-length input and a reflection about an
//! arbitrary (not necessarily unit) vector.

use glam::DVec3;

use crate::VivariumError;

/// Lengths below this are treated as zero.
pub const LENGTH_EPSILON: f64 = 1e-12;

/// Heading substituted when a body has no usable velocity.
pub const DEFAULT_HEADING: DVec3 = DVec3::Z;

pub trait VecExt: Sized {
    fn normalize_checked(self) -> Result<Self, VivariumError>;

    /// Mirror `self` about the plane whose normal is `normal`:
    /// `v - 2 (v . n) n` with `n` the normalized `normal`.
    fn reflect_about(self, normal: Self) -> Result<Self, VivariumError>;
}

impl VecExt for DVec3 {
    fn normalize_checked(self) -> Result<DVec3, VivariumError> {
        let length = self.length();
        if !length.is_finite() || length <= LENGTH_EPSILON {
            return Err(VivariumError::ZeroLengthVector);
        }
        Ok(self / length)
    }

    fn reflect_about(self, normal: DVec3) -> Result<DVec3, VivariumError> {
        let n = normal.normalize_checked()?;
        Ok(self - 2.0 * self.dot(n) * n)
    }
}
