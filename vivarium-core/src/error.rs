use glam::DVec3;
use thiserror::Error;

use crate::scenegraph::Axis;
use crate::BodyId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VivariumError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,
    #[error("rotation extent [{min}, {max}] on axis {axis:?} is inverted")]
    InvertedExtent { axis: Axis, min: f64, max: f64 },
    #[error("bounding radius {0} must be non-negative")]
    NegativeRadius(f64),
    #[error("tank half-extent {0} must be positive")]
    NonPositiveTank(f64),
    #[error("position {0} lies outside the tank")]
    OutsideTank(DVec3),
    #[error("body {0} is not a member of the vivarium")]
    UnknownBody(BodyId),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
