//! Recipes for the articulated parts creatures are assembled from.
//!
//! Every builder instantiates a fixed tree under `placement.parent` and
//! returns its root together with the joints a gait is allowed to drive,
//! in the order the gait steps are listed. Offsets are multiples of
//! `placement.scale`, the nominal link length.

use glam::DVec3;

use vivarium_core::scenegraph::{
    Axis, Color, Entity, Joint, Primitive, RenderContext, SceneGraph, Selection, Shape, Transform,
};
use vivarium_core::VivariumError;

pub const EYE_COLOR: Color = glam::const_vec3!([1.0, 0.0, 0.0]);

/// Where and how big to build a linkage.
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    pub context: RenderContext,
    pub parent: Entity,
    pub position: DVec3,
    pub scale: f64,
    pub color: Color,
}

impl Placement {
    pub fn under(&self, parent: Entity, position: DVec3) -> Placement {
        Placement {
            parent,
            position,
            ..*self
        }
    }

    fn shape(&self, primitive: Primitive, color: Color) -> Shape {
        Shape::new(self.context, primitive, color)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Linkage {
    pub root: Entity,
    pub joints: Vec<Entity>,
}

impl Linkage {
    /// Flip `axis` on every animated joint, turning a right limb into a left one.
    pub fn mirror(&self, scene: &mut SceneGraph, axis: Axis) {
        for &joint in &self.joints {
            if let Some(joint) = scene.get_mut::<Joint>(joint) {
                joint.mirror(axis);
            }
        }
    }

    pub fn set_default_angle(&self, scene: &mut SceneGraph, axis: Axis, angle: f64) {
        if let Some(joint) = scene.get_mut::<Joint>(self.root) {
            *joint = joint.with_default_angle(axis, angle);
        }
    }

    pub fn limit_joints(
        &self,
        scene: &mut SceneGraph,
        axis: Axis,
        min: f64,
        max: f64,
    ) -> Result<(), VivariumError> {
        for &joint in &self.joints {
            if let Some(joint) = scene.get_mut::<Joint>(joint) {
                joint.set_rotate_extent(axis, min, max)?;
            }
        }
        Ok(())
    }

    pub fn reset_pose(&self, scene: &mut SceneGraph) {
        scene.reset_pose(self.root);
        for &joint in &self.joints {
            scene.reset_pose(joint);
        }
    }
}

fn part(
    scene: &mut SceneGraph,
    parent: Entity,
    offset: DVec3,
    joint: Joint,
    shape: Option<Shape>,
) -> Entity {
    let mut builder = scene.builder();
    builder.with(Transform::at(offset)).with(joint);
    if let Some(shape) = shape {
        builder.with(shape);
    }
    builder.attach(parent).build()
}

fn shade(color: Color, level: f32) -> Color {
    color * level
}

/// Four cubic links chained end to end along z. Every link is a joint.
pub fn tentacle(scene: &mut SceneGraph, placement: Placement) -> Result<Linkage, VivariumError> {
    let length = placement.scale;
    let root = part(scene, placement.parent, placement.position, Joint::default(), None);

    let mut joints = Vec::with_capacity(4);
    let mut parent = root;
    for (i, level) in [1.0, 0.85, 0.7, 0.55].into_iter().enumerate() {
        let offset = if i == 0 {
            DVec3::ZERO
        } else {
            DVec3::new(0.0, 0.0, length)
        };
        let link = Primitive::Cube {
            edge: 1.0,
            scale: DVec3::new(length / 4.0, length / 4.0, length),
        };
        let link = part(
            scene,
            parent,
            offset,
            Joint::default(),
            Some(placement.shape(link, shade(placement.color, level))),
        );
        joints.push(link);
        parent = link;
    }

    Ok(Linkage { root, joints })
}

/// Torso with a swiveling top half carrying the head and eyes.
/// Animated joints: top body, head.
pub fn body(scene: &mut SceneGraph, placement: Placement) -> Result<Linkage, VivariumError> {
    let l = placement.scale;
    let root = part(scene, placement.parent, placement.position, Joint::default(), None);

    let top_body = part(
        scene,
        root,
        DVec3::ZERO,
        Joint::default().limited(Axis::V, -90.0, 90.0)?,
        Some(placement.shape(
            Primitive::HalfRoundCylinder {
                radius: l,
                height: 0.5 * l,
            },
            placement.color,
        )),
    );
    let head = part(
        scene,
        top_body,
        DVec3::new(0.0, l, 0.6 * l),
        Joint::default()
            .limited(Axis::U, -65.0, 45.0)?
            .limited(Axis::V, -73.0, 73.0)?
            .limited(Axis::W, -20.0, 20.0)?,
        Some(placement.shape(
            Primitive::Sphere { radius: 0.8 * l },
            shade(placement.color, 0.85),
        )),
    );
    for side in [-1.0, 1.0] {
        part(
            scene,
            head,
            DVec3::new(side * 0.35 * l, 0.2 * l, 0.66 * l),
            Joint::default()
                .limited(Axis::U, -45.0, 45.0)?
                .limited(Axis::V, -45.0, 45.0)?,
            Some(placement.shape(Primitive::Sphere { radius: 0.1 * l }, EYE_COLOR)),
        );
    }
    part(
        scene,
        root,
        DVec3::ZERO,
        Joint::default(),
        Some(placement.shape(
            Primitive::Cylinder {
                radius: l,
                height: l,
            },
            shade(placement.color, 0.7),
        )),
    );

    Ok(Linkage {
        root,
        joints: vec![top_body, head],
    })
}

/// Humerus, shoulder block, upper arm, forearm and hand. The shoulder is a
/// chained structural node and is not animated.
/// Animated joints: humerus, forearm, hand.
pub fn arm(scene: &mut SceneGraph, placement: Placement) -> Result<Linkage, VivariumError> {
    let l = placement.scale;
    let root = part(
        scene,
        placement.parent,
        placement.position,
        Joint::default().with_default_angle(Axis::U, 90.0),
        None,
    );

    let humerus = part(
        scene,
        root,
        DVec3::ZERO,
        Joint::default()
            .with_default_angle(Axis::W, 90.0)
            .limited(Axis::U, -225.0, 45.0)?
            .limited(Axis::W, 90.0, 90.0)?,
        Some(placement.shape(
            Primitive::Cylinder {
                radius: 0.1 * l,
                height: 0.5 * l,
            },
            placement.color,
        )),
    );
    let block = Primitive::Cube {
        edge: 1.0,
        scale: DVec3::new(0.4 * l, 0.25 * l, 0.8 * l),
    };
    let shoulder = part(
        scene,
        humerus,
        DVec3::new(0.0, 0.0, -0.25 * l),
        Joint::default().limited(Axis::U, -20.0, 5.0)?,
        Some(placement.shape(block, shade(placement.color, 0.85))),
    );
    scene.insert(shoulder, Selection { chained: true });

    let upper_arm = part(
        scene,
        shoulder,
        DVec3::new(0.0, 0.0, 0.8 * l),
        Joint::default().with_default_angle(Axis::U, 90.0),
        Some(placement.shape(
            Primitive::HalfRoundCylinder {
                radius: 0.1 * l,
                height: 0.4 * l,
            },
            shade(placement.color, 0.7),
        )),
    );
    let forearm = part(
        scene,
        upper_arm,
        DVec3::new(0.0, 0.4 * l, 0.0),
        Joint::default()
            .limited(Axis::U, 0.0, 20.0)?
            .limited(Axis::V, -45.0, 45.0)?
            .limited(Axis::W, -110.0, 0.0)?,
        Some(placement.shape(
            Primitive::RoundCylinder {
                radius: 0.1 * l,
                height: 0.3 * l,
            },
            shade(placement.color, 0.55),
        )),
    );
    let hand = part(
        scene,
        forearm,
        DVec3::new(0.0, 0.3 * l, 0.0),
        Joint::default()
            .with_default_angle(Axis::U, -90.0)
            .limited(Axis::U, -120.0, -60.0)?
            .limited(Axis::V, -20.0, 20.0)?
            .limited(Axis::W, -90.0, 90.0)?,
        Some(placement.shape(block, shade(placement.color, 0.85))),
    );

    Ok(Linkage {
        root,
        joints: vec![humerus, forearm, hand],
    })
}

/// Thigh, shin and foot. The thigh swings the whole chained leg.
/// Animated joints: thigh.
pub fn leg(scene: &mut SceneGraph, placement: Placement) -> Result<Linkage, VivariumError> {
    let l = placement.scale;
    let root = part(
        scene,
        placement.parent,
        placement.position,
        Joint::default().with_default_angle(Axis::U, -90.0),
        None,
    );

    let thigh = part(
        scene,
        root,
        DVec3::ZERO,
        Joint::default()
            .with_default_angle(Axis::W, 90.0)
            .limited(Axis::U, -30.0, 30.0)?
            .limited(Axis::W, 90.0, 90.0)?,
        Some(placement.shape(
            Primitive::Cylinder {
                radius: 0.2 * l,
                height: 0.2 * l,
            },
            placement.color,
        )),
    );
    scene.insert(thigh, Selection { chained: true });

    let shin = part(
        scene,
        thigh,
        DVec3::new(0.0, -0.1 * l, -0.5 * l),
        Joint::default(),
        Some(placement.shape(
            Primitive::Cube {
                edge: 1.0,
                scale: DVec3::new(0.4 * l, 0.2 * l, 0.5 * l),
            },
            shade(placement.color, 0.85),
        )),
    );
    scene.insert(shin, Selection { chained: true });

    part(
        scene,
        shin,
        DVec3::new(0.0, 0.0, -0.1 * l),
        Joint::default(),
        Some(placement.shape(
            Primitive::Cube {
                edge: 1.0,
                scale: DVec3::new(1.6 * l, 0.7 * l, 0.1 * l),
            },
            shade(placement.color, 0.7),
        )),
    );

    Ok(Linkage {
        root,
        joints: vec![thigh],
    })
}
